// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod celebration;
pub mod config;
pub mod players;
pub mod question;
pub mod quiz;
pub mod runtime;
pub mod scores;
pub mod session;
pub mod time_series;
pub mod util;
