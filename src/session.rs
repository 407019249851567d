use chrono::{DateTime, Local};

/// Parameters a play-through is started with.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Exact difficulty to play, or "all".
    pub difficulty: String,
    /// Exact category to play, or "all".
    pub category: String,
    /// Upper bound on answered + skipped questions in one session.
    pub questions_per_game: usize,
    /// Per-question countdown; None disables the timer.
    pub seconds_per_question: Option<f64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: "all".to_string(),
            category: "all".to_string(),
            questions_per_game: 10,
            seconds_per_question: Some(15.0),
        }
    }
}

/// End-of-session snapshot handed to the presentation layer and the
/// persistence stores.
#[derive(Debug, Clone)]
pub struct GameStats {
    pub score: u32,
    pub correct: usize,
    pub incorrect: usize,
    pub skipped: usize,
    /// correct / (correct + incorrect) * 100, zero before any answer.
    pub accuracy: f64,
    pub avg_time_secs: f64,
    /// Standard deviation of the per-question elapsed times.
    pub consistency: f64,
    pub hints_used: usize,
    pub best_streak: usize,
    pub difficulty: String,
    pub category: String,
    /// Batch length so far; only final once the session completes.
    pub total_questions: usize,
    pub finished_at: DateTime<Local>,
    pub categories_played: Vec<String>,
    pub difficulties_completed: Vec<String>,
}

impl GameStats {
    /// Questions the player actually faced this session.
    pub fn questions_faced(&self) -> usize {
        self.correct + self.incorrect + self.skipped
    }
}
