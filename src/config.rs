use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub player_name: String,
    pub questions_per_game: usize,
    pub difficulty: String,
    pub category: String,
    pub seconds_per_question: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_name: String::new(),
            questions_per_game: 10,
            difficulty: "all".to_string(),
            category: "all".to_string(),
            seconds_per_question: Some(15),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "qwiz") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("qwiz_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            player_name: "Ada".into(),
            questions_per_game: 20,
            difficulty: "hard".into(),
            category: "Science".into(),
            seconds_per_question: None,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_file_yields_default() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.load(), Config::default());
    }
}
