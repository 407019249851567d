use crate::session::GameStats;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Aggregate statistics for one player across all their games.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayerStats {
    pub total_score: u64,
    pub games_played: u32,
    pub highest_score: u32,
    pub average_score: f64,
    pub questions_answered: u64,
    pub correct_answers: u64,
    #[serde(default)]
    pub last_played: String,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub categories_played: Vec<String>,
    #[serde(default)]
    pub difficulties_completed: Vec<String>,
}

impl PlayerStats {
    /// Numeric value of a leaderboard metric, None for unknown keys.
    fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "total_score" => Some(self.total_score as f64),
            "games_played" => Some(self.games_played as f64),
            "highest_score" => Some(self.highest_score as f64),
            "average_score" => Some(self.average_score),
            "questions_answered" => Some(self.questions_answered as f64),
            "correct_answers" => Some(self.correct_answers as f64),
            _ => None,
        }
    }
}

/// Whole-document JSON store of per-player statistics, keyed by name.
/// Reloaded lazily and rewritten in full on every update.
#[derive(Debug)]
pub struct PlayerStatsStore {
    path: PathBuf,
    players: HashMap<String, PlayerStats>,
}

impl PlayerStatsStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::players_path().unwrap_or_else(|| PathBuf::from("players.json"));
        Self::with_path(path)
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        let mut store = Self {
            path: p.as_ref().to_path_buf(),
            players: HashMap::new(),
        };
        store.load();
        store
    }

    /// Read the whole document. Missing or corrupt files yield an empty
    /// store.
    pub fn load(&mut self) {
        self.players.clear();
        let Ok(bytes) = fs::read(&self.path) else {
            return;
        };
        match serde_json::from_slice(&bytes) {
            Ok(players) => self.players = players,
            Err(e) => eprintln!("Error loading player stats: {e}"),
        }
    }

    fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&self.players).unwrap_or_default();
        fs::write(&self.path, data)
    }

    /// Fold one finished game into a player's record, creating it if this
    /// is the first game under that name, and persist immediately.
    pub fn update(&mut self, name: &str, score: u32, stats: Option<&GameStats>) {
        let record = self.players.entry(name.to_string()).or_default();

        record.games_played += 1;
        record.total_score += score as u64;
        record.highest_score = record.highest_score.max(score);
        record.average_score = record.total_score as f64 / record.games_played as f64;
        record.last_played = Local::now().format(DATE_FORMAT).to_string();

        if let Some(stats) = stats {
            record.questions_answered += stats.questions_faced() as u64;
            record.correct_answers += stats.correct as u64;
            for c in &stats.categories_played {
                if !record.categories_played.contains(c) {
                    record.categories_played.push(c.clone());
                }
            }
            for d in &stats.difficulties_completed {
                if !record.difficulties_completed.contains(d) {
                    record.difficulties_completed.push(d.clone());
                }
            }
        }

        let earned = earned_achievements(record, score, stats);
        for a in earned {
            if !record.achievements.contains(&a) {
                record.achievements.push(a);
            }
        }

        if let Err(e) = self.save() {
            eprintln!("Error saving player stats: {e}");
        }
    }

    pub fn get_player_stats(&self, name: &str) -> Option<&PlayerStats> {
        self.players.get(name)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Players ranked descending by the named metric. Players whose
    /// record lacks the metric are skipped silently.
    pub fn leaderboard(&self, metric: &str, limit: usize) -> Vec<(String, f64)> {
        let mut ranked: Vec<(String, f64)> = self
            .players
            .iter()
            .filter_map(|(name, stats)| stats.metric(metric).map(|v| (name.clone(), v)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(limit);
        ranked
    }
}

fn earned_achievements(record: &PlayerStats, score: u32, stats: Option<&GameStats>) -> Vec<String> {
    let mut earned = Vec::new();
    if record.games_played >= 1 {
        earned.push("first_game".to_string());
    }
    if record.games_played >= 10 {
        earned.push("veteran".to_string());
    }
    if score >= 100 {
        earned.push("century".to_string());
    }
    if let Some(stats) = stats {
        if stats.correct > 0 && stats.incorrect == 0 && stats.skipped == 0 {
            earned.push("perfect_game".to_string());
        }
        if stats.best_streak >= 5 {
            earned.push("hot_streak".to_string());
        }
    }
    if record.categories_played.len() >= 3 {
        earned.push("explorer".to_string());
    }
    earned
}
