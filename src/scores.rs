use crate::app_dirs::AppDirs;
use crate::players::PlayerStatsStore;
use crate::session::GameStats;
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Entries that count towards the high-score threshold.
pub const HIGH_SCORE_WINDOW: usize = 5;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One line of the score ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
    pub date: String,
    pub category: String,
    pub difficulty: String,
}

/// Ranked score history persisted as headerless comma-delimited text.
/// The whole file is rewritten on every save; duplicates by name are
/// history, not best-per-player.
#[derive(Debug)]
pub struct HighScores {
    path: PathBuf,
    pub entries: Vec<ScoreEntry>,
    players: PlayerStatsStore,
}

impl HighScores {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::scores_path().unwrap_or_else(|| PathBuf::from("high_scores.csv"));
        let players = PlayerStatsStore::new();
        Self::with_store(path, players)
    }

    /// Test seam: back both stores with explicit paths.
    pub fn with_paths<P: AsRef<Path>, Q: AsRef<Path>>(scores: P, players: Q) -> Self {
        Self::with_store(
            scores.as_ref().to_path_buf(),
            PlayerStatsStore::with_path(players),
        )
    }

    fn with_store(path: PathBuf, players: PlayerStatsStore) -> Self {
        let mut ledger = Self {
            path,
            entries: Vec::new(),
            players,
        };
        ledger.load();
        ledger
    }

    /// Reload the ledger from disk. A missing file is an empty ledger;
    /// lines with an unparseable score are skipped.
    pub fn load(&mut self) {
        self.entries.clear();

        if !self.path.exists() {
            return;
        }

        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path);
        let mut reader = match reader {
            Ok(r) => r,
            Err(e) => {
                eprintln!("Error loading high scores: {e}");
                return;
            }
        };

        for record in reader.records() {
            let Ok(record) = record else { continue };
            let entry = match record.len() {
                // Legacy form: name,score
                2 => record[1].trim().parse::<u32>().ok().map(|score| ScoreEntry {
                    name: record[0].to_string(),
                    score,
                    date: "Unknown".to_string(),
                    category: "all".to_string(),
                    difficulty: "all".to_string(),
                }),
                // Extended form: name,score,date,category,difficulty
                n if n >= 5 => record[1].trim().parse::<u32>().ok().map(|score| ScoreEntry {
                    name: record[0].to_string(),
                    score,
                    date: record[2].to_string(),
                    category: record[3].to_string(),
                    difficulty: record[4].to_string(),
                }),
                _ => None,
            };
            if let Some(entry) = entry {
                self.entries.push(entry);
            }
        }

        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
    }

    /// Record a finished game: append to the ledger, rewrite the file in
    /// the extended form, and fold the result into the player statistics
    /// store.
    pub fn save_score(&mut self, name: &str, score: u32, stats: Option<&GameStats>) {
        let name = if name.is_empty() { "Anonymous" } else { name };
        let (category, difficulty) = match stats {
            Some(s) => (s.category.clone(), s.difficulty.clone()),
            None => ("all".to_string(), "all".to_string()),
        };

        self.entries.push(ScoreEntry {
            name: name.to_string(),
            score,
            date: Local::now().format(DATE_FORMAT).to_string(),
            category,
            difficulty,
        });
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));

        if let Err(e) = self.write_all() {
            eprintln!("Error saving high scores: {e}");
        }

        self.players.update(name, score, stats);
    }

    fn write_all(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;
        for e in &self.entries {
            writer.write_record([
                e.name.as_str(),
                &e.score.to_string(),
                &e.date,
                &e.category,
                &e.difficulty,
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Top entries by score, optionally restricted to an exact category
    /// and/or difficulty.
    pub fn top_scores(
        &self,
        limit: usize,
        category: Option<&str>,
        difficulty: Option<&str>,
    ) -> Vec<ScoreEntry> {
        self.entries
            .iter()
            .filter(|e| category.map_or(true, |c| e.category == c))
            .filter(|e| difficulty.map_or(true, |d| e.difficulty == d))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Whether a score would enter the qualifying top five.
    pub fn is_high_score(
        &self,
        score: u32,
        category: Option<&str>,
        difficulty: Option<&str>,
    ) -> bool {
        let top = self.top_scores(HIGH_SCORE_WINDOW, category, difficulty);
        if top.len() < HIGH_SCORE_WINDOW {
            return true;
        }
        score > top.last().map(|e| e.score).unwrap_or(0)
    }

    pub fn players(&self) -> &PlayerStatsStore {
        &self.players
    }
}
