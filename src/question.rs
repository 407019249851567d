use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

static BANK_DIR: Dir = include_dir!("src/bank");

const DEFAULT_BANK: &str = "general.json";

fn default_difficulty() -> String {
    "easy".to_string()
}

fn default_category() -> String {
    "Uncategorized".to_string()
}

/// A single multiple-choice question as loaded from a question bank.
///
/// `started_at`/`answered_at`/`points_awarded` are per-play state and never
/// come from the bank file.
#[derive(Deserialize, Clone, Debug)]
pub struct Question {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "question")]
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(skip)]
    pub started_at: Option<SystemTime>,
    #[serde(skip)]
    pub answered_at: Option<SystemTime>,
    #[serde(skip)]
    pub points_awarded: u32,
}

impl Question {
    /// Hint text, falling back to the placeholder for questions the
    /// normalization pass has not touched.
    pub fn hint_text(&self) -> String {
        self.hint
            .clone()
            .unwrap_or_else(|| synthesize_hint(&self.correct_answer))
    }
}

fn synthesize_hint(answer: &str) -> String {
    let len = answer.chars().count();
    match answer.chars().next() {
        Some(first) if len > 3 => {
            format!("Starts with '{first}' and has {len} letters")
        }
        _ => "No hint available".to_string(),
    }
}

#[derive(Deserialize, Debug, Default)]
struct BankFile {
    #[serde(default)]
    questions: Vec<Question>,
}

/// The full set of loaded questions, before any session filtering.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    pub questions: Vec<Question>,
}

impl QuestionBank {
    /// Load the question bank embedded in the binary.
    pub fn bundled() -> Self {
        match BANK_DIR
            .get_file(DEFAULT_BANK)
            .and_then(|f| f.contents_utf8())
        {
            Some(raw) => Self::from_json(raw).unwrap_or_else(|e| {
                eprintln!("Error loading bundled questions: {e}");
                Self::default()
            }),
            None => {
                eprintln!("Bundled question bank missing");
                Self::default()
            }
        }
    }

    /// Load a question bank from a file on disk. A missing or malformed
    /// file yields an empty bank with a diagnostic, never a hard failure.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(raw) => Self::from_json(&raw).unwrap_or_else(|e| {
                eprintln!("Error loading questions from {}: {e}", path.display());
                Self::default()
            }),
            Err(e) => {
                eprintln!("Error loading questions from {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let parsed: BankFile = serde_json::from_str(raw)?;
        let mut bank = Self {
            questions: parsed.questions,
        };
        bank.normalize();
        Ok(bank)
    }

    /// Assign stable `q<index>` identifiers and synthesize hints for
    /// records that lack them.
    fn normalize(&mut self) {
        for (idx, q) in self.questions.iter_mut().enumerate() {
            if q.id.is_none() {
                q.id = Some(format!("q{idx}"));
            }
            if q.hint.is_none() {
                q.hint = Some(synthesize_hint(&q.correct_answer));
            }
        }
    }

    /// Sorted, deduplicated categories across the whole bank.
    pub fn available_categories(&self) -> Vec<String> {
        self.questions
            .iter()
            .map(|q| q.category.clone())
            .sorted()
            .dedup()
            .collect()
    }

    /// Sorted, deduplicated difficulties across the whole bank.
    pub fn available_difficulties(&self) -> Vec<String> {
        self.questions
            .iter()
            .map(|q| q.difficulty.clone())
            .sorted()
            .dedup()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
