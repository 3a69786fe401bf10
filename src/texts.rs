use include_dir::{include_dir, Dir};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

static TEXTS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/texts");

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Resolve an identifier such as `"easy"`; anything unknown falls back to medium
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    pub fn level(self) -> DifficultyLevel {
        match self {
            Difficulty::Easy => DifficultyLevel {
                difficulty: self,
                name: "Easy",
                description: "Short sentences with common words",
                time_limit_secs: 60,
            },
            Difficulty::Medium => DifficultyLevel {
                difficulty: self,
                name: "Medium",
                description: "Paragraphs with moderate complexity",
                time_limit_secs: 90,
            },
            Difficulty::Hard => DifficultyLevel {
                difficulty: self,
                name: "Hard",
                description: "Long passages with complex vocabulary",
                time_limit_secs: 120,
            },
        }
    }

    pub fn time_limit_secs(self) -> u32 {
        self.level().time_limit_secs
    }

    pub fn next(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyLevel {
    pub difficulty: Difficulty,
    pub name: &'static str,
    pub description: &'static str,
    pub time_limit_secs: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("passage file {0} is not embedded")]
    Missing(String),
    #[error("passage file {file} is not valid utf-8")]
    Encoding { file: String },
    #[error("unable to parse passage file {file}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no passages for difficulty {0}")]
    Empty(Difficulty),
}

#[derive(Deserialize, Clone, Debug)]
struct PassageFile {
    difficulty: Difficulty,
    passages: Vec<String>,
}

/// All passages, grouped by difficulty
#[derive(Debug, Clone)]
pub struct PassageBank {
    passages: HashMap<Difficulty, Vec<String>>,
}

impl PassageBank {
    /// Load the passages compiled into the binary
    pub fn embedded() -> Result<Self, TextError> {
        let mut passages = HashMap::new();
        for difficulty in Difficulty::ALL {
            let file = read_passage_file(&format!("{difficulty}.json"))?;
            if file.passages.is_empty() {
                return Err(TextError::Empty(difficulty));
            }
            passages.insert(file.difficulty, file.passages);
        }
        Ok(Self { passages })
    }

    pub fn from_passages(passages: HashMap<Difficulty, Vec<String>>) -> Result<Self, TextError> {
        for difficulty in Difficulty::ALL {
            if !passages.get(&difficulty).is_some_and(|p| !p.is_empty()) {
                return Err(TextError::Empty(difficulty));
            }
        }
        Ok(Self { passages })
    }

    pub fn passages(&self, difficulty: Difficulty) -> &[String] {
        self.passages
            .get(&difficulty)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Deterministic pick so every participant sharing `seed` gets the same passage
    pub fn seeded_text(&self, difficulty: Difficulty, seed: &str) -> &str {
        let passages = self.passages(difficulty);
        let hash = seed
            .encode_utf16()
            .fold(0i32, |hash, unit| {
                hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32)
            });
        &passages[hash.unsigned_abs() as usize % passages.len()]
    }
}

fn read_passage_file(file_name: &str) -> Result<PassageFile, TextError> {
    let file = TEXTS_DIR
        .get_file(file_name)
        .ok_or_else(|| TextError::Missing(file_name.to_string()))?;

    let contents = file.contents_utf8().ok_or_else(|| TextError::Encoding {
        file: file_name.to_string(),
    })?;

    serde_json::from_str(contents).map_err(|source| TextError::Parse {
        file: file_name.to_string(),
        source,
    })
}

/// Hands out passages without repeating one until every passage of that
/// difficulty has been used, then starts a new cycle
#[derive(Debug)]
pub struct TextProvider<R: Rng = StdRng> {
    bank: PassageBank,
    used: HashMap<Difficulty, HashSet<usize>>,
    rng: R,
}

impl TextProvider<StdRng> {
    pub fn new(bank: PassageBank) -> Self {
        Self::with_rng(bank, StdRng::from_entropy())
    }
}

impl<R: Rng> TextProvider<R> {
    pub fn with_rng(bank: PassageBank, rng: R) -> Self {
        Self {
            bank,
            used: HashMap::new(),
            rng,
        }
    }

    pub fn bank(&self) -> &PassageBank {
        &self.bank
    }

    pub fn next_text(&mut self, difficulty: Difficulty) -> String {
        let passages = self.bank.passages(difficulty);
        let used = self.used.entry(difficulty).or_default();

        if used.len() >= passages.len() {
            tracing::debug!(%difficulty, "all passages used, starting a new cycle");
            used.clear();
        }

        let available: Vec<usize> = (0..passages.len()).filter(|i| !used.contains(i)).collect();
        // the bank guarantees at least one passage per difficulty
        let idx = *available.choose(&mut self.rng).unwrap_or(&0);
        used.insert(idx);

        passages[idx].clone()
    }
}
