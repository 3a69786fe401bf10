use std::time::SystemTime;

use crate::time_series::TimeSeriesPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum SessionStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// Mutable state of one attempt at a passage
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub reference: Vec<char>,
    pub input: Vec<char>,
    pub started_at: Option<SystemTime>,
    pub status: SessionStatus,
    pub current_word_index: usize,
    pub wpm_history: Vec<TimeSeriesPoint>,
}

impl Session {
    pub fn new(reference: &str) -> Self {
        Self {
            reference: reference.chars().collect(),
            input: Vec::new(),
            started_at: None,
            status: SessionStatus::NotStarted,
            current_word_index: 0,
            wpm_history: Vec::new(),
        }
    }

    pub fn reference_text(&self) -> String {
        self.reference.iter().collect()
    }
}

/// Index of the word the cursor is in.
///
/// The reference is split on single spaces. The current word is the first one
/// whose end offset reaches the input length, so a word stays current until its
/// trailing space has been typed. Input covering every word yields the last word.
pub fn word_index_at(reference: &[char], input_len: usize) -> usize {
    let mut offset = 0;
    let mut word_count = 0;

    for (idx, word) in reference.split(|c| *c == ' ').enumerate() {
        if offset + word.len() >= input_len {
            return idx;
        }
        offset += word.len() + 1;
        word_count = idx + 1;
    }

    word_count.saturating_sub(1)
}
