use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::clock::time_diff_ms;

/// Live statistics for one attempt, recomputed on every update
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub wpm: u32,
    pub accuracy: u32,
    pub elapsed_seconds: f64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub total_chars: usize,
}

/// Count positions where the typed character matches the reference
pub fn count_correct(input: &[char], reference: &[char]) -> usize {
    input
        .iter()
        .zip(reference.iter())
        .filter(|(typed, expected)| typed == expected)
        .count()
}

/// Number of non-empty whitespace separated tokens in the input
pub fn words_typed(input: &[char]) -> usize {
    let text: String = input.iter().collect();
    text.split_whitespace().count()
}

/// Rounded percentage of correct characters, 0 for empty input
pub fn accuracy(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}

/// Rounded words per minute; 0 when no time has elapsed or the ratio is not finite
pub fn wpm(words: usize, elapsed_minutes: f64) -> u32 {
    if elapsed_minutes <= 0.0 {
        return 0;
    }
    let rate = words as f64 / elapsed_minutes;
    if rate.is_finite() {
        rate.round() as u32
    } else {
        0
    }
}

/// Derive a snapshot from the session state and the current instant.
///
/// Without a start time nothing has been measured yet, so every field is zero.
pub fn compute(
    input: &[char],
    reference: &[char],
    started_at: Option<SystemTime>,
    now: SystemTime,
) -> StatsSnapshot {
    let Some(started_at) = started_at else {
        return StatsSnapshot::default();
    };

    let elapsed_minutes = time_diff_ms(started_at, now) as f64 / 60_000.0;
    let correct_chars = count_correct(input, reference);
    let total_chars = input.len();

    StatsSnapshot {
        wpm: wpm(words_typed(input), elapsed_minutes),
        accuracy: accuracy(correct_chars, total_chars),
        elapsed_seconds: elapsed_minutes * 60.0,
        correct_chars,
        incorrect_chars: total_chars - correct_chars,
        total_chars,
    }
}
