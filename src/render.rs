//! Read-only views over a session used by the front end.
//!
//! Nothing here mutates engine state; every function is a pure projection of
//! the typed input onto the reference text.

use std::ops::Range;

/// Display state of a single reference character
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharState {
    Untyped,
    Correct,
    Incorrect,
    Cursor,
}

/// Classify the reference character at `position`.
///
/// Mismatches are only reported as `Incorrect` when `show_errors` is set;
/// otherwise they render like untyped text.
pub fn classify(position: usize, input: &[char], reference: &[char], show_errors: bool) -> CharState {
    if position < input.len() {
        if reference.get(position) == Some(&input[position]) {
            CharState::Correct
        } else if show_errors {
            CharState::Incorrect
        } else {
            CharState::Untyped
        }
    } else if position == input.len() {
        CharState::Cursor
    } else {
        CharState::Untyped
    }
}

pub fn classify_all(input: &[char], reference: &[char], show_errors: bool) -> Vec<CharState> {
    (0..reference.len())
        .map(|pos| classify(pos, input, reference, show_errors))
        .collect()
}

/// A word of the reference with its position relative to the input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WordView {
    pub index: usize,
    /// character range of the word inside the reference
    pub span: Range<usize>,
    pub is_current: bool,
    pub is_completed: bool,
}

pub fn word_views(reference: &[char], input_len: usize, current_word: usize) -> Vec<WordView> {
    let mut start = 0;
    reference
        .split(|c| *c == ' ')
        .enumerate()
        .map(|(index, word)| {
            let span = start..start + word.len();
            start = span.end + 1;
            WordView {
                index,
                is_current: index == current_word,
                is_completed: span.end <= input_len,
                span,
            }
        })
        .collect()
}

/// Share of the reference covered by the input, rounded to a whole percent
pub fn progress_percent(input_len: usize, reference_len: usize) -> u32 {
    if reference_len == 0 {
        return 0;
    }
    ((input_len as f64 / reference_len as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn classify_positions() {
        let reference = chars("cat");
        let input = chars("cx");

        assert_eq!(classify(0, &input, &reference, true), CharState::Correct);
        assert_eq!(classify(1, &input, &reference, true), CharState::Incorrect);
        assert_eq!(classify(2, &input, &reference, true), CharState::Cursor);
        assert_eq!(classify(5, &input, &reference, true), CharState::Untyped);
    }

    #[test]
    fn hidden_errors_render_untyped() {
        let reference = chars("cat");
        let input = chars("cx");
        assert_eq!(classify(1, &input, &reference, false), CharState::Untyped);
        assert_eq!(classify(0, &input, &reference, false), CharState::Correct);
    }

    #[test]
    fn classify_all_on_empty_input() {
        let states = classify_all(&[], &chars("ab"), true);
        assert_eq!(states, vec![CharState::Cursor, CharState::Untyped]);
    }

    #[test]
    fn classify_all_when_fully_typed_has_no_cursor() {
        let states = classify_all(&chars("ab"), &chars("ab"), true);
        assert_eq!(states, vec![CharState::Correct, CharState::Correct]);
    }

    #[test]
    fn word_views_mark_current_and_completed() {
        let views = word_views(&chars("the cat sat"), 5, 1);

        assert_eq!(views.len(), 3);
        assert_eq!(views[0].span, 0..3);
        assert!(views[0].is_completed);
        assert!(!views[0].is_current);
        assert_eq!(views[1].span, 4..7);
        assert!(views[1].is_current);
        assert!(!views[1].is_completed);
        assert_eq!(views[2].span, 8..11);
    }

    #[test]
    fn progress_rounds() {
        assert_eq!(progress_percent(0, 11), 0);
        assert_eq!(progress_percent(5, 11), 45);
        assert_eq!(progress_percent(11, 11), 100);
        assert_eq!(progress_percent(0, 0), 0);
    }
}
