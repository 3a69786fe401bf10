use std::fmt;
use std::time::SystemTime;

use crate::clock::{Clock, SystemClock};
use crate::feedback::{Cue, FeedbackSink, NullSink};
use crate::render::{classify_all, CharState};
use crate::session::{word_index_at, Session, SessionStatus};
use crate::stats::{compute, StatsSnapshot};
use crate::time_series::TimeSeriesPoint;

/// Result of an accepted input change
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputUpdate {
    /// set on the input that started the session; the caller starts its countdown
    pub timer_started: bool,
    pub snapshot: StatsSnapshot,
    /// final snapshot, present only on the update that completed the session
    pub completion: Option<StatsSnapshot>,
}

/// Evaluates one typing attempt against a reference text
pub struct TypingEngine {
    session: Session,
    clock: Box<dyn Clock>,
    sink: Box<dyn FeedbackSink>,
}

impl fmt::Debug for TypingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypingEngine")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl TypingEngine {
    pub fn new(reference: &str) -> Self {
        Self {
            session: Session::new(reference),
            clock: Box::new(SystemClock),
            sink: Box::new(NullSink),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_sink(mut self, sink: impl FeedbackSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn reference(&self) -> &[char] {
        &self.session.reference
    }

    pub fn input(&self) -> &[char] {
        &self.session.input
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.session.started_at
    }

    pub fn current_word_index(&self) -> usize {
        self.session.current_word_index
    }

    pub fn wpm_history(&self) -> &[TimeSeriesPoint] {
        &self.session.wpm_history
    }

    pub fn has_started(&self) -> bool {
        self.session.status != SessionStatus::NotStarted
    }

    pub fn is_complete(&self) -> bool {
        self.session.status == SessionStatus::Completed
    }

    /// Statistics as of now, without touching session state
    pub fn snapshot(&self) -> StatsSnapshot {
        compute(
            &self.session.input,
            &self.session.reference,
            self.session.started_at,
            self.clock.now(),
        )
    }

    /// Per-character display states for the current input
    pub fn char_states(&self, show_errors: bool) -> Vec<CharState> {
        classify_all(&self.session.input, &self.session.reference, show_errors)
    }

    /// Apply the full current input.
    ///
    /// Returns `None` when the input is longer than the reference or the session
    /// is already complete; session state is left untouched in both cases.
    pub fn on_input(&mut self, new_input: &str) -> Option<InputUpdate> {
        let typed: Vec<char> = new_input.chars().collect();

        if typed.len() > self.session.reference.len() {
            tracing::debug!(
                len = typed.len(),
                max = self.session.reference.len(),
                "ignoring input longer than reference"
            );
            return None;
        }
        if self.session.status == SessionStatus::Completed {
            return None;
        }

        let now = self.clock.now();
        let mut timer_started = false;

        if self.session.status == SessionStatus::NotStarted && !typed.is_empty() {
            self.session.started_at = Some(now);
            self.session.status = SessionStatus::InProgress;
            timer_started = true;
            tracing::info!(chars = self.session.reference.len(), "typing session started");
        }

        if typed.len() > self.session.input.len() {
            let pos = typed.len() - 1;
            let cue = if typed[pos] == self.session.reference[pos] {
                Cue::Keypress
            } else {
                Cue::Error
            };
            self.sink.notify(cue);
        }

        self.session.input = typed;
        self.session.current_word_index =
            word_index_at(&self.session.reference, self.session.input.len());

        let snapshot = compute(
            &self.session.input,
            &self.session.reference,
            self.session.started_at,
            now,
        );

        let completion = if self.session.status == SessionStatus::InProgress
            && self.session.input.len() == self.session.reference.len()
        {
            self.session.status = SessionStatus::Completed;
            self.sink.notify(Cue::Success);
            tracing::info!(
                wpm = snapshot.wpm,
                accuracy = snapshot.accuracy,
                "typing session completed"
            );
            Some(snapshot)
        } else {
            None
        };

        Some(InputUpdate {
            timer_started,
            snapshot,
            completion,
        })
    }

    /// Periodic recomputation; only does anything while the session is in progress
    pub fn tick(&mut self) -> Option<StatsSnapshot> {
        if self.session.status != SessionStatus::InProgress {
            return None;
        }

        let snapshot = self.snapshot();
        self.session
            .wpm_history
            .push(TimeSeriesPoint::new(snapshot.elapsed_seconds, snapshot.wpm as f64));
        Some(snapshot)
    }

    /// Time-limit expiry: finish with whatever input has accumulated
    pub fn force_complete(&mut self) -> Option<StatsSnapshot> {
        if self.session.status != SessionStatus::InProgress {
            return None;
        }

        let snapshot = self.snapshot();
        self.session.status = SessionStatus::Completed;
        tracing::info!(
            typed = snapshot.total_chars,
            of = self.session.reference.len(),
            wpm = snapshot.wpm,
            accuracy = snapshot.accuracy,
            "typing session ended by time limit"
        );
        Some(snapshot)
    }

    /// Start over on the same passage
    pub fn reset(&mut self) {
        self.session = Session::new(&self.session.reference_text());
    }

    /// Start over on a different passage
    pub fn reset_with_text(&mut self, reference: &str) {
        self.session = Session::new(reference);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::feedback::RecordingSink;
    use assert_matches::assert_matches;
    use std::time::Duration;

    fn engine(reference: &str) -> (TypingEngine, ManualClock) {
        let clock = ManualClock::default();
        let engine = TypingEngine::new(reference).with_clock(clock.clone());
        (engine, clock)
    }

    #[test]
    fn test_new_engine() {
        let (engine, _) = engine("the cat sat");
        assert_eq!(engine.status(), SessionStatus::NotStarted);
        assert!(!engine.has_started());
        assert!(!engine.is_complete());
        assert_eq!(engine.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_first_input_starts_session() {
        let (mut engine, clock) = engine("the cat sat");

        let update = engine.on_input("t").unwrap();

        assert!(update.timer_started);
        assert_eq!(engine.status(), SessionStatus::InProgress);
        assert_eq!(engine.started_at(), Some(clock.now()));

        let update = engine.on_input("th").unwrap();
        assert!(!update.timer_started);
    }

    #[test]
    fn test_empty_input_does_not_start() {
        let (mut engine, _) = engine("the cat sat");

        let update = engine.on_input("").unwrap();

        assert!(!update.timer_started);
        assert_eq!(update.snapshot, StatsSnapshot::default());
        assert_eq!(engine.status(), SessionStatus::NotStarted);
        assert!(engine.started_at().is_none());
    }

    #[test]
    fn test_the_cat_sat_scenario() {
        let (mut engine, clock) = engine("the cat sat");

        let update = engine.on_input("the").unwrap();
        assert_eq!(update.snapshot.correct_chars, 3);
        assert_eq!(update.snapshot.incorrect_chars, 0);
        assert_eq!(update.snapshot.accuracy, 100);
        assert_eq!(engine.status(), SessionStatus::InProgress);

        clock.advance(Duration::from_secs(2));
        let update = engine.on_input("the dog").unwrap();
        assert_eq!(update.snapshot.correct_chars, 4);
        assert_eq!(update.snapshot.incorrect_chars, 3);
        assert_eq!(update.snapshot.accuracy, 57);
        assert!(update.completion.is_none());

        clock.advance(Duration::from_secs(4));
        let update = engine.on_input("the cat sat").unwrap();
        assert_eq!(engine.status(), SessionStatus::Completed);
        assert_eq!(update.snapshot.correct_chars, 11);
        assert_eq!(update.snapshot.accuracy, 100);
        // three words in six seconds
        assert_eq!(update.snapshot.wpm, 30);
        assert_eq!(update.completion, Some(update.snapshot));
    }

    #[test]
    fn test_excess_input_is_rejected_without_change() {
        let (mut engine, _) = engine("12345678901234567890");
        engine.on_input("1234").unwrap();
        let before = engine.session().clone();

        assert!(engine.on_input("12345678901234567890X").is_none());
        assert_eq!(engine.session(), &before);
    }

    #[test]
    fn test_excess_input_before_start_does_not_start() {
        let (mut engine, _) = engine("ab");
        assert!(engine.on_input("abc").is_none());
        assert_eq!(engine.status(), SessionStatus::NotStarted);
        assert!(engine.started_at().is_none());
    }

    #[test]
    fn test_completion_fires_once() {
        let (mut engine, _) = engine("hi");

        let first = engine.on_input("hi").unwrap();
        assert!(first.completion.is_some());

        assert!(engine.on_input("hi").is_none());
        assert!(engine.on_input("h").is_none());
        assert!(engine.force_complete().is_none());
        assert_eq!(engine.input(), &['h', 'i']);
    }

    #[test]
    fn test_tick_only_while_in_progress() {
        let (mut engine, clock) = engine("the cat sat");
        assert!(engine.tick().is_none());

        engine.on_input("the").unwrap();
        clock.advance(Duration::from_secs(30));
        let snapshot = engine.tick().unwrap();
        assert_eq!(snapshot.wpm, 2);
        assert!((snapshot.elapsed_seconds - 30.0).abs() < 1e-9);
        assert_eq!(engine.wpm_history(), &[TimeSeriesPoint::new(30.0, 2.0)]);

        engine.on_input("the cat sat").unwrap();
        assert!(engine.tick().is_none());
        assert_eq!(engine.wpm_history().len(), 1);
    }

    #[test]
    fn test_tick_reflects_elapsed_time_without_new_input() {
        let (mut engine, clock) = engine("one two three four");
        engine.on_input("one two").unwrap();

        clock.advance(Duration::from_secs(6));
        let early = engine.tick().unwrap();
        clock.advance(Duration::from_secs(6));
        let later = engine.tick().unwrap();

        assert_eq!(early.wpm, 20);
        assert_eq!(later.wpm, 10);
        assert_eq!(early.total_chars, later.total_chars);
    }

    #[test]
    fn test_force_complete_with_partial_input() {
        let (mut engine, clock) = engine("abcdefghij");
        engine.on_input("abcdx").unwrap();
        clock.advance(Duration::from_secs(60));

        let snapshot = engine.force_complete().unwrap();

        assert_eq!(engine.status(), SessionStatus::Completed);
        assert_eq!(snapshot.total_chars, 5);
        assert_eq!(snapshot.correct_chars, 4);
        assert_eq!(snapshot.accuracy, 80);
        assert_eq!(snapshot.wpm, 1);
        assert!(engine.force_complete().is_none());
        assert!(engine.on_input("abcdxf").is_none());
    }

    #[test]
    fn test_force_complete_before_start_is_noop() {
        let (mut engine, _) = engine("abc");
        assert!(engine.force_complete().is_none());
        assert_eq!(engine.status(), SessionStatus::NotStarted);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let (mut engine, _) = engine("the cat sat");
        engine.on_input("the ca").unwrap();
        engine.tick();

        engine.reset();

        assert_eq!(engine.status(), SessionStatus::NotStarted);
        assert!(engine.input().is_empty());
        assert!(engine.started_at().is_none());
        assert_eq!(engine.current_word_index(), 0);
        assert!(engine.wpm_history().is_empty());
        assert_eq!(engine.session().reference_text(), "the cat sat");
    }

    #[test]
    fn test_tick_and_force_complete_after_reset_are_noops() {
        let (mut engine, clock) = engine("abcdef");
        engine.on_input("ab").unwrap();

        engine.reset();
        clock.advance(Duration::from_secs(5));

        assert!(engine.tick().is_none());
        assert!(engine.force_complete().is_none());
        assert_eq!(engine.status(), SessionStatus::NotStarted);
        assert!(engine.wpm_history().is_empty());
    }

    #[test]
    fn test_reset_after_completion_allows_new_completion() {
        let (mut engine, _) = engine("ok");
        assert!(engine.on_input("ok").unwrap().completion.is_some());

        engine.reset_with_text("go");

        assert_eq!(engine.session().reference_text(), "go");
        let update = engine.on_input("go").unwrap();
        assert!(update.timer_started);
        assert!(update.completion.is_some());
    }

    #[test]
    fn test_word_index_tracks_input() {
        let (mut engine, _) = engine("the cat sat");
        engine.on_input("the").unwrap();
        assert_eq!(engine.current_word_index(), 0);
        engine.on_input("the ").unwrap();
        assert_eq!(engine.current_word_index(), 1);
        engine.on_input("the cat s").unwrap();
        assert_eq!(engine.current_word_index(), 2);
    }

    #[test]
    fn test_backspace_shrinks_input() {
        let (mut engine, _) = engine("abc");
        engine.on_input("ax").unwrap();
        let update = engine.on_input("a").unwrap();
        assert_eq!(update.snapshot.total_chars, 1);
        assert_eq!(update.snapshot.incorrect_chars, 0);
        assert_eq!(engine.status(), SessionStatus::InProgress);
    }

    #[test]
    fn test_feedback_cues() {
        let sink = RecordingSink::new();
        let mut engine = TypingEngine::new("abc")
            .with_clock(ManualClock::default())
            .with_sink(sink.clone());

        engine.on_input("a").unwrap();
        engine.on_input("ax").unwrap();
        engine.on_input("a").unwrap();
        engine.on_input("ab").unwrap();
        engine.on_input("abc").unwrap();

        assert_eq!(
            sink.cues(),
            vec![
                Cue::Keypress,
                Cue::Error,
                Cue::Keypress,
                Cue::Keypress,
                Cue::Success
            ]
        );
    }

    #[test]
    fn test_char_states_follow_input() {
        let (mut engine, _) = engine("abc");
        engine.on_input("ax").unwrap();
        assert_matches!(
            engine.char_states(true).as_slice(),
            [CharState::Correct, CharState::Incorrect, CharState::Cursor]
        );
    }

    #[test]
    fn test_monotonic_progress_keeps_counts_consistent() {
        let (mut engine, clock) = engine("the quick brown fox");
        let typed = "thw quick brpwn fox";
        for end in 1..=typed.len() {
            clock.advance(Duration::from_millis(150));
            let update = engine.on_input(&typed[..end]).unwrap();
            let s = update.snapshot;
            assert_eq!(s.correct_chars + s.incorrect_chars, end);
            assert_eq!(s.total_chars, end);
            assert!(s.accuracy <= 100);
        }
        assert!(engine.is_complete());
    }
}
