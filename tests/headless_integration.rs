use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use typesprint::clock::ManualClock;
use typesprint::countdown::Countdown;
use typesprint::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use typesprint::{SessionStatus, TypingEngine};

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless integration using the runtime + engine without a TTY.
#[test]
fn headless_typing_flow_completes() {
    let mut engine = TypingEngine::new("hi");
    let mut buffer = String::new();
    let mut completions = 0;

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));

    tx.send(key('h')).unwrap();
    tx.send(key('i')).unwrap();
    // keys after completion must not change anything
    tx.send(key('!')).unwrap();

    for _ in 0..100u32 {
        match runner.step() {
            AppEvent::Tick => {
                engine.tick();
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if let KeyCode::Char(c) = key.code {
                    let mut candidate = buffer.clone();
                    candidate.push(c);
                    if let Some(update) = engine.on_input(&candidate) {
                        buffer = candidate;
                        if update.completion.is_some() {
                            completions += 1;
                        }
                    }
                }
            }
        }
    }

    assert_eq!(engine.status(), SessionStatus::Completed);
    assert_eq!(completions, 1);
    assert_eq!(buffer, "hi");
    assert_eq!(engine.snapshot().accuracy, 100);
}

#[test]
fn headless_timed_session_finishes_by_countdown() {
    let clock = ManualClock::default();
    let mut engine = TypingEngine::new("abcdefghij").with_clock(clock.clone());
    let mut countdown = Countdown::new(3);

    let update = engine.on_input("abcde").unwrap();
    assert!(update.timer_started);
    countdown.start();

    let mut final_stats = None;
    for _ in 0..10 {
        clock.advance(Duration::from_secs(1));
        engine.tick();
        if countdown.on_tick() {
            final_stats = engine.force_complete();
        }
    }

    let final_stats = final_stats.expect("countdown should force completion");
    assert_eq!(engine.status(), SessionStatus::Completed);
    assert_eq!(final_stats.total_chars, 5);
    assert_eq!(final_stats.accuracy, 100);
    assert!((final_stats.elapsed_seconds - 3.0).abs() < 1e-9);
    // ticks after completion are ignored
    assert_eq!(engine.wpm_history().len(), 3);
}
