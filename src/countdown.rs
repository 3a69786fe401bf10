/// Urgency of the remaining time, used to color the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLevel {
    Normal,
    Warning,
    Critical,
}

const WARNING_SECS: u32 = 10;
const CRITICAL_SECS: u32 = 5;

/// Whole-second countdown for a timed test.
///
/// It does not run until `start` is called, which the caller does when the
/// engine reports that typing began.
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    limit_secs: u32,
    remaining_secs: u32,
    running: bool,
}

impl Countdown {
    pub fn new(limit_secs: u32) -> Self {
        Self {
            limit_secs,
            remaining_secs: limit_secs,
            running: false,
        }
    }

    pub fn start(&mut self) {
        if self.remaining_secs > 0 {
            self.running = true;
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.limit_secs);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn limit(&self) -> u32 {
        self.limit_secs
    }

    pub fn remaining(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    /// Advance one second. Returns `true` only on the tick that reaches zero.
    pub fn on_tick(&mut self) -> bool {
        if !self.running {
            return false;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
            tracing::debug!(limit = self.limit_secs, "time limit reached");
            return true;
        }
        false
    }

    pub fn fraction_remaining(&self) -> f64 {
        if self.limit_secs == 0 {
            return 0.0;
        }
        self.remaining_secs as f64 / self.limit_secs as f64
    }

    pub fn level(&self) -> TimeLevel {
        match self.remaining_secs {
            0 => TimeLevel::Normal,
            s if s <= CRITICAL_SECS => TimeLevel::Critical,
            s if s <= WARNING_SECS => TimeLevel::Warning,
            _ => TimeLevel::Normal,
        }
    }

    /// Remaining time as `m:ss`
    pub fn format_clock(&self) -> String {
        format!("{}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}
