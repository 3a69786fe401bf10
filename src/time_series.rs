use serde::{Deserialize, Serialize};

use crate::util::std_dev;

/// One wpm sample taken at `t` seconds into the attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<(f64, f64)> for TimeSeriesPoint {
    fn from(v: (f64, f64)) -> Self {
        TimeSeriesPoint { t: v.0, wpm: v.1 }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// X (seconds) and Y (wpm) upper bounds for plotting a series
pub fn chart_bounds(points: &[TimeSeriesPoint], fallback_secs: f64) -> (f64, f64) {
    let highest_wpm = points.iter().map(|p| p.wpm).fold(0.0, f64::max);
    let duration = points.last().map_or(fallback_secs, |p| p.t).max(1.0);

    (duration, highest_wpm.round())
}

/// Spread of the sampled wpm values; 0 with fewer than two samples
pub fn wpm_std_dev(points: &[TimeSeriesPoint]) -> f64 {
    let wpms: Vec<f64> = points.iter().map(|p| p.wpm).collect();
    std_dev(&wpms).unwrap_or(0.0)
}
