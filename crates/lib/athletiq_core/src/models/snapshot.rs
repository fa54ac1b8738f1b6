//! Athletic-performance snapshot submitted with each coaching request.

use serde::{Deserialize, Serialize};

/// Athlete state at request time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Composite daily-preparedness score.
    pub readiness: f64,
    pub sleep: Sleep,
    pub recovery: Recovery,
    pub workload: Workload,
}

/// Last night's sleep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sleep {
    /// Hours slept.
    pub duration_hrs: f64,
    /// Fraction of time in bed spent asleep, in `[0, 1]`.
    pub efficiency: f64,
    /// Bedtime regularity, in `[0, 1]`.
    pub consistency: f64,
}

/// Recovery markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recovery {
    pub score: f64,
    /// Heart-rate variability in milliseconds.
    pub hrv_ms: f64,
    /// Resting heart rate in beats per minute.
    pub resting_hr: f64,
}

/// Weekly workout progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub completed: u32,
    pub goal: u32,
}
