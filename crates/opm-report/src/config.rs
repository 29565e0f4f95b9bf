//! Engine thresholds.
//!
//! All numeric cut-offs used by the analyses live here so they can be tuned
//! without touching the algorithms. The defaults match the documented bands.

use serde::{Deserialize, Serialize};

/// One deduction band: when the measured value crosses `threshold`, subtract
/// `deduction` points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub threshold: f64,
    pub deduction: u32,
}

impl Band {
    pub const fn new(threshold: f64, deduction: u32) -> Self {
        Self {
            threshold,
            deduction,
        }
    }
}

/// Deduction for a "lower is worse" metric. Bands are checked in order and
/// the first one with `value < threshold` applies.
pub fn deduct_below(value: f64, bands: &[Band]) -> u32 {
    bands
        .iter()
        .find(|b| value < b.threshold)
        .map(|b| b.deduction)
        .unwrap_or(0)
}

/// Deduction for a "higher is worse" metric. The first band with
/// `value > threshold` applies.
pub fn deduct_above(value: f64, bands: &[Band]) -> u32 {
    bands
        .iter()
        .find(|b| value > b.threshold)
        .map(|b| b.deduction)
        .unwrap_or(0)
}

/// Health score bands and label edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthBands {
    /// Completion rate (%), ascending thresholds.
    #[serde(default = "default_completion_bands")]
    pub completion: Vec<Band>,
    /// Overdue rate (%), descending thresholds.
    #[serde(default = "default_overdue_bands")]
    pub overdue: Vec<Band>,
    /// Assignment rate (%), ascending thresholds.
    #[serde(default = "default_assignment_bands")]
    pub assignment: Vec<Band>,
    /// Open high-priority item count, descending thresholds.
    #[serde(default = "default_high_priority_bands")]
    pub high_priority: Vec<Band>,
    #[serde(default = "default_excellent")]
    pub excellent: u32,
    #[serde(default = "default_good")]
    pub good: u32,
    #[serde(default = "default_fair")]
    pub fair: u32,
}

fn default_completion_bands() -> Vec<Band> {
    vec![Band::new(30.0, 40), Band::new(60.0, 20), Band::new(80.0, 10)]
}

fn default_overdue_bands() -> Vec<Band> {
    vec![Band::new(20.0, 30), Band::new(10.0, 20), Band::new(5.0, 10)]
}

fn default_assignment_bands() -> Vec<Band> {
    vec![Band::new(70.0, 20), Band::new(85.0, 10), Band::new(95.0, 5)]
}

fn default_high_priority_bands() -> Vec<Band> {
    vec![Band::new(5.0, 10), Band::new(2.0, 5)]
}

fn default_excellent() -> u32 {
    90
}

fn default_good() -> u32 {
    75
}

fn default_fair() -> u32 {
    60
}

impl Default for HealthBands {
    fn default() -> Self {
        Self {
            completion: default_completion_bands(),
            overdue: default_overdue_bands(),
            assignment: default_assignment_bands(),
            high_priority: default_high_priority_bands(),
            excellent: default_excellent(),
            good: default_good(),
            fair: default_fair(),
        }
    }
}

/// Thresholds for every analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// More than this many items makes a member overloaded.
    #[serde(default = "default_overload_threshold")]
    pub overload_threshold: usize,

    /// Fewer than this many items makes a member lightly loaded.
    #[serde(default = "default_light_threshold")]
    pub light_threshold: usize,

    /// Open items due within this many days are `due_soon`.
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: i64,

    /// Window for the behind-schedule check.
    #[serde(default = "default_behind_schedule_days")]
    pub behind_schedule_days: i64,

    /// Progress (%) below which an item near its due date is behind.
    #[serde(default = "default_behind_schedule_progress")]
    pub behind_schedule_progress: u8,

    /// In-progress items not updated for more than this many days are stalled.
    #[serde(default = "default_stall_days")]
    pub stall_days: i64,

    /// Medium-risk items listed before the "+N more" trailer.
    #[serde(default = "default_medium_risk_cap")]
    pub medium_risk_cap: usize,

    /// Description length shown in weekly reports.
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,

    #[serde(default)]
    pub health: HealthBands,
}

fn default_overload_threshold() -> usize {
    10
}

fn default_light_threshold() -> usize {
    3
}

fn default_due_soon_days() -> i64 {
    3
}

fn default_behind_schedule_days() -> i64 {
    7
}

fn default_behind_schedule_progress() -> u8 {
    50
}

fn default_stall_days() -> i64 {
    7
}

fn default_medium_risk_cap() -> usize {
    5
}

fn default_description_limit() -> usize {
    100
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overload_threshold: default_overload_threshold(),
            light_threshold: default_light_threshold(),
            due_soon_days: default_due_soon_days(),
            behind_schedule_days: default_behind_schedule_days(),
            behind_schedule_progress: default_behind_schedule_progress(),
            stall_days: default_stall_days(),
            medium_risk_cap: default_medium_risk_cap(),
            description_limit: default_description_limit(),
            health: HealthBands::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_workload_bounds(mut self, light: usize, overload: usize) -> Self {
        self.light_threshold = light;
        self.overload_threshold = overload;
        self
    }

    pub fn with_stall_days(mut self, days: i64) -> Self {
        self.stall_days = days;
        self
    }

    pub fn with_medium_risk_cap(mut self, cap: usize) -> Self {
        self.medium_risk_cap = cap;
        self
    }

    pub fn with_health_bands(mut self, bands: HealthBands) -> Self {
        self.health = bands;
        self
    }
}
