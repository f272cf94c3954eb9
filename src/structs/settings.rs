use serde::{Deserialize, Serialize};

pub const DEFAULT_DAILY_GOAL_ML: f64 = 2000.0;
pub const DEFAULT_REMINDER_INTERVAL_MINUTES: u32 = 60;

/// Reminder cadences offered by the settings screen.
pub const REMINDER_INTERVALS_MINUTES: [u32; 4] = [30, 60, 120, 240];

/// The per-installation preferences record. Exactly one exists; it is
/// created with defaults on first access and mutated in place after that.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GoalSettings {
    /// Daily goal in milliliters
    pub daily_goal_ml: f64,

    pub reminder_enabled: bool,

    /// Minutes between reminder notifications
    pub reminder_interval_minutes: u32,
}

impl Default for GoalSettings {
    fn default() -> Self {
        Self {
            daily_goal_ml: DEFAULT_DAILY_GOAL_ML,
            reminder_enabled: false,
            reminder_interval_minutes: DEFAULT_REMINDER_INTERVAL_MINUTES,
        }
    }
}
