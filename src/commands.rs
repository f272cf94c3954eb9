//! The operations the tracking and settings screens call. Screen-side
//! validation lives here, not in the store: most notably the decrease
//! guard, which the store itself does not enforce.

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::info;

use crate::{
    aggregate, notify, snapshot,
    storage::AppState,
    structs::{
        drink_point::DrinkPoint,
        settings::{GoalSettings, DEFAULT_DAILY_GOAL_ML, REMINDER_INTERVALS_MINUTES},
    },
};

/// Quick-add buttons offered by the tracking screen, in milliliters.
pub const QUICK_ADD_AMOUNTS_ML: [f64; 6] = [25.0, 50.0, 100.0, 250.0, 500.0, 750.0];

#[derive(Debug, PartialEq, Error)]
pub enum CommandError {
    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("a decrease of {requested}ml exceeds today's {available}ml")]
    DecreaseExceedsToday { requested: f64, available: f64 },

    #[error("daily goal must be positive")]
    NonPositiveGoal,

    #[error("unsupported reminder interval: {0} minutes")]
    UnsupportedInterval(u32),
}

/// Logs a drink and pushes the fresh total to the widget.
pub fn add_drink(state: &AppState, amount_ml: f64) -> Result<DrinkPoint, CommandError> {
    if amount_ml <= 0.0 {
        return Err(CommandError::NonPositiveAmount);
    }

    let point = state.add_record(amount_ml);
    info!("logged {amount_ml}ml");

    publish_snapshot(state);
    Ok(point)
}

/// Walks today's total back down with a negative record. Rejected when
/// the decrease is larger than what has been logged today; this is the
/// only place that check happens.
pub fn decrease_drink(state: &AppState, amount_ml: f64) -> Result<DrinkPoint, CommandError> {
    if amount_ml <= 0.0 {
        return Err(CommandError::NonPositiveAmount);
    }

    let available = today_total(state);
    if available < amount_ml {
        return Err(CommandError::DecreaseExceedsToday {
            requested: amount_ml,
            available,
        });
    }

    let point = state.add_record(-amount_ml);
    info!("removed {amount_ml}ml from today's total");

    publish_snapshot(state);
    Ok(point)
}

/// Today's running total in milliliters.
pub fn today_total(state: &AppState) -> f64 {
    aggregate::today_total(&state.all_records(), Local::now())
}

/// One entry per day of the trailing week, today included, oldest first.
pub fn weekly_totals(state: &AppState) -> Vec<(NaiveDate, f64)> {
    aggregate::daily_totals(&state.all_records(), 7, Local::now())
}

/// Day-by-day history over everything ever logged, newest first.
pub fn drink_history_by_day(state: &AppState) -> Vec<(NaiveDate, f64)> {
    aggregate::history_by_day(&state.all_records())
}

pub fn latest_drink(state: &AppState) -> Option<DrinkPoint> {
    state.latest_record()
}

/// Changes the daily goal and republishes the snapshot so the widget
/// tracks the new target right away.
pub fn set_daily_goal(state: &AppState, goal_ml: f64) -> Result<GoalSettings, CommandError> {
    if goal_ml <= 0.0 {
        return Err(CommandError::NonPositiveGoal);
    }

    let updated = state.update_settings(|settings| settings.daily_goal_ml = goal_ml);
    publish_snapshot(state);
    Ok(updated)
}

pub fn set_reminder_interval(
    state: &AppState,
    interval_minutes: u32,
) -> Result<GoalSettings, CommandError> {
    if !REMINDER_INTERVALS_MINUTES.contains(&interval_minutes) {
        return Err(CommandError::UnsupportedInterval(interval_minutes));
    }

    Ok(state.update_settings(|settings| settings.reminder_interval_minutes = interval_minutes))
}

/// Turning reminders on asks the platform for notification authorization
/// first; on denial the setting stays off so it mirrors what the platform
/// will actually deliver.
pub fn set_reminder_enabled(state: &AppState, enabled: bool) -> GoalSettings {
    let granted = if enabled {
        notify::request_authorization()
    } else {
        true
    };

    apply_reminder_toggle(state, enabled, granted)
}

fn apply_reminder_toggle(state: &AppState, enabled: bool, granted: bool) -> GoalSettings {
    state.update_settings(|settings| settings.reminder_enabled = enabled && granted)
}

/// Recomputes the (total, goal) pair and publishes it for the widget.
/// Reading the goal here does not create the settings record; an untouched
/// install publishes the default goal.
pub fn publish_snapshot(state: &AppState) {
    let (records, goal) = {
        let inner = state.inner.read().unwrap();
        let goal = inner
            .settings
            .as_ref()
            .map_or(DEFAULT_DAILY_GOAL_ML, |settings| settings.daily_goal_ml);
        (inner.drink_history.clone(), goal)
    };

    let total = aggregate::today_total(&records, Local::now());
    snapshot::publish(state.snapshot_path(), total, goal);
}
