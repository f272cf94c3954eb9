use std::{sync::Arc, time::Duration};

use tokio::select;
use tracing::{instrument, trace};

use crate::{notify, storage::AppState};

/// Drives the recurring hydration reminder. One cadence is active at a
/// time; any reminder-settings change re-arms the timer with the fresh
/// interval, replacing the previous one. While reminders are disabled the
/// task parks on the settings signal.
#[instrument(skip(state))]
pub async fn reminder_task(state: Arc<AppState>) {
    loop {
        let settings = state.get_or_create_settings();

        if !settings.reminder_enabled {
            trace!("reminders disabled, waiting for a settings change");
            state.reminder_settings_changed.notified().await;
            continue;
        }

        let interval = Duration::from_secs(u64::from(settings.reminder_interval_minutes) * 60);
        trace!("next reminder in {interval:?}");

        select! {
            () = tokio::time::sleep(interval) => {
                notify::show_reminder();
            },
            () = state.reminder_settings_changed.notified() => {
                trace!("reminder settings changed, re-arming the timer");
            },
        };
    }
}
