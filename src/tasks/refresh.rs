use std::{sync::Arc, time::Duration};

use tracing::{instrument, trace};

use crate::{commands, storage::AppState};

/// Cadence the platform grants background app refresh.
const REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Republishes the widget snapshot on a fixed cadence so the widget picks
/// up day rollovers even when nothing new is logged.
#[instrument(skip(state))]
pub async fn refresh_task(state: Arc<AppState>) {
    loop {
        tokio::time::sleep(REFRESH_INTERVAL).await;

        trace!("background refresh, republishing the widget snapshot");
        commands::publish_snapshot(&state);
    }
}
