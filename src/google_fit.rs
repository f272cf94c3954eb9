//! Google Fit hydration writes. One dataset point per logged drink,
//! fire-and-forget: a failure is logged and the drink stays local-only.

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tracing::{trace, warn};

use crate::{http::REQWEST_CLIENT, oauth, storage::AppState};

const FIT_DATA_SOURCES_URL: &str = "https://www.googleapis.com/fitness/v1/users/me/dataSources";

#[derive(Debug, Error)]
pub enum FitError {
    #[error("google fit request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("google fit response is missing {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Auth(#[from] oauth::OauthError),
}

/// Pushes one intake write to Google Fit. Skipped when no account is
/// linked; any failure is logged and dropped.
pub async fn sync_intake(state: Arc<AppState>, amount_ml: f64, utc_sec: i64) {
    let data_source_id = state
        .inner
        .read()
        .unwrap()
        .google_fit_data_source_id
        .clone();

    let Some(data_source_id) = data_source_id else {
        trace!("no google account linked, skipping fit sync");
        return;
    };

    if let Err(err) = write_intake(&state, &data_source_id, amount_ml, utc_sec).await {
        warn!("google fit sync failed: {err}");
    }
}

async fn write_intake(
    state: &AppState,
    data_source_id: &str,
    amount_ml: f64,
    utc_sec: i64,
) -> Result<(), FitError> {
    let access_token = oauth::ensure_access_token_validity(state).await?;
    write_water_intake_data(amount_ml, utc_sec, data_source_id, &access_token).await
}

/// Registers the hydration data source drinks are written under. Returns
/// its stream id.
pub async fn create_fit_data_source(access_token: &str) -> Result<String, FitError> {
    let json_body = json!({
        "dataStreamName": "HydrationSource",
        "type": "raw",
        "application": {
            "detailsUrl": "https://github.com/cmobautomation/aquatrack",
            "name": "AquaTrack",
            "version": env!("CARGO_PKG_VERSION")
        },
        "dataType": {
            "name": "com.google.hydration",
            "field": [
                {
                    "name": "volume",
                    "format": "floatPoint",
                    "optional": false
                }
            ]
        }
    });

    let response = REQWEST_CLIENT
        .post(FIT_DATA_SOURCES_URL)
        .header("Authorization", format!("Bearer {access_token}"))
        .json(&json_body)
        .send()
        .await?
        .error_for_status()?;

    let response_json = response.json::<serde_json::Value>().await?;

    response_json["dataStreamId"]
        .as_str()
        .map(str::to_owned)
        .ok_or(FitError::MissingField("dataStreamId"))
}

pub async fn write_water_intake_data(
    amount_ml: f64,
    utc_sec: i64,
    data_stream_id: &str,
    access_token: &str,
) -> Result<(), FitError> {
    // Fit wants nanosecond timestamps and liters.
    let ns = utc_sec * 1_000_000_000;
    let amount_litre = amount_ml / 1000.0;

    let json_body = json!({
        "dataSourceId": data_stream_id,
        "maxEndTimeNs": ns,
        "minStartTimeNs": ns,
        "point": [
            {
                "dataTypeName": "com.google.hydration",
                "endTimeNanos": ns,
                "startTimeNanos": ns,
                "value": [
                    { "fpVal": amount_litre }
                ],
            }
        ]
    });

    REQWEST_CLIENT
        .post(format!("{FIT_DATA_SOURCES_URL}/{data_stream_id}/datasets/"))
        .header("Authorization", format!("Bearer {access_token}"))
        .json(&json_body)
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}
