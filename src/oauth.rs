//! Google account link flow for Fit hydration sync. The consent page
//! redirects to a localhost loopback listener that hands us the
//! authorization code; tokens and the Fit data source id are persisted in
//! the app state once the exchange completes.

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tiny_http::{Response, Server};
use tracing::{info, warn};

use crate::{google_fit, http::REQWEST_CLIENT, storage::AppState};

const GOOGLE_CLIENT_ID: &str =
    "734628190553-hqvq0sd2kputs0tghi9kluk2ulq5prn2.apps.googleusercontent.com";
// Public client; the secret is not actually secret for installed apps.
const GOOGLE_CLIENT_SECRET: &str = "GOCSPX-q8hWmf0jRkK1ZlvuTQnZxAbcdEfG";

const REDIRECT_ADDR: &str = "localhost:11132";
const REDIRECT_URI: &str = "http://localhost:11132";
const FIT_SCOPE: &str = "https://www.googleapis.com/auth/fitness.nutrition.write";

#[derive(Debug, Error)]
pub enum OauthError {
    #[error("no Google account is linked")]
    NotLinked,

    #[error("unable to listen for the OAuth redirect: {0}")]
    Redirect(String),

    #[error("the OAuth redirect never delivered an authorization code")]
    MissingCode,

    #[error("the token endpoint returned no refresh token")]
    MissingRefreshToken,

    #[error("token endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unable to create the Fit hydration data source: {0}")]
    DataSource(#[source] Box<google_fit::FitError>),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

fn generate_oauth_consent_url() -> String {
    let qs = querystring::stringify(vec![
        ("client_id", GOOGLE_CLIENT_ID),
        ("scope", FIT_SCOPE),
        ("response_type", "code"),
        ("redirect_uri", REDIRECT_URI),
        ("access_type", "offline"),
    ]);

    format!("https://accounts.google.com/o/oauth2/v2/auth?{qs}")
}

async fn exchange_code_with_tokens(code: &str) -> Result<TokenResponse, OauthError> {
    let qs = querystring::stringify(vec![
        ("client_id", GOOGLE_CLIENT_ID),
        ("client_secret", GOOGLE_CLIENT_SECRET),
        ("code", code),
        ("grant_type", "authorization_code"),
        ("redirect_uri", REDIRECT_URI),
    ]);

    let response = REQWEST_CLIENT
        .post(format!("https://oauth2.googleapis.com/token?{qs}"))
        .header("content-length", 0)
        .send()
        .await?
        .error_for_status()?;

    Ok(response.json::<TokenResponse>().await?)
}

async fn refresh_access_token(refresh_token: &str) -> Result<TokenResponse, OauthError> {
    let qs = querystring::stringify(vec![
        ("client_id", GOOGLE_CLIENT_ID),
        ("client_secret", GOOGLE_CLIENT_SECRET),
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ]);

    let response = REQWEST_CLIENT
        .post(format!("https://oauth2.googleapis.com/token?{qs}"))
        .header("content-length", 0)
        .send()
        .await?
        .error_for_status()?;

    Ok(response.json::<TokenResponse>().await?)
}

/// Returns a currently valid access token, refreshing and persisting it
/// through the stored refresh token when the old one has expired.
pub async fn ensure_access_token_validity(state: &AppState) -> Result<String, OauthError> {
    let (access_token, refresh_token, expires_at) = {
        let inner = state.inner.read().unwrap();
        (
            inner
                .google_oauth_access_token
                .clone()
                .ok_or(OauthError::NotLinked)?,
            inner
                .google_oauth_refresh_token
                .clone()
                .ok_or(OauthError::NotLinked)?,
            inner.google_oauth_access_token_expiry_timestamp,
        )
    };

    if Utc::now().timestamp() < expires_at {
        return Ok(access_token);
    }

    let refreshed = refresh_access_token(&refresh_token).await?;
    let expires_at = Utc::now().timestamp() + refreshed.expires_in;
    state.refresh_fit_access_token(refreshed.access_token.clone(), expires_at);

    Ok(refreshed.access_token)
}

/// Runs the whole link flow: browser consent, loopback redirect, code
/// exchange, Fit data source creation, credential persistence.
pub async fn link_google_account(state: &AppState) -> Result<(), OauthError> {
    let consent_url = generate_oauth_consent_url();
    if let Err(err) = open::that(&consent_url) {
        warn!("unable to open a browser: {err}");
        info!("open this URL to link your Google account: {consent_url}");
    }

    let code = tokio::task::spawn_blocking(wait_for_redirect_code)
        .await
        .map_err(|_| OauthError::MissingCode)??;

    let tokens = exchange_code_with_tokens(&code).await?;
    let refresh_token = tokens
        .refresh_token
        .ok_or(OauthError::MissingRefreshToken)?;
    let expires_at = Utc::now().timestamp() + tokens.expires_in;

    let data_source_id = google_fit::create_fit_data_source(&tokens.access_token)
        .await
        .map_err(|err| OauthError::DataSource(Box::new(err)))?;

    state.store_fit_credentials(tokens.access_token, refresh_token, expires_at, data_source_id);
    info!("google account linked for Fit hydration sync");

    Ok(())
}

/// Blocks until the consent redirect arrives on the loopback listener and
/// returns the authorization code it carried.
fn wait_for_redirect_code() -> Result<String, OauthError> {
    let server = Server::http(REDIRECT_ADDR).map_err(|err| OauthError::Redirect(err.to_string()))?;
    info!("listening for the OAuth redirect on {REDIRECT_ADDR}");

    for request in server.incoming_requests() {
        let url = request.url().to_string();

        if !url.starts_with("/?") {
            request
                .respond(Response::from_string("404 Not Found").with_status_code(404))
                .ok();
            continue;
        }

        let code = querystring::querify(&url[2..])
            .iter()
            .find(|(key, _)| *key == "code")
            .map(|(_, value)| (*value).to_string());

        match code {
            Some(code) => {
                request
                    .respond(Response::from_string(
                        "Linked! You can close this tab and head back to aquatrack.",
                    ))
                    .ok();
                return Ok(code);
            }
            None => {
                request
                    .respond(Response::from_string("400 Bad Request").with_status_code(400))
                    .ok();
            }
        }
    }

    Err(OauthError::MissingCode)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn the_consent_url_carries_the_fit_scope_and_redirect() {
        let url = generate_oauth_consent_url();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("fitness.nutrition.write"));
        assert!(url.contains("redirect_uri=http://localhost:11132"));
        assert!(url.contains("access_type=offline"));
    }

    #[test]
    fn token_responses_tolerate_a_missing_refresh_token() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token": "abc", "expires_in": 3599}"#).unwrap();

        assert_eq!(parsed.access_token, "abc");
        assert_eq!(parsed.refresh_token, None);
        assert_eq!(parsed.expires_in, 3599);
    }
}
