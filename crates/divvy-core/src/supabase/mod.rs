//! Thin client for the hosted Supabase backend.
//!
//! Two surfaces, both plain HTTPS:
//! - `auth`: GoTrue password sign-up, PKCE code exchange, token refresh
//! - `postgrest`: generic table query, used for the transactions list
//!
//! The backend owns validation, storage, and query semantics; this client
//! only shapes requests and decodes responses.

mod auth;
mod postgrest;
pub mod types;

pub use auth::Pkce;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::config::SupabaseSettings;

/// Supabase API client.
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    http: reqwest::Client,
}

impl SupabaseClient {
    /// Creates a new client from connection settings.
    ///
    /// # Errors
    /// Returns an error when the project URL or anon key is missing, with a
    /// pointer at the config file to fix.
    pub fn new(settings: &SupabaseSettings) -> Result<Self> {
        if settings.url.trim().is_empty() || settings.anon_key.trim().is_empty() {
            bail!(
                "Supabase connection is not configured.\n\
                 Set [supabase] url and anon_key in {} \
                 (or DIVVY_SUPABASE_URL / DIVVY_SUPABASE_ANON_KEY).",
                crate::config::paths::config_path().display()
            );
        }

        Ok(Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            anon_key: settings.anon_key.clone(),
            http: reqwest::Client::new(),
        })
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    pub(crate) fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

/// Error body shapes the backend returns across endpoint generations.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Reduces a non-success response to the backend's own message.
///
/// The auth and query endpoints disagree on the error envelope, so try the
/// known field names in order and fall back to the raw body or status line.
pub(crate) async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    extract_error_message(status, &body)
}

fn extract_error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        for field in [
            parsed.msg,
            parsed.message,
            parsed.error_description,
            parsed.error,
        ]
        .into_iter()
        .flatten()
        {
            if !field.is_empty() {
                return field;
            }
        }
    }

    if body.trim().is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    }
}

/// Decodes a JSON success body with a uniform error context.
pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T> {
    response
        .json::<T>()
        .await
        .context("Failed to parse backend response")
}
