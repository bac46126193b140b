//! GoTrue auth endpoints: password sign-up, PKCE code exchange, refresh.

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;
use sha2::{Digest, Sha256};

use super::types::{Session, SignUpResponse, TokenResponse};
use super::{SupabaseClient, decode_json, error_message};

/// PKCE code verifier and challenge.
///
/// The verifier is generated at sign-up and spent at code exchange; it
/// never leaves the device except inside the exchange request.
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    /// Generates a fresh verifier/challenge pair (S256).
    pub fn generate() -> Self {
        // Use two UUIDs (16 bytes each) to get 32 random bytes
        let uuid1 = uuid::Uuid::new_v4();
        let uuid2 = uuid::Uuid::new_v4();
        let mut verifier_bytes = [0u8; 32];
        verifier_bytes[..16].copy_from_slice(uuid1.as_bytes());
        verifier_bytes[16..].copy_from_slice(uuid2.as_bytes());
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);

        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        let challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

        Self {
            verifier,
            challenge,
        }
    }
}

impl SupabaseClient {
    /// Creates an account with email and password.
    ///
    /// `redirect_to` is the deep link the confirmation mail points back at;
    /// the PKCE challenge binds the later code exchange to this device.
    /// Returns the session when the project auto-confirms, `None` when the
    /// user must confirm by mail first.
    ///
    /// # Errors
    /// Returns the backend's message on failure (e.g. "email taken").
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: &str,
        pkce: &Pkce,
    ) -> Result<Option<Session>> {
        let response = self
            .http()
            .post(self.auth_url("signup"))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", self.anon_key())
            .json(&json!({
                "email": email,
                "password": password,
                "code_challenge": pkce.challenge,
                "code_challenge_method": "s256",
            }))
            .send()
            .await
            .context("Failed to send sign-up request")?;

        if !response.status().is_success() {
            bail!("{}", error_message(response).await);
        }

        let body: SignUpResponse = decode_json(response).await?;
        Ok(body.into_session())
    }

    /// Exchanges a confirmation deep-link code for a session (PKCE grant).
    ///
    /// Not idempotent: the backend rejects a replayed code, so call at most
    /// once per received code.
    ///
    /// # Errors
    /// Returns the backend's message on failure.
    pub async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> Result<Session> {
        let response = self
            .http()
            .post(self.auth_url("token"))
            .query(&[("grant_type", "pkce")])
            .header("apikey", self.anon_key())
            .json(&json!({
                "auth_code": auth_code,
                "code_verifier": code_verifier,
            }))
            .send()
            .await
            .context("Failed to send code exchange request")?;

        if !response.status().is_success() {
            bail!("{}", error_message(response).await);
        }

        let body: TokenResponse = decode_json(response).await?;
        Ok(body.into_session())
    }

    /// Trades a refresh token for a fresh session.
    ///
    /// # Errors
    /// Returns the backend's message on failure.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let response = self
            .http()
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", self.anon_key())
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .context("Failed to send token refresh request")?;

        if !response.status().is_success() {
            bail!("{}", error_message(response).await);
        }

        let body: TokenResponse = decode_json(response).await?;
        Ok(body.into_session())
    }
}
