//! Authentication gateway and session status signal.
//!
//! `Auth` is the only writer of the session signal. Every status change it
//! publishes follows a backend-confirmed operation (restore, sign-up,
//! code exchange, refresh); there is no optimistic local mutation, so the
//! signal never disagrees with what the backend would report.

pub mod store;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::routing;
use crate::signal::Signal;
use crate::supabase::types::Session;
use crate::supabase::{Pkce, SupabaseClient};
use store::SessionStore;

/// Current authentication state.
///
/// `Initializing` and `Refreshing` are transitional: the session's fate is
/// not yet known and consumers must not act on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Cold start: stored session not inspected yet.
    Initializing,
    /// A stored session is being refreshed against the backend.
    Refreshing,
    /// No valid session exists.
    NotAuthenticated,
    /// A backend-confirmed session is active.
    Authenticated(Session),
}

/// Authentication gateway.
///
/// Wraps the backend auth endpoints, persists sessions across runs, and
/// owns the `Signal<SessionStatus>` consumed by the routing core.
pub struct Auth {
    client: Arc<SupabaseClient>,
    store: SessionStore,
    status: Signal<SessionStatus>,
}

impl Auth {
    /// Creates the gateway. The signal starts at `Initializing`; call
    /// [`Auth::restore`] once to resolve it.
    pub fn new(client: Arc<SupabaseClient>, store: SessionStore) -> Self {
        Self {
            client,
            store,
            status: Signal::new(SessionStatus::Initializing),
        }
    }

    /// The session status signal (hot, replay-latest, multi-subscriber).
    pub fn status(&self) -> &Signal<SessionStatus> {
        &self.status
    }

    /// Returns the current access token, if authenticated.
    pub fn access_token(&self) -> Option<String> {
        match self.status.get() {
            SessionStatus::Authenticated(session) => Some(session.access_token),
            _ => None,
        }
    }

    /// Cold-start session restoration.
    ///
    /// Resolves `Initializing` into `Authenticated` or `NotAuthenticated`,
    /// refreshing an expired stored session on the way. Never fails the
    /// caller: anything unrecoverable degrades to `NotAuthenticated`.
    pub async fn restore(&self) {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(err) => {
                warn!("discarding unreadable session file: {err:#}");
                self.status.publish(SessionStatus::NotAuthenticated);
                return;
            }
        };

        let Some(session) = stored.session else {
            self.status.publish(SessionStatus::NotAuthenticated);
            return;
        };

        if !session.is_expired() {
            info!(user = %session.user.id, "restored session from disk");
            self.status.publish(SessionStatus::Authenticated(session));
            return;
        }

        self.status.publish(SessionStatus::Refreshing);
        match self.client.refresh_session(&session.refresh_token).await {
            Ok(fresh) => {
                if let Err(err) = self.persist_session(fresh.clone()) {
                    warn!("failed to persist refreshed session: {err:#}");
                }
                info!(user = %fresh.user.id, "refreshed expired session");
                self.status.publish(SessionStatus::Authenticated(fresh));
            }
            Err(err) => {
                warn!("session refresh failed: {err:#}");
                if let Err(err) = self.drop_session() {
                    warn!("failed to drop stale session: {err:#}");
                }
                self.status.publish(SessionStatus::NotAuthenticated);
            }
        }
    }

    /// Creates an account with email and password.
    ///
    /// Publishes `Authenticated` only if the backend confirms immediately;
    /// otherwise the status is left untouched and the session arrives later
    /// through the confirmation deep link. The PKCE verifier is persisted
    /// before the request so the exchange works across a restart.
    ///
    /// # Errors
    /// Returns a user-displayable message (validation or backend error).
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<()> {
        if email.trim().is_empty() || password.is_empty() {
            bail!("Email and password are required.");
        }

        let pkce = Pkce::generate();
        let mut stored = self.store.load().unwrap_or_default();
        stored.code_verifier = Some(pkce.verifier.clone());
        self.store
            .save(&stored)
            .context("Failed to persist sign-up state")?;

        let redirect = routing::sign_up_redirect_url();
        match self
            .client
            .sign_up(email.trim(), password, &redirect, &pkce)
            .await?
        {
            Some(session) => {
                self.persist_session(session.clone())
                    .context("Failed to persist session")?;
                info!(user = %session.user.id, "signed up with immediate confirmation");
                self.status.publish(SessionStatus::Authenticated(session));
            }
            None => {
                info!("sign-up accepted, awaiting mail confirmation");
            }
        }
        Ok(())
    }

    /// Exchanges a confirmation deep-link code for a session.
    ///
    /// One-shot per code: the backend rejects replays. On success the
    /// signal flips to `Authenticated`; on failure it is left untouched.
    ///
    /// # Errors
    /// Returns a user-displayable message.
    pub async fn exchange_code_for_session(&self, code: &str) -> Result<()> {
        let stored = self.store.load().unwrap_or_default();
        let verifier = stored
            .code_verifier
            .context("No pending sign-up on this device")?;

        let session = self
            .client
            .exchange_code_for_session(code, &verifier)
            .await?;

        self.persist_session(session.clone())
            .context("Failed to persist session")?;
        info!(user = %session.user.id, "confirmation code exchanged");
        self.status.publish(SessionStatus::Authenticated(session));
        Ok(())
    }

    /// Stores a session and retires any pending verifier.
    fn persist_session(&self, session: Session) -> Result<()> {
        self.store.save(&store::StoredAuth {
            session: Some(session),
            code_verifier: None,
        })
    }

    /// Drops the stored session but keeps a pending verifier alive.
    fn drop_session(&self) -> Result<()> {
        let mut stored = self.store.load().unwrap_or_default();
        stored.session = None;
        self.store.save(&stored)
    }
}
