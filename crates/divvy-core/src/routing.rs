//! Session-driven routing core.
//!
//! The session signal is the single source of truth for navigation: the
//! active screen is always re-derived from the latest `SessionStatus` plus
//! the pending confirmation code, never from screen-local flags. The
//! `Router` wraps that derivation in a small state machine that emits each
//! distinct transition exactly once.

use tracing::debug;

use crate::session::SessionStatus;

/// Custom URI scheme the OS delivers confirmation links on.
const DEEP_LINK_SCHEME: &str = "divvy";
const DEEP_LINK_HOST: &str = "app";
const SIGN_UP_COMPLETE_PATH: &str = "/signUpComplete";

/// The screen currently (or about to be) displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteState {
    /// Session fate unknown; do not navigate yet. Initial value only.
    /// Suppressing navigation here prevents a sign-up flash while a
    /// stored session restores at cold start.
    Undetermined,
    SignUp,
    /// A confirmation code arrived and is being (or about to be) exchanged.
    WaitingForConfirmation { code: String },
    ExpenseList,
}

/// Maps the latest session status and pending deep-link code to a route.
///
/// Pure: replaying the same inputs yields the same route.
pub fn derive_route(status: &SessionStatus, pending_code: Option<&str>) -> RouteState {
    match status {
        SessionStatus::Initializing | SessionStatus::Refreshing => RouteState::Undetermined,
        SessionStatus::Authenticated(_) => RouteState::ExpenseList,
        SessionStatus::NotAuthenticated => match pending_code {
            Some(code) => RouteState::WaitingForConfirmation {
                code: code.to_string(),
            },
            None => RouteState::SignUp,
        },
    }
}

/// Navigation state machine.
///
/// Transitions are driven by session emissions, deep-link activation, and
/// explicit navigation. Invariants:
/// - `Undetermined` is never re-entered once left;
/// - an authenticated session wins over a pending confirmation code;
/// - each distinct route change is reported exactly once (duplicate
///   derivations return `None`).
#[derive(Debug)]
pub struct Router {
    current: RouteState,
    last_status: SessionStatus,
    pending_code: Option<String>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            current: RouteState::Undetermined,
            last_status: SessionStatus::Initializing,
            pending_code: None,
        }
    }

    /// The active route.
    pub fn current(&self) -> &RouteState {
        &self.current
    }

    /// Feeds the next session emission; returns the route to navigate to,
    /// or `None` when the screen stays put.
    pub fn on_session_status(&mut self, status: SessionStatus) -> Option<RouteState> {
        if matches!(status, SessionStatus::Authenticated(_)) && self.pending_code.take().is_some()
        {
            debug!("discarding pending confirmation code: already authenticated");
        }
        self.last_status = status;
        let derived = derive_route(&self.last_status, self.pending_code.as_deref());
        self.apply(derived)
    }

    /// Feeds a confirmation code delivered by deep link.
    ///
    /// While authenticated the code is discarded outright. While the
    /// session is still unresolved the code is held pending, so a deep
    /// link racing cold-start restoration lands on the right screen once
    /// the session resolves.
    pub fn on_deep_link(&mut self, code: String) -> Option<RouteState> {
        if matches!(self.last_status, SessionStatus::Authenticated(_)) {
            debug!("discarding deep-link code: already authenticated");
            return None;
        }
        self.pending_code = Some(code);
        let derived = derive_route(&self.last_status, self.pending_code.as_deref());
        self.apply(derived)
    }

    /// Explicit navigation (e.g. abandoning a failed confirmation).
    ///
    /// Navigating away from the confirmation screen retires the pending
    /// code: it was consumed by the attempt and must not re-trigger.
    pub fn navigate(&mut self, route: RouteState) -> Option<RouteState> {
        if !matches!(route, RouteState::WaitingForConfirmation { .. }) {
            self.pending_code = None;
        }
        self.replace(route)
    }

    fn apply(&mut self, derived: RouteState) -> Option<RouteState> {
        // No backward edge: a transitional status after the first resolved
        // one keeps the current screen instead of blanking it.
        if derived == RouteState::Undetermined && self.current != RouteState::Undetermined {
            return None;
        }
        self.replace(derived)
    }

    fn replace(&mut self, route: RouteState) -> Option<RouteState> {
        if route == self.current {
            return None;
        }
        self.current = route.clone();
        Some(route)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// The redirect URL registered with the backend at sign-up.
pub fn sign_up_redirect_url() -> String {
    format!("{DEEP_LINK_SCHEME}://{DEEP_LINK_HOST}{SIGN_UP_COMPLETE_PATH}")
}

/// Extracts the confirmation code from an activation URI.
///
/// Accepts exactly `divvy://app/signUpComplete?code={code}`; anything else
/// (wrong scheme, host, path, or a missing/empty code) is rejected.
pub fn parse_deep_link(uri: &str) -> Option<String> {
    let url = url::Url::parse(uri).ok()?;
    if url.scheme() != DEEP_LINK_SCHEME
        || url.host_str() != Some(DEEP_LINK_HOST)
        || url.path() != SIGN_UP_COMPLETE_PATH
    {
        return None;
    }
    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
}
