//! Wire types for the Supabase auth and query endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Expiry safety buffer: treat tokens as expired five minutes early so a
/// request never races the real cutoff.
const EXPIRY_BUFFER_MILLIS: u64 = 5 * 60 * 1000;

pub(crate) fn now_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_millis()).ok())
        .unwrap_or(u64::MAX)
}

/// The authenticated user as reported by the auth endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session.
///
/// Tokens are backend-issued; the client never mints or mutates them, it
/// only stores what a token grant returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry timestamp in milliseconds since epoch (buffered).
    pub expires_at: u64,
    pub user: User,
}

impl Session {
    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        now_millis() >= self.expires_at
    }
}

/// Response body of the token endpoint (PKCE exchange and refresh grants).
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    pub user: User,
}

impl TokenResponse {
    /// Converts the grant response into a stored session.
    pub fn into_session(self) -> Session {
        let expires_at = now_millis()
            .saturating_add(self.expires_in * 1000)
            .saturating_sub(EXPIRY_BUFFER_MILLIS);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Response body of the signup endpoint.
///
/// When the project auto-confirms, this carries a full token grant; when
/// email confirmation is required it carries only the user record, and the
/// session arrives later through the confirmation deep link.
#[derive(Debug, Deserialize)]
pub struct SignUpResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub user: Option<User>,
}

impl SignUpResponse {
    /// Returns the session when the backend confirmed immediately.
    pub fn into_session(self) -> Option<Session> {
        match (
            self.access_token,
            self.refresh_token,
            self.expires_in,
            self.user,
        ) {
            (Some(access_token), Some(refresh_token), Some(expires_in), Some(user)) => {
                Some(
                    TokenResponse {
                        access_token,
                        refresh_token,
                        expires_in,
                        user,
                    }
                    .into_session(),
                )
            }
            _ => None,
        }
    }
}

/// A shared-expense transaction row.
///
/// Immutable and backend-owned; the client only reads it. Field names match
/// the wire keys directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub group_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub memo: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_deserializes_wire_row() {
        let row = r#"{
            "id": "tx-1",
            "group_id": "trip-2026",
            "user_id": null,
            "amount": 42.5,
            "memo": "groceries",
            "date": "2026-08-01",
            "created_at": "2026-08-01T12:34:56+00:00"
        }"#;

        let tx: Transaction = serde_json::from_str(row).unwrap();
        assert_eq!(tx.id, "tx-1");
        assert_eq!(tx.group_id, "trip-2026");
        assert_eq!(tx.user_id, None);
        assert_eq!(tx.memo.as_deref(), Some("groceries"));
        assert_eq!(tx.date.to_string(), "2026-08-01");
    }

    #[test]
    fn test_signup_response_without_tokens_has_no_session() {
        let body = r#"{"id": "ignored", "user": {"id": "u1", "email": "a@b.com"}}"#;
        let response: SignUpResponse = serde_json::from_str(body).unwrap();
        assert!(response.into_session().is_none());
    }

    #[test]
    fn test_token_response_buffers_expiry() {
        let response = TokenResponse {
            access_token: "at".to_string(),
            refresh_token: "rt".to_string(),
            expires_in: 3600,
            user: User {
                id: "u1".to_string(),
                email: None,
            },
        };

        let before = now_millis();
        let session = response.into_session();
        assert!(!session.is_expired());
        // Buffered five minutes inside the full hour.
        assert!(session.expires_at < before + 3600 * 1000);
        assert!(session.expires_at > before + 3000 * 1000);
    }
}
