//! Transaction query facade.
//!
//! A single read operation over the backend table: no cache, no retry,
//! no pagination. Failures are logged and then propagated, since callers must be
//! able to tell a failed query from a genuinely empty group.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, error};

use crate::session::Auth;
use crate::supabase::SupabaseClient;
use crate::supabase::types::Transaction;

pub struct TransactionRepository {
    client: Arc<SupabaseClient>,
    auth: Arc<Auth>,
}

impl TransactionRepository {
    pub fn new(client: Arc<SupabaseClient>, auth: Arc<Auth>) -> Self {
        Self { client, auth }
    }

    /// Lists transactions, newest date first.
    ///
    /// `group_id` filters server-side; `None` queries across all groups
    /// visible to the caller. Authenticated requests carry the user's
    /// access token so row policies apply to the right user.
    ///
    /// # Errors
    /// Returns the backend's message on failure.
    pub async fn list_by_group(&self, group_id: Option<&str>) -> Result<Vec<Transaction>> {
        let token = self.auth.access_token();
        debug!(group = group_id.unwrap_or("<all>"), "querying transactions");

        match self.client.list_transactions(group_id, token.as_deref()).await {
            Ok(rows) => {
                debug!(count = rows.len(), "transactions query succeeded");
                Ok(rows)
            }
            Err(err) => {
                error!("transactions query failed: {err:#}");
                Err(err)
            }
        }
    }
}
