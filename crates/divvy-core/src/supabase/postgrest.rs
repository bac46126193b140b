//! PostgREST table query for the transactions list.

use anyhow::{Context, Result, bail};

use super::types::Transaction;
use super::{SupabaseClient, decode_json, error_message};

const TRANSACTIONS_TABLE: &str = "transactions";

impl SupabaseClient {
    /// Fetches transactions, newest date first.
    ///
    /// One round-trip, no pagination. `group_id` narrows the query to one
    /// group; `None` queries everything the row policy lets the caller see.
    /// `access_token` authenticates the row policy; without one the anon
    /// key is presented instead.
    ///
    /// # Errors
    /// Returns the backend's message on a non-success response.
    pub async fn list_transactions(
        &self,
        group_id: Option<&str>,
        access_token: Option<&str>,
    ) -> Result<Vec<Transaction>> {
        let mut query = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "date.desc".to_string()),
        ];
        if let Some(group_id) = group_id {
            query.push(("group_id".to_string(), format!("eq.{group_id}")));
        }

        let bearer = access_token.unwrap_or_else(|| self.anon_key());
        let response = self
            .http()
            .get(self.rest_url(TRANSACTIONS_TABLE))
            .query(&query)
            .header("apikey", self.anon_key())
            .header("Authorization", format!("Bearer {bearer}"))
            .send()
            .await
            .context("Failed to send transactions query")?;

        if !response.status().is_success() {
            bail!("{}", error_message(response).await);
        }

        decode_json(response).await
    }
}
