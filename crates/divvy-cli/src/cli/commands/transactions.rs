//! Headless transactions query.

use std::sync::Arc;

use anyhow::{Result, bail};
use divvy_core::config::Config;
use divvy_core::repository::TransactionRepository;
use divvy_core::session::store::SessionStore;
use divvy_core::session::{Auth, SessionStatus};
use divvy_core::supabase::SupabaseClient;

pub async fn run(config: &Config, group: Option<&str>) -> Result<()> {
    let client = Arc::new(SupabaseClient::new(&config.supabase)?);
    let auth = Arc::new(Auth::new(
        Arc::clone(&client),
        SessionStore::at_default_path(),
    ));

    auth.restore().await;
    if !matches!(auth.status().get(), SessionStatus::Authenticated(_)) {
        bail!("Not signed in. Launch `divvy` to create an account first.");
    }

    let group = group.or(config.default_group.as_deref());
    let repository = TransactionRepository::new(client, auth);
    let transactions = repository.list_by_group(group).await?;

    if transactions.is_empty() {
        println!("No transactions found.");
    } else {
        for tx in transactions {
            println!(
                "{}  {:>10.2}  {}  {}",
                tx.date,
                tx.amount,
                tx.memo.as_deref().unwrap_or("-"),
                tx.group_id
            );
        }
    }
    Ok(())
}
