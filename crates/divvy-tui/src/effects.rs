//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They represent I/O and task spawning only (no direct UI mutations).
//!
//! This keeps the reducer pure: it only mutates state and returns effects,
//! never performs I/O or spawns tasks directly.
//!
//! Cancellation follows the same split: the reducer decides when a screen's
//! in-flight work dies and emits `CancelTask`; the runtime calls
//! `token.cancel()`. A cancelled operation's result is discarded silently.

use tokio_util::sync::CancellationToken;

use crate::state::TaskKind;

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug)]
pub enum UiEffect {
    /// Spawn the sign-up request for the entered credentials.
    SpawnSignUp {
        email: String,
        password: String,
        token: CancellationToken,
    },

    /// Spawn the confirmation code exchange.
    SpawnCodeExchange {
        code: String,
        token: CancellationToken,
    },

    /// Spawn the transactions query.
    SpawnTransactionsLoad {
        group_id: Option<String>,
        token: CancellationToken,
    },

    /// Cancel an in-flight task.
    CancelTask {
        kind: TaskKind,
        token: Option<CancellationToken>,
    },
}
