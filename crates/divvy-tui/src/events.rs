//! UI event types.
//!
//! Everything the reducer reacts to arrives as one of these, in arrival
//! order, through a single inbox. Session emissions are durable state
//! snapshots; the deep link and the operation results are one-shot events,
//! consumed by exactly one reducer pass and never redelivered.

use divvy_core::session::SessionStatus;
use divvy_core::supabase::types::Transaction;

/// Events consumed by the reducer.
#[derive(Debug)]
pub enum UiEvent {
    /// Frame pulse (spinner animation).
    Tick,

    /// Raw terminal input.
    Terminal(crossterm::event::Event),

    /// The session signal emitted a new status.
    Session(SessionStatus),

    /// The OS delivered a confirmation deep link.
    DeepLink { code: String },

    /// Sign-up request finished.
    SignUpFinished { result: Result<(), String> },

    /// Confirmation code exchange finished.
    ExchangeFinished { result: Result<(), String> },

    /// Transactions query finished.
    TransactionsLoaded { result: Result<Vec<Transaction>, String> },
}
