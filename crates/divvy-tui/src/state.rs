//! Application state composition.
//!
//! All UI state lives here; the reducer in `update` is the only place it
//! mutates. Screen states are replaced wholesale when their route is left,
//! which is also what discards entered credentials.

use divvy_core::routing::Router;
use divvy_core::supabase::types::Transaction;
use tokio_util::sync::CancellationToken;

/// Combined application state for the TUI.
pub struct AppState {
    /// Navigation state machine (route derived from the session signal).
    pub router: Router,
    pub sign_up: SignUpState,
    pub confirmation: ConfirmationState,
    pub expenses: ExpensesState,
    /// Cancellation tokens for in-flight per-screen operations.
    pub tasks: Tasks,
    /// Group the expense list queries; `None` queries all visible groups.
    pub default_group: Option<String>,
    pub spinner_frame: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(default_group: Option<String>) -> Self {
        Self {
            router: Router::new(),
            sign_up: SignUpState::default(),
            confirmation: ConfirmationState::default(),
            expenses: ExpensesState::default(),
            tasks: Tasks::default(),
            default_group,
            spinner_frame: 0,
            should_quit: false,
        }
    }
}

/// Which sign-up input currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignUpField {
    #[default]
    Email,
    Password,
}

/// Sign-up screen state.
///
/// The credentials live only here and die with the screen.
#[derive(Debug, Default)]
pub struct SignUpState {
    pub email: String,
    pub password: String,
    pub focus: SignUpField,
    pub is_loading: bool,
    pub error: Option<String>,
    /// Post-submit hint ("check your mail").
    pub notice: Option<String>,
}

impl SignUpState {
    pub fn focused_field_mut(&mut self) -> &mut String {
        match self.focus {
            SignUpField::Email => &mut self.email,
            SignUpField::Password => &mut self.password,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            SignUpField::Email => SignUpField::Password,
            SignUpField::Password => SignUpField::Email,
        };
    }
}

/// Confirmation screen state.
#[derive(Debug, Default)]
pub struct ConfirmationState {
    /// Guards the one-shot exchange: set when the request is fired so a
    /// redelivered route snapshot cannot fire it again.
    pub exchange_started: bool,
    pub error: Option<String>,
}

/// Expense list screen state.
#[derive(Debug, Default)]
pub struct ExpensesState {
    pub is_loading: bool,
    pub rows: Vec<Transaction>,
    /// Query failure, rendered distinctly from an empty list.
    pub error: Option<String>,
}

/// Kinds of cancellable background work, one slot each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    SignUp,
    CodeExchange,
    TransactionsLoad,
}

/// Cancellation-token registry for in-flight operations.
///
/// One slot per kind: a screen never runs two instances of its operation
/// concurrently.
#[derive(Debug, Default)]
pub struct Tasks {
    sign_up: Option<CancellationToken>,
    code_exchange: Option<CancellationToken>,
    transactions_load: Option<CancellationToken>,
}

impl Tasks {
    fn slot(&mut self, kind: TaskKind) -> &mut Option<CancellationToken> {
        match kind {
            TaskKind::SignUp => &mut self.sign_up,
            TaskKind::CodeExchange => &mut self.code_exchange,
            TaskKind::TransactionsLoad => &mut self.transactions_load,
        }
    }

    /// Registers a new token for `kind`, returning the clone to hand to
    /// the spawned task.
    pub fn start(&mut self, kind: TaskKind) -> CancellationToken {
        let token = CancellationToken::new();
        *self.slot(kind) = Some(token.clone());
        token
    }

    /// Removes and returns the token for `kind` (for cancellation).
    pub fn take(&mut self, kind: TaskKind) -> Option<CancellationToken> {
        self.slot(kind).take()
    }

    /// Drops the token when the task reported its result.
    pub fn finish(&mut self, kind: TaskKind) {
        *self.slot(kind) = None;
    }

    pub fn is_running(&self, kind: TaskKind) -> bool {
        match kind {
            TaskKind::SignUp => self.sign_up.is_some(),
            TaskKind::CodeExchange => self.code_exchange.is_some(),
            TaskKind::TransactionsLoad => self.transactions_load.is_some(),
        }
    }
}
