//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.
//!
//! Route transitions are driven exclusively by the router's output: the
//! reducer feeds it session emissions, deep links, and explicit navigation,
//! and turns each *distinct* route change into enter/leave effects exactly
//! once. Leaving a screen resets its state (discarding credentials) and
//! cancels its in-flight operation.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use divvy_core::routing::RouteState;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, ConfirmationState, ExpensesState, SignUpState, TaskKind};

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::Session(status) => {
            let previous = app.router.current().clone();
            match app.router.on_session_status(status) {
                Some(next) => transition(app, &previous, &next),
                None => vec![],
            }
        }
        UiEvent::DeepLink { code } => {
            let previous = app.router.current().clone();
            match app.router.on_deep_link(code) {
                Some(next) => transition(app, &previous, &next),
                None => vec![],
            }
        }
        UiEvent::SignUpFinished { result } => {
            app.tasks.finish(TaskKind::SignUp);
            app.sign_up.is_loading = false;
            match result {
                Ok(()) => {
                    app.sign_up.error = None;
                    app.sign_up.notice =
                        Some("Confirmation mail sent. Open the link to finish.".to_string());
                }
                Err(message) => {
                    app.sign_up.notice = None;
                    app.sign_up.error = Some(message);
                }
            }
            vec![]
        }
        UiEvent::ExchangeFinished { result } => {
            app.tasks.finish(TaskKind::CodeExchange);
            // Success needs no action here: the session signal emits
            // Authenticated and the router takes it from there.
            if let Err(message) = result {
                app.confirmation.error = Some(message);
            }
            vec![]
        }
        UiEvent::TransactionsLoaded { result } => {
            app.tasks.finish(TaskKind::TransactionsLoad);
            app.expenses.is_loading = false;
            match result {
                Ok(rows) => {
                    app.expenses.rows = rows;
                    app.expenses.error = None;
                }
                Err(message) => app.expenses.error = Some(message),
            }
            vec![]
        }
    }
}

/// Enter/leave handling for one route change.
fn transition(app: &mut AppState, previous: &RouteState, next: &RouteState) -> Vec<UiEffect> {
    let mut effects = leave_effects(app, previous);
    effects.extend(enter_effects(app, next));
    effects
}

/// Tears down the screen being left: reset its state, cancel its task.
fn leave_effects(app: &mut AppState, previous: &RouteState) -> Vec<UiEffect> {
    let kind = match previous {
        RouteState::Undetermined => return vec![],
        RouteState::SignUp => {
            app.sign_up = SignUpState::default();
            TaskKind::SignUp
        }
        RouteState::WaitingForConfirmation { .. } => {
            app.confirmation = ConfirmationState::default();
            TaskKind::CodeExchange
        }
        RouteState::ExpenseList => {
            app.expenses = ExpensesState::default();
            TaskKind::TransactionsLoad
        }
    };

    match app.tasks.take(kind) {
        Some(token) => vec![UiEffect::CancelTask {
            kind,
            token: Some(token),
        }],
        None => vec![],
    }
}

/// Kicks off the entered screen's work.
fn enter_effects(app: &mut AppState, next: &RouteState) -> Vec<UiEffect> {
    match next {
        RouteState::Undetermined | RouteState::SignUp => vec![],
        RouteState::WaitingForConfirmation { code } => {
            // One exchange per received code. The guard survives repeated
            // identical derivations; a different code is a different route
            // and goes through leave/enter again.
            if app.confirmation.exchange_started {
                return vec![];
            }
            app.confirmation.exchange_started = true;
            let token = app.tasks.start(TaskKind::CodeExchange);
            vec![UiEffect::SpawnCodeExchange {
                code: code.clone(),
                token,
            }]
        }
        RouteState::ExpenseList => {
            app.expenses.is_loading = true;
            let token = app.tasks.start(TaskKind::TransactionsLoad);
            vec![UiEffect::SpawnTransactionsLoad {
                group_id: app.default_group.clone(),
                token,
            }]
        }
    }
}

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    let Event::Key(key) = event else {
        return vec![];
    };
    if key.kind != KeyEventKind::Press {
        return vec![];
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return vec![];
    }

    match app.router.current().clone() {
        RouteState::Undetermined => vec![],
        RouteState::SignUp => handle_sign_up_key(app, key),
        RouteState::WaitingForConfirmation { .. } => handle_confirmation_key(app, key),
        RouteState::ExpenseList => handle_expenses_key(app, key),
    }
}

fn handle_sign_up_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        KeyCode::Esc => {
            app.should_quit = true;
            vec![]
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.sign_up.toggle_focus();
            vec![]
        }
        KeyCode::Enter => submit_sign_up(app),
        KeyCode::Backspace => {
            app.sign_up.focused_field_mut().pop();
            vec![]
        }
        KeyCode::Char(c) => {
            app.sign_up.focused_field_mut().push(c);
            vec![]
        }
        _ => vec![],
    }
}

/// The sign-up submit one-shot: fires at most one request at a time.
fn submit_sign_up(app: &mut AppState) -> Vec<UiEffect> {
    if app.sign_up.is_loading {
        return vec![];
    }
    if app.sign_up.email.trim().is_empty() || app.sign_up.password.is_empty() {
        app.sign_up.error = Some("Email and password are required.".to_string());
        return vec![];
    }

    app.sign_up.is_loading = true;
    app.sign_up.error = None;
    app.sign_up.notice = None;
    let token = app.tasks.start(TaskKind::SignUp);
    vec![UiEffect::SpawnSignUp {
        email: app.sign_up.email.clone(),
        password: app.sign_up.password.clone(),
        token,
    }]
}

fn handle_confirmation_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        // Abandon the confirmation (typically after a failed exchange).
        // Explicit navigation: the router retires the pending code so the
        // spent code cannot re-trigger.
        KeyCode::Esc => {
            let previous = app.router.current().clone();
            match app.router.navigate(RouteState::SignUp) {
                Some(next) => transition(app, &previous, &next),
                None => vec![],
            }
        }
        _ => vec![],
    }
}

fn handle_expenses_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
            vec![]
        }
        KeyCode::Char('r') => {
            if app.expenses.is_loading {
                return vec![];
            }
            app.expenses.is_loading = true;
            app.expenses.error = None;
            let token = app.tasks.start(TaskKind::TransactionsLoad);
            vec![UiEffect::SpawnTransactionsLoad {
                group_id: app.default_group.clone(),
                token,
            }]
        }
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use divvy_core::session::SessionStatus;
    use divvy_core::supabase::types::{Session, Transaction, User};

    use super::*;
    use crate::state::SignUpField;

    fn session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: u64::MAX,
            user: User {
                id: "u1".to_string(),
                email: None,
            },
        }
    }

    fn key(code: KeyCode) -> UiEvent {
        UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            update(app, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_cold_start_authenticated_loads_expenses() {
        let mut app = AppState::new(Some("trip-2026".to_string()));

        let effects = update(&mut app, UiEvent::Session(SessionStatus::Authenticated(session())));

        assert_eq!(app.router.current(), &RouteState::ExpenseList);
        assert!(app.expenses.is_loading);
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::SpawnTransactionsLoad { group_id: Some(g), .. }] if g == "trip-2026"
        ));
    }

    #[test]
    fn test_duplicate_session_emission_is_inert() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::Authenticated(session())));

        let effects = update(&mut app, UiEvent::Session(SessionStatus::Authenticated(session())));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_transitional_status_produces_no_navigation() {
        let mut app = AppState::new(None);
        let effects = update(&mut app, UiEvent::Session(SessionStatus::Initializing));
        assert!(effects.is_empty());
        assert_eq!(app.router.current(), &RouteState::Undetermined);
    }

    #[test]
    fn test_sign_up_failure_keeps_inputs_editable() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::NotAuthenticated));

        type_text(&mut app, "a@b.com");
        update(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "pw");
        let effects = update(&mut app, key(KeyCode::Enter));

        assert!(app.sign_up.is_loading);
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::SpawnSignUp { email, password, .. }] if email == "a@b.com" && password == "pw"
        ));

        update(
            &mut app,
            UiEvent::SignUpFinished {
                result: Err("email taken".to_string()),
            },
        );

        assert!(!app.sign_up.is_loading);
        assert_eq!(app.sign_up.error.as_deref(), Some("email taken"));
        assert_eq!(app.sign_up.email, "a@b.com");
        assert_eq!(app.sign_up.password, "pw");
    }

    #[test]
    fn test_submit_requires_both_fields() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::NotAuthenticated));

        let effects = update(&mut app, key(KeyCode::Enter));
        assert!(effects.is_empty());
        assert!(!app.sign_up.is_loading);
        assert_eq!(
            app.sign_up.error.as_deref(),
            Some("Email and password are required.")
        );
    }

    #[test]
    fn test_submit_is_one_shot_while_in_flight() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::NotAuthenticated));
        type_text(&mut app, "a@b.com");
        update(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "pw");

        let first = update(&mut app, key(KeyCode::Enter));
        let second = update(&mut app, key(KeyCode::Enter));
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
    }

    #[test]
    fn test_deep_link_fires_exchange_exactly_once() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::NotAuthenticated));

        let effects = update(
            &mut app,
            UiEvent::DeepLink {
                code: "abc123".to_string(),
            },
        );
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::SpawnCodeExchange { code, .. }] if code == "abc123"
        ));
        assert!(app.confirmation.exchange_started);

        // The same code delivered again is the same route: no new exchange.
        let again = update(
            &mut app,
            UiEvent::DeepLink {
                code: "abc123".to_string(),
            },
        );
        assert!(again.is_empty());
    }

    #[test]
    fn test_deep_link_ignored_when_authenticated() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::Authenticated(session())));

        let effects = update(
            &mut app,
            UiEvent::DeepLink {
                code: "abc123".to_string(),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(app.router.current(), &RouteState::ExpenseList);
    }

    #[test]
    fn test_confirmation_success_path_reaches_expenses() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::NotAuthenticated));
        update(
            &mut app,
            UiEvent::DeepLink {
                code: "abc123".to_string(),
            },
        );

        update(&mut app, UiEvent::ExchangeFinished { result: Ok(()) });
        assert!(app.confirmation.error.is_none());

        let effects = update(&mut app, UiEvent::Session(SessionStatus::Authenticated(session())));
        assert_eq!(app.router.current(), &RouteState::ExpenseList);
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::SpawnTransactionsLoad { .. }]
        ));
    }

    #[test]
    fn test_exchange_failure_is_recoverable() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::NotAuthenticated));
        update(
            &mut app,
            UiEvent::DeepLink {
                code: "abc123".to_string(),
            },
        );

        update(
            &mut app,
            UiEvent::ExchangeFinished {
                result: Err("code expired".to_string()),
            },
        );
        assert_eq!(app.confirmation.error.as_deref(), Some("code expired"));

        // Esc abandons the confirmation and lands back on sign-up.
        let effects = update(&mut app, key(KeyCode::Esc));
        assert_eq!(app.router.current(), &RouteState::SignUp);
        assert!(effects.is_empty());
        assert!(!app.confirmation.exchange_started);
    }

    #[test]
    fn test_leaving_expenses_cancels_inflight_load() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::Authenticated(session())));
        assert!(app.tasks.is_running(TaskKind::TransactionsLoad));

        // Session drops (e.g. revoked server-side) while the load runs.
        let effects = update(&mut app, UiEvent::Session(SessionStatus::NotAuthenticated));
        assert_eq!(app.router.current(), &RouteState::SignUp);
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::CancelTask {
                kind: TaskKind::TransactionsLoad,
                token: Some(_),
            }]
        ));
        assert!(!app.tasks.is_running(TaskKind::TransactionsLoad));
    }

    #[test]
    fn test_query_error_is_distinct_from_empty() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::Authenticated(session())));

        update(
            &mut app,
            UiEvent::TransactionsLoaded {
                result: Err("permission denied".to_string()),
            },
        );
        assert!(!app.expenses.is_loading);
        assert!(app.expenses.rows.is_empty());
        assert_eq!(app.expenses.error.as_deref(), Some("permission denied"));

        // A successful reload clears the error.
        update(&mut app, key(KeyCode::Char('r')));
        update(
            &mut app,
            UiEvent::TransactionsLoaded {
                result: Ok(vec![sample_transaction()]),
            },
        );
        assert!(app.expenses.error.is_none());
        assert_eq!(app.expenses.rows.len(), 1);
    }

    #[test]
    fn test_reload_key_is_inert_while_loading() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::Authenticated(session())));
        assert!(app.expenses.is_loading);

        let effects = update(&mut app, key(KeyCode::Char('r')));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_credentials_are_discarded_with_the_screen() {
        let mut app = AppState::new(None);
        update(&mut app, UiEvent::Session(SessionStatus::NotAuthenticated));
        type_text(&mut app, "a@b.com");
        update(&mut app, key(KeyCode::Tab));
        type_text(&mut app, "secret");

        // Instant sign-in path: authenticated directly from sign-up.
        update(&mut app, UiEvent::Session(SessionStatus::Authenticated(session())));
        assert_eq!(app.router.current(), &RouteState::ExpenseList);
        assert!(app.sign_up.email.is_empty());
        assert!(app.sign_up.password.is_empty());
        assert_eq!(app.sign_up.focus, SignUpField::Email);
    }

    #[test]
    fn test_ctrl_c_quits_everywhere() {
        let mut app = AppState::new(None);
        update(
            &mut app,
            UiEvent::Terminal(Event::Key(KeyEvent::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
            ))),
        );
        assert!(app.should_quit);
    }

    fn sample_transaction() -> Transaction {
        serde_json::from_str(
            r#"{
                "id": "tx-1",
                "group_id": "g1",
                "user_id": "u1",
                "amount": 12.0,
                "memo": "coffee",
                "date": "2026-08-01",
                "created_at": "2026-08-01T10:00:00+00:00"
            }"#,
        )
        .unwrap()
    }
}
