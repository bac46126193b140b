//! TUI runtime - owns the terminal, runs the event loop, executes effects.
//!
//! This is the Elm-runtime boundary: all side effects happen here. The
//! reducer stays pure and produces effects; this module executes them and
//! feeds their results back as events.
//!
//! ## Inbox pattern
//!
//! Spawned tasks send `UiEvent`s directly to `inbox_tx`; the loop drains
//! `inbox_rx` every frame. One channel means one total order of events:
//! session emissions, deep links, and operation results are never
//! reordered relative to each other.

use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use divvy_core::config::Config;
use divvy_core::repository::TransactionRepository;
use divvy_core::session::Auth;
use divvy_core::session::store::SessionStore;
use divvy_core::supabase::SupabaseClient;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Terminal poll timeout; doubles as the spinner tick when idle.
const POLL_DURATION: Duration = Duration::from_millis(100);

/// Runs the TUI until the user quits.
///
/// `deep_link_code` is the confirmation code when the process was activated
/// through the sign-up deep link; it enters the routing core as a one-shot
/// event before the first session emission is processed, which is exactly
/// the cold-start race the router is built to resolve.
///
/// # Errors
/// Returns an error if the backend is unconfigured or the terminal cannot
/// be driven.
pub async fn run(config: &Config, deep_link_code: Option<String>) -> Result<()> {
    let client = Arc::new(SupabaseClient::new(&config.supabase)?);
    let auth = Arc::new(Auth::new(
        Arc::clone(&client),
        SessionStore::at_default_path(),
    ));
    let repository = Arc::new(TransactionRepository::new(Arc::clone(&client), Arc::clone(&auth)));

    terminal::install_panic_hook();
    let term = terminal::setup_terminal().context("Failed to setup terminal")?;

    let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

    // Pump the session signal into the inbox. The subscription replays the
    // latest status immediately, so the reducer always starts from a
    // defined state; the task ends when the inbox closes.
    {
        let status = auth.status().clone();
        let tx = inbox_tx.clone();
        tokio::spawn(async move {
            let mut subscription = status.subscribe();
            while let Some(status) = subscription.recv().await {
                if tx.send(UiEvent::Session(status)).is_err() {
                    break;
                }
            }
        });
    }

    // Resolve the stored session in the background (cold-start restore).
    {
        let auth = Arc::clone(&auth);
        tokio::spawn(async move { auth.restore().await });
    }

    if let Some(code) = deep_link_code {
        info!("activated via sign-up deep link");
        let _ = inbox_tx.send(UiEvent::DeepLink { code });
    }

    let mut runtime = TuiRuntime {
        terminal: term,
        state: AppState::new(config.default_group.clone()),
        inbox_tx,
        inbox_rx,
        auth,
        repository,
    };

    let result = runtime.event_loop();

    let _ = terminal::restore_terminal();
    result
}

struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: AppState,
    inbox_tx: mpsc::UnboundedSender<UiEvent>,
    inbox_rx: mpsc::UnboundedReceiver<UiEvent>,
    auth: Arc<Auth>,
    repository: Arc<TransactionRepository>,
}

impl TuiRuntime {
    fn event_loop(&mut self) -> Result<()> {
        while !self.state.should_quit {
            self.terminal
                .draw(|frame| render::render(&self.state, frame))
                .context("Failed to draw frame")?;

            let mut events = Vec::new();
            if crossterm::event::poll(POLL_DURATION).context("Failed to poll terminal")? {
                events.push(UiEvent::Terminal(
                    crossterm::event::read().context("Failed to read terminal event")?,
                ));
            } else {
                events.push(UiEvent::Tick);
            }
            while let Ok(event) = self.inbox_rx.try_recv() {
                events.push(event);
            }

            for event in events {
                for effect in update::update(&mut self.state, event) {
                    self.execute(effect);
                }
            }
        }
        Ok(())
    }

    /// Executes one effect. Spawned tasks race their operation against the
    /// cancellation token; a cancelled result is discarded silently.
    fn execute(&self, effect: UiEffect) {
        match effect {
            UiEffect::SpawnSignUp {
                email,
                password,
                token,
            } => {
                let auth = Arc::clone(&self.auth);
                let tx = self.inbox_tx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        () = token.cancelled() => {}
                        result = auth.sign_up(&email, &password) => {
                            let _ = tx.send(UiEvent::SignUpFinished {
                                result: result.map_err(|err| format!("{err:#}")),
                            });
                        }
                    }
                });
            }
            UiEffect::SpawnCodeExchange { code, token } => {
                let auth = Arc::clone(&self.auth);
                let tx = self.inbox_tx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        () = token.cancelled() => {}
                        result = auth.exchange_code_for_session(&code) => {
                            let _ = tx.send(UiEvent::ExchangeFinished {
                                result: result.map_err(|err| format!("{err:#}")),
                            });
                        }
                    }
                });
            }
            UiEffect::SpawnTransactionsLoad { group_id, token } => {
                let repository = Arc::clone(&self.repository);
                let tx = self.inbox_tx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        () = token.cancelled() => {}
                        result = repository.list_by_group(group_id.as_deref()) => {
                            let _ = tx.send(UiEvent::TransactionsLoaded {
                                result: result.map_err(|err| format!("{err:#}")),
                            });
                        }
                    }
                });
            }
            UiEffect::CancelTask { kind, token } => {
                debug!(?kind, "cancelling in-flight task");
                if let Some(token) = token {
                    token.cancel();
                }
            }
        }
    }
}
