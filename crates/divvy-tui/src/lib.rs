//! Full-screen TUI for divvy.
//!
//! Elm-shaped: `state` holds all UI state, `update` is the pure reducer,
//! `effects` are the commands the reducer returns, and `runtime` executes
//! them and feeds results back through one ordered inbox.

pub mod effects;
pub mod events;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

pub use runtime::run;
