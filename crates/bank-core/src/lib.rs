//! Core of the bank account client.
//!
//! This module ties the wallet and the contract channels to the account
//! session. The [`session`] state machine decides what happens, the
//! [`engine`] executes it on a single task and the [`builder`] assembles both
//! from configuration.

pub mod builder;
pub mod engine;
pub mod session;

pub use builder::{BuilderError, SessionBuilder, SessionFactories};
pub use engine::{Channels, EngineError, SessionCommand, SessionEngine, SessionHandle};
pub use session::{AccountSession, Effect, SessionSettings};
