//! Deterministic replay implementation of the Mimic completion contract.
//!
//! [`ReplayClient`] serves a fixed, ordered list of canned responses instead
//! of calling a real model. See the [`replay`] module for the full story.

// replay module (canned-response client)
pub mod replay;

pub use replay::{ReplayClient, ReplayClientConfig, ReplayResponse};
