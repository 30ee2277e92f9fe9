//! Replay completion client.
//!
//! [`ReplayClient`] implements [`mimic_kernel::llm::ChatCompletionClient`]
//! and is the canonical deterministic stand-in for a real completion
//! service: it replays a pre-supplied ordered list of canned responses,
//! one per request, and keeps synthetic token-usage counters as it goes.
//!
//! # Design goals
//!
//! | Goal | Mechanism |
//! |------|-----------|
//! | Deterministic | Responses fixed at construction; cursor advances one per request |
//! | Observable | `actual_usage()`, `total_usage()`, `create_calls()`, … |
//! | Rewindable | `reset()` rewinds the cursor and zeroes the counters |
//! | Thread-safe | Internal state protected by `Arc<Mutex<…>>` |
//! | Explicit exhaustion | Typed `LLMError::ResponsesExhausted` after the last entry |
//!
//! "Tokenization" is whitespace splitting: good enough for tests that only
//! assert on counts, and it doubles as the fragmenter for the streaming path.
//!
//! # Example
//!
//! ```rust,ignore
//! use mimic_kernel::llm::{ChatCompletionClient, CreateRequest};
//! use mimic_replay::ReplayClient;
//!
//! let client = ReplayClient::new(vec!["Hello there".into(), "Bye".into()]);
//!
//! let request = CreateRequest::new().user("What can you do?");
//! let response = client.create(request).await?;
//! assert_eq!(response.content, "Hello there");
//! assert_eq!(response.usage.completion_tokens, 2);
//! ```

mod client;
mod config;

pub use client::{ReplayClient, ReplayResponse};
pub use config::ReplayClientConfig;
