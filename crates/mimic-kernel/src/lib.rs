//! Mimic Kernel — the contract deterministic completion stand-ins implement.
//!
//! This crate owns the type vocabulary (messages, results, usage counters,
//! model descriptors) and the [`llm::ChatCompletionClient`] trait. It contains
//! no implementation: concrete clients live in sibling crates such as
//! `mimic-replay`.

// llm module (completion contract)
pub mod llm;
