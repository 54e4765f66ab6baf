// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for smith-dag crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`actions`] - Action declarations via builder pattern
//! - [`grammar`] - Grammar fakes (call recording, starvation)
//! - [`matrices`] - Canned adjacency matrices
//! - [`scope`] - Declaration scope construction via builder pattern

pub mod actions;
pub mod grammar;
pub mod matrices;
pub mod scope;

// Re-export commonly used items at crate root for convenience
pub use actions::ActionBuilder;
pub use grammar::{RecordingGrammar, StarvedGrammar};
pub use matrices::{chain3, diamond, disconnected, full_chain};
pub use scope::{meta, ScopeBuilder};
