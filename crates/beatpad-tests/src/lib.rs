//! BeatPad End-to-End Test Infrastructure
//!
//! This crate provides integration tests for the blend engine and the CLI:
//!
//! - **Concurrency**: out-of-order model completions driven by a scripted model
//! - **Geometry**: property tests for weights, cells and path sampling
//! - **Determinism**: the same inputs always decode to the same pattern
//! - **CLI / serve**: the `beatpad` binary and its WebSocket session server
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p beatpad-tests
//! ```
//!
//! ## Scripted Model
//!
//! [`scripted::ScriptedModel`] parks every model call until the test answers
//! it, so races between stale and fresh requests are reproduced exactly:
//!
//! ```rust,ignore
//! let model = ScriptedModel::loaded();
//! let engine = fixtures::engine_with(model.clone());
//! let first = tokio::task::spawn_local(blend(engine.clone(), p1));
//! let second = tokio::task::spawn_local(blend(engine.clone(), p2));
//! settle().await;
//! let [old, new] = model.take_decodes().try_into().unwrap();
//! new.succeed();
//! old.succeed();
//! ```

pub mod determinism;
pub mod fixtures;
pub mod harness;
pub mod scripted;

// Re-export commonly used items
pub use determinism::{assert_deterministic, verify_determinism, DeterminismResult, PatternDiff};
pub use fixtures::{corner_patterns, corner_set, engine_with, fill_corners, InputFixture};
pub use harness::{CliResult, TestHarness};
pub use scripted::{settle, ScriptedModel};
