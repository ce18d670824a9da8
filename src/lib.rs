//! # Exercise Harness
//!
//! Sandboxed checking of learner-submitted Python code for interactive
//! programming exercises.
//!
//! A submission moves through four stages:
//!
//! 1. **Runtime loading**: a RustPython interpreter compiled to WebAssembly
//!    is loaded lazily, exactly once per process, and shared by every run.
//! 2. **Safety filtering**: a static deny-list scan rejects obviously
//!    dangerous source (dynamic evaluation, file access, OS interaction,
//!    denylisted imports) before it reaches the interpreter.
//! 3. **Execution & capture**: the submission runs first, then each of the
//!    exercise's test cases, all in one shared namespace, with stdout
//!    captured into a per-run buffer and per-test outcomes aggregated into a
//!    structured result.
//! 4. **Presentation**: the result is rendered into an injection-safe HTML
//!    view with remediation hints matched to what went wrong.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wasm_exercise_harness::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = ExerciseSession::new(HarnessConfig::default());
//!
//!     let tests = vec![TestCase::new("assert add(2, 3) == 5", "adds two numbers")];
//!     let result = session
//!         .submit("def add(a, b):\n    return a + b", &tests)
//!         .await?;
//!
//!     assert!(result.is_success());
//!     assert_eq!(result.tests_passed, 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Security Model
//!
//! Defense in depth, with the isolation boundary below the filter:
//!
//! 1. **WebAssembly sandboxing**: submissions run in Wasm with no direct
//!    host access, no preopened directories, no network.
//! 2. **Static safety filter**: a UX guardrail that keeps obviously hostile
//!    submissions out early with an actionable message. It is lexical and
//!    incomplete on purpose; it is not the security boundary.
//! 3. **Resource limits**: wall-clock deadline with epoch interruption,
//!    memory cap, optional fuel cap, bounded output capture.

pub mod error;
pub mod harness;
pub mod prelude;

// Re-export main types at crate root for convenience
pub use error::{HarnessError, Result};
pub use harness::config::{HarnessConfig, HarnessConfigBuilder, NamespaceMode};
pub use harness::executor::{CodeRunner, ExecutionResult, ExerciseRunner, TestCase, TestOutcome};
pub use harness::loader::{RuntimeHandle, RuntimeLoader};
pub use harness::report::{present, present_failure, RenderedView, ViewStatus};
pub use harness::safety::{check_safety, SafetyVerdict};
pub use harness::session::ExerciseSession;
