//! Prelude module for convenient imports.

pub use crate::error::{HarnessError, Result};
pub use crate::harness::{
    config::{HarnessConfig, NamespaceMode},
    executor::{ExecutionResult, ExerciseRunner, TestCase},
    report::{present, present_failure, RenderedView},
    session::ExerciseSession,
};
