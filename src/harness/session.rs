//! Submission entry point tying the pipeline together.

use tokio::sync::Mutex;

use crate::error::{HarnessError, Result};
use crate::harness::config::{HarnessConfig, NamespaceMode};
use crate::harness::executor::{CodeRunner, ExecutionResult, ExerciseRunner, TestCase};
use crate::harness::report::{self, RenderedView};
use crate::harness::safety;

/// Checks learner submissions against exercise test cases.
///
/// The pipeline per submission: empty check, static safety filter, then the
/// execution engine. The engine is only ever reached by non-empty
/// submissions the filter accepted. One session corresponds to one learner
/// working through exercises on one page; run-at-a-time discipline is the
/// caller's job (the original UI disables its trigger control while a run is
/// in flight).
pub struct ExerciseSession<R = ExerciseRunner> {
    runner: R,
    namespace: NamespaceMode,
    accepted: Mutex<Vec<String>>,
}

impl ExerciseSession<ExerciseRunner> {
    /// Create a session backed by the shared Wasm interpreter.
    pub fn new(config: HarnessConfig) -> Self {
        let namespace = config.namespace;
        Self {
            runner: ExerciseRunner::new(config),
            namespace,
            accepted: Mutex::new(Vec::new()),
        }
    }
}

impl<R: CodeRunner> ExerciseSession<R> {
    /// Build a session around a custom runner.
    pub fn with_runner(runner: R, namespace: NamespaceMode) -> Self {
        Self {
            runner,
            namespace,
            accepted: Mutex::new(Vec::new()),
        }
    }

    /// Check one submission against its exercise's test cases.
    pub async fn submit(&self, user_code: &str, tests: &[TestCase]) -> Result<ExecutionResult> {
        if user_code.trim().is_empty() {
            tracing::debug!("rejecting empty submission");
            return Err(HarnessError::EmptySubmission);
        }

        let verdict = safety::check_safety(user_code);
        if !verdict.safe {
            tracing::debug!(reason = %verdict.reason, "submission rejected by safety filter");
            return Err(HarnessError::UnsafeSubmission {
                construct: verdict.reason,
            });
        }

        let prelude = match self.namespace {
            NamespaceMode::Isolated => None,
            NamespaceMode::Persistent => {
                let accepted = self.accepted.lock().await;
                if accepted.is_empty() {
                    None
                } else {
                    Some(accepted.join("\n\n"))
                }
            }
        };

        let result = self.runner.run(user_code, tests, prelude.as_deref()).await?;

        // Only code that ran cleanly becomes part of the session namespace;
        // a submission that raised would poison every later run.
        if self.namespace == NamespaceMode::Persistent && result.error.is_none() {
            self.accepted.lock().await.push(user_code.to_string());
        }

        Ok(result)
    }

    /// Run the full pipeline and render the outcome, whatever it was.
    pub async fn submit_rendered(&self, user_code: &str, tests: &[TestCase]) -> RenderedView {
        match self.submit(user_code, tests).await {
            Ok(result) => report::present(&result),
            Err(error) => report::present_failure(&error),
        }
    }

    /// Forget definitions accumulated by earlier accepted submissions.
    pub async fn reset_namespace(&self) {
        self.accepted.lock().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Runner that records invocations instead of executing anything.
    #[derive(Default)]
    struct SpyRunner {
        calls: AtomicUsize,
        preludes: StdMutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl CodeRunner for SpyRunner {
        async fn run(
            &self,
            _user_code: &str,
            tests: &[TestCase],
            session_prelude: Option<&str>,
        ) -> Result<ExecutionResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.preludes
                .lock()
                .unwrap()
                .push(session_prelude.map(str::to_string));
            Ok(ExecutionResult {
                success: true,
                tests_passed: tests.len(),
                total_tests: tests.len(),
                details: Vec::new(),
                error: None,
                stdout: String::new(),
            })
        }
    }

    /// Runner whose submissions always raise.
    struct FailingRunner;

    #[async_trait]
    impl CodeRunner for FailingRunner {
        async fn run(
            &self,
            _user_code: &str,
            _tests: &[TestCase],
            _session_prelude: Option<&str>,
        ) -> Result<ExecutionResult> {
            Ok(ExecutionResult {
                success: false,
                tests_passed: 0,
                total_tests: 0,
                details: Vec::new(),
                error: Some("NameError: name 'x' is not defined".to_string()),
                stdout: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_empty_submission_never_reaches_the_runner() {
        let session = ExerciseSession::with_runner(SpyRunner::default(), NamespaceMode::Isolated);

        let err = session.submit("   \n\t", &[]).await.unwrap_err();
        assert!(err.is_empty_submission());
        assert_eq!(session.runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unsafe_submission_never_reaches_the_runner() {
        let session = ExerciseSession::with_runner(SpyRunner::default(), NamespaceMode::Isolated);

        let err = session.submit("import os", &[]).await.unwrap_err();
        match err {
            HarnessError::UnsafeSubmission { construct } => assert!(construct.contains("os")),
            other => panic!("expected UnsafeSubmission, got {other:?}"),
        }
        assert_eq!(session.runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_accepted_submission_reaches_the_runner_once() {
        let session = ExerciseSession::with_runner(SpyRunner::default(), NamespaceMode::Isolated);

        let result = session
            .submit("def add(a, b):\n    return a + b", &[])
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(session.runner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_isolated_sessions_never_pass_a_prelude() {
        let session = ExerciseSession::with_runner(SpyRunner::default(), NamespaceMode::Isolated);

        session.submit("x = 1", &[]).await.unwrap();
        session.submit("y = x + 1", &[]).await.unwrap();

        let preludes = session.runner.preludes.lock().unwrap();
        assert_eq!(preludes.as_slice(), &[None, None]);
    }

    #[tokio::test]
    async fn test_persistent_sessions_replay_accepted_code() {
        let session = ExerciseSession::with_runner(SpyRunner::default(), NamespaceMode::Persistent);

        session.submit("x = 1", &[]).await.unwrap();
        session.submit("y = x + 1", &[]).await.unwrap();

        let preludes = session.runner.preludes.lock().unwrap();
        assert_eq!(preludes[0], None);
        assert_eq!(preludes[1].as_deref(), Some("x = 1"));
    }

    #[tokio::test]
    async fn test_failed_submissions_stay_out_of_the_namespace() {
        let session = ExerciseSession::with_runner(FailingRunner, NamespaceMode::Persistent);

        let result = session.submit("x = 1/0", &[]).await.unwrap();
        assert!(result.error.is_some());
        assert!(session.accepted.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_reset_namespace_forgets_history() {
        let session = ExerciseSession::with_runner(SpyRunner::default(), NamespaceMode::Persistent);

        session.submit("x = 1", &[]).await.unwrap();
        session.reset_namespace().await;
        session.submit("y = 2", &[]).await.unwrap();

        let preludes = session.runner.preludes.lock().unwrap();
        assert_eq!(preludes[1], None);
    }

    #[tokio::test]
    async fn test_submit_rendered_covers_every_path() {
        let session = ExerciseSession::with_runner(SpyRunner::default(), NamespaceMode::Isolated);

        let empty = session.submit_rendered("", &[]).await;
        assert!(empty.html.contains("Nothing to run"));

        let unsafe_view = session.submit_rendered("eval('1')", &[]).await;
        assert!(unsafe_view.html.contains("eval"));

        let ok = session.submit_rendered("x = 1", &[]).await;
        assert!(ok.html.contains("All checks passed"));
    }
}
