//! Core execution engine for submissions and their test cases.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wasmtime::{Linker, Store};
use wasmtime_wasi::preview1;
use wasmtime_wasi::{I32Exit, WasiCtxBuilder};

use crate::error::{HarnessError, Result};
use crate::harness::config::HarnessConfig;
use crate::harness::driver::{self, ReportedTest};
use crate::harness::io::RunCapture;
use crate::harness::limits::{StoreData, StoreLimiterExt};
use crate::harness::loader::{RuntimeHandle, RuntimeLoader};

/// One executable check supplied by an exercise definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// Python fragment, typically an assertion, run in the namespace the
    /// submission populated.
    pub code: String,
    /// Human-readable label shown in the result view.
    pub description: String,
}

impl TestCase {
    /// Create a test case from a code fragment and its label.
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Per-test detail line of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// The test case's label.
    pub description: String,
    /// Whether the test completed without raising.
    pub passed: bool,
    /// Failure message; `None` when the test passed.
    pub message: Option<String>,
}

/// Outcome of running a submission plus its test cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The submission ran cleanly and every test passed.
    pub success: bool,
    /// Number of tests that completed without raising.
    pub tests_passed: usize,
    /// Number of tests supplied.
    pub total_tests: usize,
    /// Per-test outcome lines, in submission order.
    pub details: Vec<TestOutcome>,
    /// Error raised by the submission itself, before any test ran. When set,
    /// the test counts are zero: the tests were never attempted.
    pub error: Option<String>,
    /// Output the submission and its tests printed, in execution order.
    pub stdout: String,
}

impl ExecutionResult {
    /// Check if the run was fully successful.
    pub fn is_success(&self) -> bool {
        self.success
    }

    fn user_error(message: String, stdout: String) -> Self {
        Self {
            success: false,
            tests_passed: 0,
            total_tests: 0,
            details: Vec::new(),
            error: Some(message),
            stdout,
        }
    }

    fn from_outcomes(details: Vec<TestOutcome>, stdout: String) -> Self {
        let total_tests = details.len();
        let tests_passed = details.iter().filter(|t| t.passed).count();
        Self {
            success: tests_passed == total_tests,
            tests_passed,
            total_tests,
            details,
            error: None,
            stdout,
        }
    }
}

/// Anything that can run a submission against its test cases.
///
/// The production implementation is [`ExerciseRunner`]; tests substitute
/// counting or canned runners to exercise the submission pipeline without an
/// interpreter.
#[async_trait]
pub trait CodeRunner: Send + Sync {
    /// Run `user_code`, then each test, in one shared namespace.
    async fn run(
        &self,
        user_code: &str,
        tests: &[TestCase],
        session_prelude: Option<&str>,
    ) -> Result<ExecutionResult>;
}

/// Execution engine backed by the shared Wasm-hosted interpreter.
pub struct ExerciseRunner {
    config: HarnessConfig,
    loader: RuntimeLoader,
}

impl ExerciseRunner {
    /// Create a runner with the given configuration. The interpreter itself
    /// is not loaded until the first run asks for it.
    pub fn new(config: HarnessConfig) -> Self {
        let loader = RuntimeLoader::new(&config);
        Self { config, loader }
    }

    /// The runner's configuration.
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// The loader owning the shared runtime.
    pub fn loader(&self) -> &RuntimeLoader {
        &self.loader
    }

    /// One interpreter invocation, on a blocking thread.
    fn run_driver(runtime: &RuntimeHandle, program: &str, config: &HarnessConfig) -> Result<RawRun> {
        // Fresh capture buffers for exactly this run; dropping the store
        // detaches them again on every exit path.
        let capture = RunCapture::new(config.max_output_bytes);

        let wasi_ctx = WasiCtxBuilder::new()
            .args(&["python", "-c", program])
            .stdout(capture.stdout_pipe())
            .stderr(capture.stderr_pipe())
            .build_p1();

        let store_data = StoreData::new(config.max_memory, wasi_ctx);
        let mut store = Store::new(runtime.engine(), store_data);
        store.configure_limiter();

        // The ticker increments the engine epoch every tick interval; the
        // store traps once enough ticks for the configured timeout have
        // elapsed.
        let ticks = config.timeout.as_millis() / config.epoch_tick_interval.as_millis().max(1);
        store.epoch_deadline_trap();
        store.set_epoch_deadline(ticks.max(1) as u64 + 1);

        if let Some(fuel) = config.max_fuel {
            store.set_fuel(fuel).map_err(|e| {
                HarnessError::RuntimeUnavailable(anyhow::anyhow!("failed to set fuel: {e}"))
            })?;
        }

        let mut linker = Linker::new(runtime.engine());
        preview1::add_to_linker_sync(&mut linker, |data: &mut StoreData| &mut data.wasi).map_err(
            |e| HarnessError::RuntimeUnavailable(anyhow::anyhow!("failed to link WASI: {e}")),
        )?;

        let instance = linker.instantiate(&mut store, runtime.module()).map_err(|e| {
            if store.data().limiter.limit_exceeded() {
                return HarnessError::MemoryLimitExceeded(
                    "memory limit exceeded during instantiation".to_string(),
                );
            }
            HarnessError::RuntimeUnavailable(anyhow::anyhow!(
                "failed to instantiate interpreter: {e}"
            ))
        })?;

        let start = instance
            .get_typed_func::<(), ()>(&mut store, "_start")
            .map_err(|e| {
                HarnessError::RuntimeUnavailable(anyhow::anyhow!(
                    "interpreter has no _start entry point: {e}"
                ))
            })?;

        let exit_code = match start.call(&mut store, ()) {
            Ok(()) => 0,
            Err(e) => {
                if store.data().limiter.limit_exceeded() {
                    return Err(HarnessError::MemoryLimitExceeded(
                        "memory limit exceeded during execution".to_string(),
                    ));
                }

                let text = e.to_string();
                if text.contains("fuel") {
                    return Err(HarnessError::OutOfFuel);
                }
                if text.contains("epoch") || text.contains("interrupt") {
                    return Err(HarnessError::Timeout(config.timeout));
                }

                if let Some(exit) = e.downcast_ref::<I32Exit>() {
                    exit.0
                } else {
                    return Err(HarnessError::ExecutionFailed(text));
                }
            }
        };

        Ok(RawRun {
            stdout: capture.stdout_text(),
            stderr: capture.stderr_text(),
            exit_code,
        })
    }

    /// Turn a raw run into the aggregated result.
    ///
    /// Every test is reported: a test the driver never got to (it cannot
    /// happen through the driver, but a dying interpreter can cut the report
    /// short) counts as failed rather than silently passed.
    fn collect(raw: RawRun, tests: &[TestCase]) -> ExecutionResult {
        let report = driver::parse_run_report(&raw.stderr);

        if let Some(message) = report.user_error {
            return ExecutionResult::user_error(message, raw.stdout);
        }

        if !report.user_ok {
            // The interpreter died before the driver reported; surface
            // whatever it left on stderr.
            let message = driver::last_exception_line(&raw.stderr)
                .unwrap_or_else(|| format!("interpreter exited with code {}", raw.exit_code));
            return ExecutionResult::user_error(message, raw.stdout);
        }

        let mut details: Vec<TestOutcome> = tests
            .iter()
            .map(|test| TestOutcome {
                description: test.description.clone(),
                passed: false,
                message: Some("test did not run".to_string()),
            })
            .collect();

        for (index, reported) in report.tests {
            let Some(slot) = details.get_mut(index) else {
                continue;
            };
            match reported {
                ReportedTest::Passed => {
                    slot.passed = true;
                    slot.message = None;
                }
                ReportedTest::Failed(message) => {
                    slot.passed = false;
                    slot.message = Some(if message.is_empty() {
                        "assertion failed".to_string()
                    } else {
                        message
                    });
                }
            }
        }

        ExecutionResult::from_outcomes(details, raw.stdout)
    }
}

#[async_trait]
impl CodeRunner for ExerciseRunner {
    async fn run(
        &self,
        user_code: &str,
        tests: &[TestCase],
        session_prelude: Option<&str>,
    ) -> Result<ExecutionResult> {
        let runtime = self.loader.get().await?.clone();
        let program = driver::compose_driver(user_code, tests, session_prelude);

        let timeout = self.config.timeout;
        let epoch_interval = self.config.epoch_tick_interval;
        let config = self.config.clone();

        tracing::debug!(tests = tests.len(), "running submission");

        // Epoch ticker drives the deadline check inside the interpreter.
        let ticker_engine = runtime.engine().clone();
        let ticker_handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(epoch_interval);
            loop {
                interval.tick().await;
                ticker_engine.increment_epoch();
            }
        });

        let exec_runtime = runtime.clone();
        let exec_handle = tokio::task::spawn_blocking(move || {
            Self::run_driver(&exec_runtime, &program, &config)
        });

        // Race between execution and the wall-clock deadline.
        let raw = tokio::select! {
            result = exec_handle => {
                ticker_handle.abort();
                match result {
                    Ok(inner) => inner?,
                    Err(e) => {
                        return Err(HarnessError::ExecutionFailed(format!(
                            "execution task panicked: {e}"
                        )))
                    }
                }
            }
            _ = tokio::time::sleep(timeout) => {
                ticker_handle.abort();
                runtime.engine().increment_epoch(); // force the deadline trap
                tracing::warn!(?timeout, "submission exceeded its deadline");
                return Err(HarnessError::Timeout(timeout));
            }
        };

        Ok(Self::collect(raw, tests))
    }
}

struct RawRun {
    stdout: String,
    stderr: String,
    exit_code: i32,
}
