//! Harness configuration with builder pattern.

use std::path::PathBuf;
use std::time::Duration;

/// Controls whether learner definitions survive from one run to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamespaceMode {
    /// Every run starts from a clean interpreter namespace.
    #[default]
    Isolated,
    /// Definitions from earlier accepted submissions are re-established,
    /// with their output suppressed, before the new submission runs. Lets a
    /// learner build on code they already got working.
    Persistent,
}

/// Configuration for the exercise harness.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Maximum wall-clock time for one run before it is cancelled.
    pub timeout: Duration,
    /// Maximum interpreter memory in bytes.
    pub max_memory: u64,
    /// Maximum fuel (instruction count limit), if any.
    pub max_fuel: Option<u64>,
    /// Path to the RustPython wasm file.
    pub interpreter_path: PathBuf,
    /// Epoch interruption interval for cooperative deadline checks.
    pub epoch_tick_interval: Duration,
    /// Cap on captured stdout/stderr bytes per run.
    pub max_output_bytes: usize,
    /// Namespace behavior across runs of one session.
    pub namespace: NamespaceMode,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_memory: 64 * 1024 * 1024, // 64MB
            max_fuel: None,
            interpreter_path: PathBuf::from("assets/rustpython.wasm"),
            epoch_tick_interval: Duration::from_millis(10),
            max_output_bytes: 256 * 1024,
            namespace: NamespaceMode::Isolated,
        }
    }
}

impl HarnessConfig {
    /// Create a new builder for HarnessConfig.
    pub fn builder() -> HarnessConfigBuilder {
        HarnessConfigBuilder::default()
    }
}

/// Builder for creating HarnessConfig instances.
#[derive(Debug, Clone, Default)]
pub struct HarnessConfigBuilder {
    timeout: Option<Duration>,
    max_memory: Option<u64>,
    max_fuel: Option<u64>,
    interpreter_path: Option<PathBuf>,
    epoch_tick_interval: Option<Duration>,
    max_output_bytes: Option<usize>,
    namespace: Option<NamespaceMode>,
}

impl HarnessConfigBuilder {
    /// Set the maximum execution timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the maximum memory limit in bytes.
    pub fn max_memory(mut self, bytes: u64) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Set the maximum fuel (instruction count).
    pub fn max_fuel(mut self, fuel: u64) -> Self {
        self.max_fuel = Some(fuel);
        self
    }

    /// Set the path to the RustPython wasm interpreter.
    pub fn interpreter_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.interpreter_path = Some(path.into());
        self
    }

    /// Set the epoch tick interval for deadline checking.
    pub fn epoch_tick_interval(mut self, interval: Duration) -> Self {
        self.epoch_tick_interval = Some(interval);
        self
    }

    /// Set the per-run cap on captured output bytes.
    pub fn max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = Some(bytes);
        self
    }

    /// Set the namespace behavior across runs.
    pub fn namespace(mut self, mode: NamespaceMode) -> Self {
        self.namespace = Some(mode);
        self
    }

    /// Build the HarnessConfig.
    pub fn build(self) -> HarnessConfig {
        let default = HarnessConfig::default();
        HarnessConfig {
            timeout: self.timeout.unwrap_or(default.timeout),
            max_memory: self.max_memory.unwrap_or(default.max_memory),
            max_fuel: self.max_fuel.or(default.max_fuel),
            interpreter_path: self.interpreter_path.unwrap_or(default.interpreter_path),
            epoch_tick_interval: self
                .epoch_tick_interval
                .unwrap_or(default.epoch_tick_interval),
            max_output_bytes: self.max_output_bytes.unwrap_or(default.max_output_bytes),
            namespace: self.namespace.unwrap_or(default.namespace),
        }
    }
}
