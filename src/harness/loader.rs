//! Lazy, shared initialization of the Python runtime.
//!
//! Building the runtime is the expensive step of the whole harness: the
//! RustPython wasm payload has to be read and compiled. It is paid exactly
//! once per process. The loader moves through three states: uninitialized,
//! loading, ready. Callers arriving while initialization is in flight wait
//! for that same attempt instead of starting another; a failed attempt
//! leaves the loader uninitialized so the next call can retry cleanly. Once
//! ready, the handle lives for the rest of the process.

use std::path::PathBuf;

use tokio::sync::OnceCell;
use wasmtime::{Engine, Module};

use crate::error::{HarnessError, Result};
use crate::harness::config::HarnessConfig;

/// Handle to the process-wide interpreter runtime.
///
/// Holds the engine and the compiled interpreter module. Cloning is cheap;
/// both fields are internally reference counted.
#[derive(Clone)]
pub struct RuntimeHandle {
    engine: Engine,
    module: Module,
}

impl RuntimeHandle {
    /// The engine the runtime was compiled for.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The compiled interpreter module.
    pub fn module(&self) -> &Module {
        &self.module
    }
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("module", &"<compiled interpreter>")
            .finish()
    }
}

/// Owns the one shared [`RuntimeHandle`] and hands out borrows of it.
pub struct RuntimeLoader {
    interpreter_path: PathBuf,
    enable_fuel: bool,
    cell: OnceCell<RuntimeHandle>,
}

impl RuntimeLoader {
    /// Create a loader for the configured interpreter. Nothing is loaded
    /// until the first [`get`](Self::get).
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            interpreter_path: config.interpreter_path.clone(),
            enable_fuel: config.max_fuel.is_some(),
            cell: OnceCell::new(),
        }
    }

    /// Get the shared runtime, initializing it on first use.
    ///
    /// Concurrent callers during initialization share the in-flight attempt.
    /// On failure the loader stays uninitialized, so a later call retries
    /// rather than reporting a stale error forever.
    pub async fn get(&self) -> Result<&RuntimeHandle> {
        self.cell
            .get_or_try_init(|| Self::initialize(self.interpreter_path.clone(), self.enable_fuel))
            .await
    }

    /// Whether the runtime finished initializing.
    pub fn is_ready(&self) -> bool {
        self.cell.get().is_some()
    }

    async fn initialize(path: PathBuf, enable_fuel: bool) -> Result<RuntimeHandle> {
        tracing::debug!(path = %path.display(), "initializing Python runtime");

        let mut engine_config = wasmtime::Config::new();
        engine_config.epoch_interruption(true);
        engine_config.consume_fuel(enable_fuel);

        let engine = Engine::new(&engine_config).map_err(|e| {
            HarnessError::RuntimeUnavailable(anyhow::anyhow!("failed to create engine: {e}"))
        })?;

        // Reading and compiling the interpreter takes long enough to matter;
        // keep it off the async threads.
        let compile_engine = engine.clone();
        let module = tokio::task::spawn_blocking(move || -> Result<Module> {
            let wasm_bytes = std::fs::read(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    HarnessError::InterpreterNotFound(path.display().to_string())
                } else {
                    HarnessError::Io(e)
                }
            })?;
            Module::new(&compile_engine, &wasm_bytes).map_err(|e| {
                HarnessError::RuntimeUnavailable(anyhow::anyhow!(
                    "failed to compile interpreter: {e}"
                ))
            })
        })
        .await
        .map_err(|e| HarnessError::ExecutionFailed(format!("initialization task failed: {e}")))??;

        tracing::debug!("Python runtime ready");
        Ok(RuntimeHandle { engine, module })
    }
}
