//! Resource limiting for the interpreter store.

use wasmtime::{ResourceLimiter, Store};

/// Resource limiter enforcing memory and table size caps on one run.
pub struct RunLimiter {
    /// Maximum memory in bytes.
    max_memory: u64,
    /// Maximum table elements.
    max_table_elements: u64,
    /// Whether a limit has been exceeded.
    limit_exceeded: bool,
}

impl RunLimiter {
    /// Create a new resource limiter with the specified memory cap.
    pub fn new(max_memory: u64) -> Self {
        Self {
            max_memory,
            max_table_elements: 10_000,
            limit_exceeded: false,
        }
    }

    /// Check if any limit has been exceeded.
    pub fn limit_exceeded(&self) -> bool {
        self.limit_exceeded
    }

    /// Get the configured memory cap.
    pub fn max_memory(&self) -> u64 {
        self.max_memory
    }
}

impl ResourceLimiter for RunLimiter {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        if desired as u64 > self.max_memory {
            self.limit_exceeded = true;
            return Ok(false);
        }
        Ok(true)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        if desired as u64 > self.max_table_elements {
            self.limit_exceeded = true;
            return Ok(false);
        }
        Ok(true)
    }
}

/// Store data for one run: the limiter plus the WASI context.
pub struct StoreData {
    /// The resource limiter.
    pub limiter: RunLimiter,
    /// WASI Preview 1 context for the run.
    pub wasi: wasmtime_wasi::preview1::WasiP1Ctx,
}

impl StoreData {
    /// Create new store data with the given memory cap and WASI context.
    pub fn new(max_memory: u64, wasi: wasmtime_wasi::preview1::WasiP1Ctx) -> Self {
        Self {
            limiter: RunLimiter::new(max_memory),
            wasi,
        }
    }
}

/// Extension trait for Store to configure resource limiting.
pub trait StoreLimiterExt {
    /// Configure the store with resource limiting enabled.
    fn configure_limiter(&mut self);
}

impl StoreLimiterExt for Store<StoreData> {
    fn configure_limiter(&mut self) {
        self.limiter(|data| &mut data.limiter);
    }
}
