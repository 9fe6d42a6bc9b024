//! Runtime configuration
//!
//! Defaults come from the environment, then the builder overrides them:
//!
//! ```ignore
//! use vtid_runtime::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env()
//!     .num_workers(8)
//!     .num_slots(4);
//! ```

use std::time::Duration;
use vtid_core::constants::{MAX_MACHINES, MAX_SLOTS};
use vtid_core::env::{env_get, env_get_bool, env_get_ms};

/// Configuration for a [`Runtime`](crate::Runtime)
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of machines (worker OS threads)
    pub num_workers: usize,
    /// Number of execution slots shared by the machines
    pub num_slots: usize,
    /// Empty polls of the run queue before a machine parks
    pub idle_spins: u32,
    /// Upper bound on a single park
    pub park_timeout: Duration,
    /// Log machine lifecycle at debug level
    pub debug_logging: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl RuntimeConfig {
    /// Build from defaults with environment overrides
    ///
    /// - `VTID_NUM_WORKERS` - machines (default: available parallelism)
    /// - `VTID_NUM_SLOTS` - execution slots (default: same as workers)
    /// - `VTID_IDLE_SPINS` - spins before parking (default: 10)
    /// - `VTID_PARK_TIMEOUT_MS` - park timeout (default: 50)
    /// - `VTID_DEBUG` - debug logging (default: off)
    pub fn from_env() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .min(MAX_MACHINES);
        let num_workers: usize = env_get("VTID_NUM_WORKERS", cpus);

        Self {
            num_workers,
            num_slots: env_get("VTID_NUM_SLOTS", num_workers.min(MAX_SLOTS)),
            idle_spins: env_get("VTID_IDLE_SPINS", 10),
            park_timeout: env_get_ms("VTID_PARK_TIMEOUT_MS", 50),
            debug_logging: env_get_bool("VTID_DEBUG", false),
        }
    }

    /// Set number of machines; also caps the slot count to match
    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self.num_slots = self.num_slots.min(n);
        self
    }

    pub fn num_slots(mut self, n: usize) -> Self {
        self.num_slots = n;
        self
    }

    pub fn idle_spins(mut self, n: u32) -> Self {
        self.idle_spins = n;
        self
    }

    pub fn park_timeout(mut self, d: Duration) -> Self {
        self.park_timeout = d;
        self
    }

    pub fn debug_logging(mut self, enable: bool) -> Self {
        self.debug_logging = enable;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.num_workers == 0 {
            return Err("num_workers must be at least 1");
        }
        if self.num_workers > MAX_MACHINES {
            return Err("num_workers exceeds maximum");
        }
        if self.num_slots == 0 {
            return Err("num_slots must be at least 1");
        }
        if self.num_slots > MAX_SLOTS {
            return Err("num_slots exceeds maximum");
        }
        if self.park_timeout.is_zero() {
            return Err("park_timeout must be non-zero");
        }
        Ok(())
    }
}
