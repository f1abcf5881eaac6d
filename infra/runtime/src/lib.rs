//! # Runtime
//!
//! Tokio runtime profiles for casefile binaries.
//!
//! ## Profiles
//! * **Cli**: a current-thread scheduler. Package imports decode sequentially and storage I/O
//!   is short-lived, so a one-shot command has no use for a worker pool.
//! * **Service**: a multi-threaded scheduler for long-running hosts that embed the workbench.
//!
//! ## Example
//!
//! ```rust,ignore
//! #[casefile_runtime::main(cli)]
//! async fn main() -> anyhow::Result<()> {
//!     Ok(())
//! }
//! ```

pub use anyhow::Result;
pub use casefile_derive::main;

use anyhow::anyhow;
use std::{sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// The default number of worker threads if detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
/// The default stack size for threads (2 `MiB`).
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
const MIN_STACK_SIZE: usize = 1024 * 1024;
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(30);

static WORKER_THREADS: OnceLock<usize> = OnceLock::new();

fn detected_worker_threads() -> usize {
    *WORKER_THREADS.get_or_init(|| {
        std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0 && n <= 1024)
            .unwrap_or_else(|| {
                available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
            })
    })
}

/// Scheduler flavor backing a [`RuntimeConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    CurrentThread,
    MultiThread,
}

/// Configuration for the Tokio runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub flavor: Flavor,
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::service()
    }
}

impl RuntimeConfig {
    /// Single-threaded profile for command-line invocations.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            flavor: Flavor::CurrentThread,
            worker_threads: 1,
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "casefile-cli".to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }

    /// Multi-threaded profile sized from `TOKIO_WORKER_THREADS` or the host parallelism.
    #[must_use]
    pub fn service() -> Self {
        Self {
            flavor: Flavor::MultiThread,
            worker_threads: detected_worker_threads(),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "casefile-worker".to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }

    #[must_use = "Customize the number of worker threads for the runtime"]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, 1024);
        self
    }

    #[must_use = "Customize the stack size for worker threads"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }
}

/// Builds a Tokio runtime from `config`, with I/O and timers enabled.
///
/// # Errors
///
/// Returns an [`anyhow::Error`] if the OS refuses to create the runtime threads.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    debug!(config = ?config, "Building tokio runtime");

    let mut builder = match config.flavor {
        Flavor::CurrentThread => Builder::new_current_thread(),
        Flavor::MultiThread => {
            let mut builder = Builder::new_multi_thread();
            builder
                .worker_threads(config.worker_threads.clamp(1, 1024))
                .thread_keep_alive(config.thread_keep_alive);
            builder
        },
    };

    builder
        .thread_name(config.thread_name.clone())
        .thread_stack_size(config.stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE))
        .enable_all();

    builder.build().map_err(|e| anyhow!("Failed to initialize runtime: {e}"))
}
