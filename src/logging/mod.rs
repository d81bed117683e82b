//! Logging and observability
//!
//! Structured `tracing` output with:
//! - Console logs filtered by level or `RUST_LOG`
//! - Optional JSON file logging with rotation
//! - Optional ERROR-only side log for offline inspection of failures
//!
//! # Example
//!
//! ```no_run
//! use noc_seeder::logging::init_logging;
//! use noc_seeder::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(entity = "programs", "Seeding started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log progress after a mega-batch
///
/// # Example
///
/// ```no_run
/// use noc_seeder::log_batch_progress;
///
/// log_batch_progress!("programs", 150, 600);
/// ```
#[macro_export]
macro_rules! log_batch_progress {
    ($operation:expr, $processed:expr, $total:expr) => {
        tracing::info!(
            operation = %$operation,
            processed = $processed,
            total = $total,
            progress_pct = if $total == 0 {
                100.0
            } else {
                $processed as f64 / $total as f64 * 100.0
            },
            "Batch progress"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use noc_seeder::log_retry_attempt;
///
/// log_retry_attempt!("programs:1042", 2, 3, 1000u64, "deadlock detected");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($label:expr, $attempt:expr, $max_retries:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            context = %$label,
            attempt = $attempt,
            max_retries = $max_retries,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying write after transient failure"
        );
    };
}
