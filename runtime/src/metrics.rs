//! Prometheus metrics for the ledger runtime.
//!
//! Recorded through the `metrics` facade, so they are no-ops until a recorder
//! is installed. [`MetricsExporter`] installs the Prometheus one.
//!
//! # Example
//!
//! ```rust,no_run
//! use ticket_ledger_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = MetricsExporter::new();
//! exporter.install()?;
//!
//! // ... submit calls ...
//!
//! if let Some(text) = exporter.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;
use ticket_ledger_core::{LedgerError, LedgerEvent};

// Re-export metrics macros for use in other modules
pub use metrics::{counter, histogram};

/// Every call submitted, labelled by action
pub const CALLS_TOTAL: &str = "ledger_calls_total";
/// Calls that reverted, labelled by action and reason
pub const CALLS_REVERTED_TOTAL: &str = "ledger_calls_reverted_total";
/// Tokens minted by committed calls (inventories and tickets)
pub const TICKETS_MINTED_TOTAL: &str = "ledger_tickets_minted_total";
/// Native currency paid out by committed calls
pub const VALUE_TRANSFERRED_TOTAL: &str = "ledger_value_transferred_total";
/// Wall time of each call, labelled by action
pub const CALL_DURATION_SECONDS: &str = "ledger_call_duration_seconds";

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus recorder for the ledger's metrics.
#[derive(Default)]
pub struct MetricsExporter {
    handle: Option<PrometheusHandle>,
}

impl MetricsExporter {
    /// Create an exporter that has not been installed yet
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Describe the ledger's metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// Only one recorder can be installed per process. A second install is
    /// logged and ignored, and [`render`](Self::render) then returns `None`.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Prometheus metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this exporter did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter")
            .field("installed", &self.handle.is_some())
            .finish()
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(CALLS_TOTAL, "Total number of calls submitted to the ledger");
    describe_counter!(CALLS_REVERTED_TOTAL, "Total number of calls that reverted");
    describe_counter!(TICKETS_MINTED_TOTAL, "Total number of tokens minted by committed calls");
    describe_counter!(VALUE_TRANSFERRED_TOTAL, "Total native currency paid out by committed calls");
    describe_histogram!(CALL_DURATION_SECONDS, "Time taken to execute a call");
}

/// Ledger metrics recorder.
pub struct LedgerMetrics;

impl LedgerMetrics {
    /// Record a finished call, committed or not.
    pub fn record_call(action: &'static str, duration: Duration) {
        counter!(CALLS_TOTAL, "action" => action).increment(1);
        histogram!(CALL_DURATION_SECONDS, "action" => action).record(duration.as_secs_f64());
    }

    /// Record a reverted call.
    pub fn record_revert(action: &'static str, error: &LedgerError) {
        counter!(CALLS_REVERTED_TOTAL, "action" => action, "reason" => error.kind()).increment(1);
    }

    /// Record what an outermost committed call minted and paid out.
    pub fn record_commit(events: &[LedgerEvent], paid_out: u64) {
        let minted = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    LedgerEvent::TicketCreated { .. } | LedgerEvent::TicketPurchased { .. }
                )
            })
            .count();
        if minted > 0 {
            counter!(TICKETS_MINTED_TOTAL).increment(minted as u64);
        }
        if paid_out > 0 {
            counter!(VALUE_TRANSFERRED_TOTAL).increment(paid_out);
        }
    }
}
