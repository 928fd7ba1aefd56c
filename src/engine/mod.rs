//! Fleet reliability metrics & component-lifecycle attribution engine.
//!
//! The engine is computed per request: every report operation resolves its
//! time windows, fans out read-only queries against the persistence
//! collaborator, and merges results in deterministic order. There is no
//! long-lived state — two invocations with the same inputs produce identical
//! output.
//!
//! Failure policy: any sub-aggregation failure aborts the whole report, since
//! hierarchical sums built over silently-zeroed children would be wrong. Every
//! store query carries a deadline, and cancellation of the invoking request
//! abandons in-flight work.

pub mod aggregate;
pub mod coefficients;
pub mod indicators;
pub mod mounts;
pub mod rollup;
pub mod swaps;
pub mod window;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::{MaintenanceStore, StoreError};

pub use coefficients::FailureBreakdownReport;
pub use mounts::ComponentHoursReport;
pub use rollup::HierarchicalReliabilityReport;
pub use swaps::ComponentSwapReport;
pub use window::ReportWindow;

/// Per-request query context: the store handle plus the deadline,
/// cancellation token, and fan-out bound that govern every query.
pub(crate) struct QueryCtx<'a> {
    pub(crate) store: &'a dyn MaintenanceStore,
    pub(crate) timeout: Duration,
    pub(crate) cancel: &'a CancellationToken,
    pub(crate) max_concurrency: usize,
}

impl QueryCtx<'_> {
    /// Run one store query under the request's deadline and cancellation.
    pub(crate) async fn run<T, F>(&self, query: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        tokio::select! {
            () = self.cancel.cancelled() => Err(EngineError::Cancelled),
            outcome = tokio::time::timeout(self.timeout, query) => match outcome {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(EngineError::from(err)),
                Err(_) => Err(EngineError::DependencyTimeout(self.timeout)),
            },
        }
    }
}

/// Entry point for the four report computations.
pub struct ReliabilityEngine {
    store: Arc<dyn MaintenanceStore>,
    query_timeout: Duration,
    max_concurrent_queries: usize,
}

impl ReliabilityEngine {
    pub fn new(store: Arc<dyn MaintenanceStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            query_timeout: config.query_timeout(),
            max_concurrent_queries: config.max_concurrent_queries,
        }
    }

    fn ctx<'a>(&'a self, cancel: &'a CancellationToken) -> QueryCtx<'a> {
        QueryCtx {
            store: self.store.as_ref(),
            timeout: self.query_timeout,
            cancel,
            max_concurrency: self.max_concurrent_queries,
        }
    }

    /// FleetType → Fleet → Equipment reliability rollup for a month and its
    /// year-to-date window.
    pub async fn reliability_report(
        &self,
        month: u32,
        year: i32,
        cancel: &CancellationToken,
    ) -> Result<HierarchicalReliabilityReport, EngineError> {
        let window = ReportWindow::resolve(month, year)?;
        info!(month, year, "Computing hierarchical reliability report");
        // TP/VS have no data source yet; the split is threaded explicitly so
        // wiring one in later only touches this call site.
        let split = aggregate::DowntimeSplit::default();
        rollup::build_reliability_report(&self.ctx(cancel), &window, split).await
    }

    /// FailureType → Fleet → FailureCategory breakdown with global-share
    /// coefficients (two-pass).
    pub async fn failure_breakdown(
        &self,
        month: u32,
        year: i32,
        cancel: &CancellationToken,
    ) -> Result<FailureBreakdownReport, EngineError> {
        let window = ReportWindow::resolve(month, year)?;
        info!(month, year, "Computing failure breakdown report");
        coefficients::build_failure_breakdown(&self.ctx(cancel), &window).await
    }

    /// Per-(equipment, component) mount-episode hour attribution.
    pub async fn component_hours(
        &self,
        month: u32,
        year: i32,
        cancel: &CancellationToken,
    ) -> Result<ComponentHoursReport, EngineError> {
        let window = ReportWindow::resolve(month, year)?;
        info!(month, year, "Computing component hours report");
        mounts::build_component_hours(&self.ctx(cancel), &window).await
    }

    /// Swap records for unmounts inside the reporting month.
    pub async fn component_swaps(
        &self,
        month: u32,
        year: i32,
        cancel: &CancellationToken,
    ) -> Result<ComponentSwapReport, EngineError> {
        let window = ReportWindow::resolve(month, year)?;
        info!(month, year, "Computing component swap report");
        swaps::build_component_swaps(&self.ctx(cancel), &window).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Snapshot};

    fn engine() -> ReliabilityEngine {
        let store = Arc::new(MemoryStore::new(Snapshot::default()));
        ReliabilityEngine::new(store, &EngineConfig::default())
    }

    #[tokio::test]
    async fn test_invalid_month_rejected_before_any_query() {
        let cancel = CancellationToken::new();
        let err = engine().reliability_report(14, 2024, &cancel).await;
        assert!(matches!(err, Err(EngineError::InvalidPeriod(_))));
    }

    #[tokio::test]
    async fn test_pre_cancelled_request_aborts() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = engine().failure_breakdown(3, 2024, &cancel).await;
        assert!(matches!(err, Err(EngineError::Cancelled)));
    }
}
