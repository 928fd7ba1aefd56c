//! Read-only query port over the persistence collaborator.
//!
//! The engine never owns storage. Everything it needs is expressed as the
//! [`MaintenanceStore`] trait: entity listings plus three windowed aggregates
//! over the dense operating series and the failure log. Implementations are
//! expected to be snapshot-consistent for the duration of one report.

mod memory;
mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SnapshotError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{
    Component, Equipment, FailureCategory, FailureType, Fleet, FleetType, MountEvent, Objective,
};

/// Failures reported by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Read-only queries the engine issues against the persistence collaborator.
///
/// Windowed aggregates take instant bounds but join against a daily series;
/// the contract is closed-inclusive at day granularity on both ends (a reading
/// dated on the start day and one dated on the end day both count).
#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    /// Equipment with fleet/site references, optionally restricted to active
    /// machines. Ordering is unspecified; callers sort.
    async fn list_equipment(&self, active_only: bool) -> Result<Vec<Equipment>, StoreError>;

    async fn list_fleets(&self) -> Result<Vec<Fleet>, StoreError>;

    async fn list_fleet_types(&self) -> Result<Vec<FleetType>, StoreError>;

    /// Σ operating hours (HRM) over the given equipment and window.
    async fn sum_operating_hours(
        &self,
        equipment_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64, StoreError>;

    /// Σ failure downtime hours (HIM) over the given equipment and window,
    /// optionally restricted to one failure category.
    async fn sum_failure_hours(
        &self,
        equipment_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        category_id: Option<&str>,
    ) -> Result<f64, StoreError>;

    /// Number of failure events (NI) over the given equipment and window.
    /// A row count — every event contributes exactly 1.
    async fn count_failure_events(
        &self,
        equipment_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        category_id: Option<&str>,
    ) -> Result<u64, StoreError>;

    /// Mount/unmount events for one equipment, timestamp ascending,
    /// optionally restricted to one component.
    async fn list_mount_events(
        &self,
        equipment_id: &str,
        component_id: Option<&str>,
    ) -> Result<Vec<MountEvent>, StoreError>;

    async fn list_components(&self) -> Result<Vec<Component>, StoreError>;

    async fn list_failure_categories(&self) -> Result<Vec<FailureCategory>, StoreError>;

    async fn list_failure_types(&self) -> Result<Vec<FailureType>, StoreError>;

    /// Yearly targets for one fleet, if defined.
    async fn get_objective(
        &self,
        fleet_id: &str,
        year: i32,
    ) -> Result<Option<Objective>, StoreError>;
}
