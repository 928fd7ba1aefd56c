//! Reliafleet: fleet reliability metrics & component-lifecycle attribution.
//!
//! Converts raw daily operating/failure records and discrete component
//! mount/unmount events into hierarchical reliability indicators and
//! per-component operating-hour attribution.
//!
//! ## Architecture
//!
//! - **Engine**: per-request report computation (windows, aggregation,
//!   indicators, rollups, attribution)
//! - **Store**: read-only query port over the persistence collaborator
//! - **API**: thin axum surface exposing the four report contracts

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod types;

// Re-export the engine entry point and report types
pub use engine::{
    ComponentHoursReport, ComponentSwapReport, FailureBreakdownReport,
    HierarchicalReliabilityReport, ReliabilityEngine, ReportWindow,
};

// Re-export the computation primitives
pub use engine::aggregate::{DowntimeSplit, RawTotals};
pub use engine::indicators::{derive_indicators, Indicators, RawInputs};

// Re-export the store port
pub use store::{MaintenanceStore, MemoryStore, Snapshot, StoreError};

// Re-export configuration and errors
pub use config::EngineConfig;
pub use error::EngineError;
