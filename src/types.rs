//! Domain entities consumed by the reliability engine.
//!
//! All of these are owned by the persistence collaborator. The engine reads a
//! bounded snapshot of them per report and never writes back. Identifiers are
//! plain strings (snapshot keys); grouping follows the Fleet → FleetType
//! hierarchy for equipment and FailureCategory → FailureType for failures.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single maintainable machine. Belongs to one fleet and one site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub fleet_id: String,
    pub site_id: String,
    /// Inactive equipment is excluded from rollups but keeps its component
    /// history for attribution.
    pub active: bool,
    /// Hour-meter value at commissioning (hours already on the counter).
    pub initial_hour_meter: f64,
}

/// Equipment grouping level. Belongs to one fleet type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fleet {
    pub id: String,
    pub name: String,
    pub fleet_type_id: String,
}

/// Top rollup level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetType {
    pub id: String,
    pub name: String,
}

/// One day of the dense operating series. Unique per (equipment, date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingReading {
    pub equipment_id: String,
    pub date: NaiveDate,
    /// Hours the machine actually ran that day (HRM delta).
    pub operating_hours: f64,
    /// Cumulative hour-meter counter at end of day.
    pub hour_meter: f64,
}

/// A failure recorded against one equipment-day. Each row is one incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureEvent {
    pub equipment_id: String,
    pub date: NaiveDate,
    /// Downtime caused by the failure, constrained to 0–24 h.
    pub downtime_hours: f64,
    pub category_id: String,
    pub notes: String,
}

/// Failure classification leaf. Applicable to a subset of fleets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureCategory {
    pub id: String,
    pub name: String,
    pub failure_type_id: String,
    /// Fleets this category applies to (many-to-many).
    pub fleet_ids: Vec<String>,
}

/// Failure classification group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureType {
    pub id: String,
    pub name: String,
}

/// A trackable part that moves between machines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub name: String,
    pub component_type_id: String,
}

/// Component classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentType {
    pub id: String,
    pub name: String,
}

/// Direction of a component movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountKind {
    Mount,
    Unmount,
}

/// A discrete mount or unmount of a component on a machine.
///
/// Events for a given (equipment, component) pair are expected to alternate
/// MOUNT → UNMOUNT starting with MOUNT, but the source system does not enforce
/// it; the attributor tolerates malformed sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountEvent {
    pub equipment_id: String,
    pub component_id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MountKind,
    /// Removal/installation cause (free text, e.g. "wear").
    pub cause: String,
    pub cause_type: String,
    pub notes: String,
}

/// Per-fleet yearly targets. Read-only comparison input, never computed with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective {
    pub fleet_id: String,
    pub year: i32,
    pub target_availability_pct: f64,
    pub target_utilization_pct: f64,
}
