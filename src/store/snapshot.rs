//! Serde-loadable dataset backing the in-memory store.
//!
//! A snapshot is the full read-only state the engine needs for any report:
//! the equipment hierarchy, the dense daily operating series, the failure log
//! with its category/type taxonomy, the component mount log, and objectives.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::types::{
    Component, ComponentType, Equipment, FailureCategory, FailureEvent, FailureType, Fleet,
    FleetType, MountEvent, Objective, OperatingReading,
};

/// Errors loading a snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Complete read-only dataset for report computation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub equipment: Vec<Equipment>,
    pub fleets: Vec<Fleet>,
    pub fleet_types: Vec<FleetType>,
    pub readings: Vec<OperatingReading>,
    pub failures: Vec<FailureEvent>,
    pub failure_categories: Vec<FailureCategory>,
    pub failure_types: Vec<FailureType>,
    pub components: Vec<Component>,
    pub component_types: Vec<ComponentType>,
    pub mount_events: Vec<MountEvent>,
    pub objectives: Vec<Objective>,
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            equipment = snapshot.equipment.len(),
            readings = snapshot.readings.len(),
            failures = snapshot.failures.len(),
            mount_events = snapshot.mount_events.len(),
            "Loaded maintenance snapshot"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_minimal_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"equipment": [{{"id": "E1", "name": "Loader 1", "fleet_id": "F1",
                 "site_id": "S1", "active": true, "initial_hour_meter": 120.5}}]}}"#
        )
        .unwrap();

        let snapshot = Snapshot::load(file.path()).unwrap();
        assert_eq!(snapshot.equipment.len(), 1);
        assert_eq!(snapshot.equipment[0].id, "E1");
        assert!(snapshot.readings.is_empty());
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            Snapshot::load(file.path()),
            Err(SnapshotError::Parse(_))
        ));
    }
}
