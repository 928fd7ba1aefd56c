//! In-memory implementation of [`MaintenanceStore`] over an owned snapshot.
//!
//! Backs the demo binary and the test fixtures. Every query scans the
//! snapshot's vectors; datasets here are monthly extracts, not archives, so
//! linear scans are fine.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::{MaintenanceStore, Snapshot, StoreError};
use crate::types::{
    Component, Equipment, FailureCategory, FailureType, Fleet, FleetType, MountEvent, Objective,
};

/// Snapshot-backed store for tests and local use.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    snapshot: Snapshot,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Day-granularity window check, closed-inclusive on both ends.
    fn in_window(date: NaiveDate, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        date >= start.date_naive() && date <= end.date_naive()
    }
}

#[async_trait]
impl MaintenanceStore for MemoryStore {
    async fn list_equipment(&self, active_only: bool) -> Result<Vec<Equipment>, StoreError> {
        Ok(self
            .snapshot
            .equipment
            .iter()
            .filter(|e| !active_only || e.active)
            .cloned()
            .collect())
    }

    async fn list_fleets(&self) -> Result<Vec<Fleet>, StoreError> {
        Ok(self.snapshot.fleets.clone())
    }

    async fn list_fleet_types(&self) -> Result<Vec<FleetType>, StoreError> {
        Ok(self.snapshot.fleet_types.clone())
    }

    async fn sum_operating_hours(
        &self,
        equipment_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64, StoreError> {
        let ids: HashSet<&str> = equipment_ids.iter().map(String::as_str).collect();
        Ok(self
            .snapshot
            .readings
            .iter()
            .filter(|r| ids.contains(r.equipment_id.as_str()))
            .filter(|r| Self::in_window(r.date, start, end))
            .map(|r| r.operating_hours)
            .sum())
    }

    async fn sum_failure_hours(
        &self,
        equipment_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        category_id: Option<&str>,
    ) -> Result<f64, StoreError> {
        let ids: HashSet<&str> = equipment_ids.iter().map(String::as_str).collect();
        Ok(self
            .snapshot
            .failures
            .iter()
            .filter(|f| ids.contains(f.equipment_id.as_str()))
            .filter(|f| Self::in_window(f.date, start, end))
            .filter(|f| category_id.is_none_or(|c| f.category_id == c))
            .map(|f| f.downtime_hours)
            .sum())
    }

    async fn count_failure_events(
        &self,
        equipment_ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        category_id: Option<&str>,
    ) -> Result<u64, StoreError> {
        let ids: HashSet<&str> = equipment_ids.iter().map(String::as_str).collect();
        Ok(self
            .snapshot
            .failures
            .iter()
            .filter(|f| ids.contains(f.equipment_id.as_str()))
            .filter(|f| Self::in_window(f.date, start, end))
            .filter(|f| category_id.is_none_or(|c| f.category_id == c))
            .count() as u64)
    }

    async fn list_mount_events(
        &self,
        equipment_id: &str,
        component_id: Option<&str>,
    ) -> Result<Vec<MountEvent>, StoreError> {
        let mut events: Vec<MountEvent> = self
            .snapshot
            .mount_events
            .iter()
            .filter(|m| m.equipment_id == equipment_id)
            .filter(|m| component_id.is_none_or(|c| m.component_id == c))
            .cloned()
            .collect();
        events.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.component_id.cmp(&b.component_id))
        });
        Ok(events)
    }

    async fn list_components(&self) -> Result<Vec<Component>, StoreError> {
        Ok(self.snapshot.components.clone())
    }

    async fn list_failure_categories(&self) -> Result<Vec<FailureCategory>, StoreError> {
        Ok(self.snapshot.failure_categories.clone())
    }

    async fn list_failure_types(&self) -> Result<Vec<FailureType>, StoreError> {
        Ok(self.snapshot.failure_types.clone())
    }

    async fn get_objective(
        &self,
        fleet_id: &str,
        year: i32,
    ) -> Result<Option<Objective>, StoreError> {
        Ok(self
            .snapshot
            .objectives
            .iter()
            .find(|o| o.fleet_id == fleet_id && o.year == year)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FailureEvent, OperatingReading};
    use chrono::TimeZone;

    fn reading(equipment_id: &str, date: &str, hours: f64) -> OperatingReading {
        OperatingReading {
            equipment_id: equipment_id.to_string(),
            date: date.parse().unwrap(),
            operating_hours: hours,
            hour_meter: 0.0,
        }
    }

    fn failure(equipment_id: &str, date: &str, hours: f64, category: &str) -> FailureEvent {
        FailureEvent {
            equipment_id: equipment_id.to_string(),
            date: date.parse().unwrap(),
            downtime_hours: hours,
            category_id: category.to_string(),
            notes: String::new(),
        }
    }

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_operating_hours_window_is_day_inclusive() {
        let store = MemoryStore::new(Snapshot {
            readings: vec![
                reading("E1", "2024-03-09", 5.0),
                reading("E1", "2024-03-10", 3.0),
                reading("E1", "2024-03-20", 2.0),
                reading("E1", "2024-03-21", 9.0),
                reading("E2", "2024-03-15", 100.0),
            ],
            ..Snapshot::default()
        });

        let sum = store
            .sum_operating_hours(&["E1".to_string()], ts(2024, 3, 10), ts(2024, 3, 20))
            .await
            .unwrap();
        // Both boundary days count; other equipment never does.
        assert!((sum - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_failure_queries_honor_category_filter() {
        let store = MemoryStore::new(Snapshot {
            failures: vec![
                failure("E1", "2024-03-05", 4.0, "CAT-A"),
                failure("E1", "2024-03-06", 2.0, "CAT-B"),
                failure("E1", "2024-03-07", 1.0, "CAT-A"),
            ],
            ..Snapshot::default()
        });

        let ids = vec!["E1".to_string()];
        let all = store
            .sum_failure_hours(&ids, ts(2024, 3, 1), ts(2024, 3, 31), None)
            .await
            .unwrap();
        let cat_a = store
            .sum_failure_hours(&ids, ts(2024, 3, 1), ts(2024, 3, 31), Some("CAT-A"))
            .await
            .unwrap();
        let ni_a = store
            .count_failure_events(&ids, ts(2024, 3, 1), ts(2024, 3, 31), Some("CAT-A"))
            .await
            .unwrap();

        assert!((all - 7.0).abs() < 1e-9);
        assert!((cat_a - 5.0).abs() < 1e-9);
        assert_eq!(ni_a, 2);
    }

    #[tokio::test]
    async fn test_mount_events_sorted_ascending() {
        let mut snapshot = Snapshot::default();
        for (day, kind) in [(20, crate::types::MountKind::Unmount), (10, crate::types::MountKind::Mount)] {
            snapshot.mount_events.push(MountEvent {
                equipment_id: "E1".to_string(),
                component_id: "C1".to_string(),
                timestamp: ts(2024, 3, day),
                kind,
                cause: String::new(),
                cause_type: String::new(),
                notes: String::new(),
            });
        }
        let store = MemoryStore::new(snapshot);

        let events = store.list_mount_events("E1", None).await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].timestamp < events[1].timestamp);
    }
}
