//! Component movement reconciliation for a reporting month.
//!
//! For every UNMOUNT inside the month, pairs the removal with its preceding
//! MOUNT (same equipment and component) to attribute operating hours, and
//! with the next MOUNT on the same equipment — any component — up to month end
//! to identify the replacement part.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;

use super::window::ReportWindow;
use super::QueryCtx;
use crate::error::EngineError;
use crate::types::{Equipment, MountEvent, MountKind};

/// One removal, its attributed hours, and the replacement if one was mounted
/// within the window.
#[derive(Debug, Clone, Serialize)]
pub struct SwapRecord {
    pub equipment_id: String,
    pub equipment_name: String,
    pub removed_component_id: String,
    pub removed_component_name: String,
    pub unmounted_at: DateTime<Utc>,
    /// Σ HRM from the prior mount through the unmount; 0 when no prior mount
    /// exists.
    pub attributed_hours: f64,
    pub cause: String,
    pub cause_type: String,
    pub notes: String,
    /// Replacement mount, if any occurred before month end.
    pub replacement_component_id: Option<String>,
    pub replacement_component_name: Option<String>,
    pub replacement_mounted_at: Option<DateTime<Utc>>,
}

/// All swaps whose unmount falls inside the reporting month.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentSwapReport {
    pub month: u32,
    pub year: i32,
    pub swaps: Vec<SwapRecord>,
}

/// Build the swap report for one reporting period.
pub(crate) async fn build_component_swaps(
    ctx: &QueryCtx<'_>,
    window: &ReportWindow,
) -> Result<ComponentSwapReport, EngineError> {
    let mut equipment = ctx.run(ctx.store.list_equipment(false)).await?;
    equipment.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let components = ctx.run(ctx.store.list_components()).await?;
    let component_name = |id: &str| -> String {
        components
            .iter()
            .find(|c| c.id == id)
            .map_or_else(|| id.to_string(), |c| c.name.clone())
    };

    let record_futures: Vec<_> = equipment
        .iter()
        .map(|e| reconcile_equipment(ctx, window, e))
        .collect();
    let per_equipment: Vec<Vec<SwapRecord>> = stream::iter(record_futures)
        .buffered(ctx.max_concurrency)
        .try_collect()
        .await?;

    let mut swaps: Vec<SwapRecord> = per_equipment.into_iter().flatten().collect();
    for swap in &mut swaps {
        swap.removed_component_name = component_name(&swap.removed_component_id);
        swap.replacement_component_name = swap
            .replacement_component_id
            .as_deref()
            .map(|id| component_name(id));
    }

    Ok(ComponentSwapReport {
        month: window.month,
        year: window.year,
        swaps,
    })
}

/// Reconcile all in-month unmounts for one equipment.
async fn reconcile_equipment(
    ctx: &QueryCtx<'_>,
    window: &ReportWindow,
    equipment: &Equipment,
) -> Result<Vec<SwapRecord>, EngineError> {
    let events = ctx.run(ctx.store.list_mount_events(&equipment.id, None)).await?;
    let equipment_ids = vec![equipment.id.clone()];

    let mut records = Vec::new();
    for unmount in events.iter().filter(|e| {
        e.kind == MountKind::Unmount
            && e.timestamp >= window.month_start
            && e.timestamp <= window.month_end
    }) {
        let prior_mount = latest_prior_mount(&events, unmount);
        let attributed_hours = match prior_mount {
            Some(mount) => {
                ctx.run(ctx.store.sum_operating_hours(
                    &equipment_ids,
                    mount.timestamp,
                    unmount.timestamp,
                ))
                .await?
            }
            None => 0.0,
        };

        let replacement = earliest_replacement(&events, unmount, window.month_end);

        records.push(SwapRecord {
            equipment_id: equipment.id.clone(),
            equipment_name: equipment.name.clone(),
            removed_component_id: unmount.component_id.clone(),
            removed_component_name: String::new(),
            unmounted_at: unmount.timestamp,
            attributed_hours,
            cause: unmount.cause.clone(),
            cause_type: unmount.cause_type.clone(),
            notes: unmount.notes.clone(),
            replacement_component_id: replacement.map(|r| r.component_id.clone()),
            replacement_component_name: None,
            replacement_mounted_at: replacement.map(|r| r.timestamp),
        });
    }
    Ok(records)
}

/// Latest MOUNT of the same component strictly before the unmount.
fn latest_prior_mount<'a>(events: &'a [MountEvent], unmount: &MountEvent) -> Option<&'a MountEvent> {
    events
        .iter()
        .filter(|e| {
            e.kind == MountKind::Mount
                && e.component_id == unmount.component_id
                && e.timestamp < unmount.timestamp
        })
        .max_by_key(|e| e.timestamp)
}

/// Earliest MOUNT of any component strictly after the unmount, up to the
/// window end.
fn earliest_replacement<'a>(
    events: &'a [MountEvent],
    unmount: &MountEvent,
    month_end: DateTime<Utc>,
) -> Option<&'a MountEvent> {
    events
        .iter()
        .filter(|e| {
            e.kind == MountKind::Mount
                && e.timestamp > unmount.timestamp
                && e.timestamp <= month_end
        })
        .min_by_key(|e| e.timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{ctx_parts, fixture_store};
    use crate::store::Snapshot;
    use crate::types::{Component, OperatingReading};
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 8, 0, 0).unwrap()
    }

    fn mount_event(component: &str, at: DateTime<Utc>, kind: MountKind, cause: &str) -> MountEvent {
        MountEvent {
            equipment_id: "E1".into(),
            component_id: component.into(),
            timestamp: at,
            kind,
            cause: cause.into(),
            cause_type: if cause.is_empty() { String::new() } else { "preventive".into() },
            notes: String::new(),
        }
    }

    fn snapshot_with(events: Vec<MountEvent>, readings: Vec<OperatingReading>) -> Snapshot {
        Snapshot {
            equipment: vec![Equipment {
                id: "E1".into(),
                name: "Excavator 1".into(),
                fleet_id: "F1".into(),
                site_id: "S1".into(),
                active: true,
                initial_hour_meter: 0.0,
            }],
            components: vec![
                Component {
                    id: "C3".into(),
                    name: "Final drive".into(),
                    component_type_id: "CT1".into(),
                },
                Component {
                    id: "C4".into(),
                    name: "Final drive (spare)".into(),
                    component_type_id: "CT1".into(),
                },
            ],
            mount_events: events,
            readings,
            ..Snapshot::default()
        }
    }

    async fn build(snapshot: Snapshot) -> ComponentSwapReport {
        let store = fixture_store(snapshot);
        let (timeout, cancel) = ctx_parts();
        let ctx = QueryCtx {
            store: &store,
            timeout,
            cancel: &cancel,
            max_concurrency: 4,
        };
        let window = ReportWindow::resolve(3, 2024).unwrap();
        build_component_swaps(&ctx, &window).await.unwrap()
    }

    /// 1 h/day from Jan 1 through Mar 15 inclusive = 75 h.
    fn daily_readings_jan_to_mid_march() -> Vec<OperatingReading> {
        let mut readings = Vec::new();
        let mut date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        while date <= end {
            readings.push(OperatingReading {
                equipment_id: "E1".into(),
                date,
                operating_hours: 1.0,
                hour_meter: 0.0,
            });
            date = date.succ_opt().unwrap();
        }
        readings
    }

    #[tokio::test]
    async fn test_swap_with_replacement() {
        let report = build(snapshot_with(
            vec![
                mount_event("C3", ts(2024, 1, 1), MountKind::Mount, ""),
                mount_event("C3", ts(2024, 3, 15), MountKind::Unmount, "wear"),
                mount_event("C4", ts(2024, 3, 16), MountKind::Mount, ""),
            ],
            daily_readings_jan_to_mid_march(),
        ))
        .await;

        assert_eq!(report.swaps.len(), 1);
        let swap = &report.swaps[0];
        assert_eq!(swap.removed_component_id, "C3");
        assert_eq!(swap.removed_component_name, "Final drive");
        assert_eq!(swap.cause, "wear");
        assert!((swap.attributed_hours - 75.0).abs() < 1e-9);
        assert_eq!(swap.replacement_component_id.as_deref(), Some("C4"));
        assert_eq!(swap.replacement_mounted_at, Some(ts(2024, 3, 16)));
    }

    #[tokio::test]
    async fn test_unmount_without_prior_mount_attributes_zero() {
        let report = build(snapshot_with(
            vec![mount_event("C3", ts(2024, 3, 15), MountKind::Unmount, "wear")],
            daily_readings_jan_to_mid_march(),
        ))
        .await;

        assert_eq!(report.swaps.len(), 1);
        assert_eq!(report.swaps[0].attributed_hours, 0.0);
    }

    #[tokio::test]
    async fn test_no_replacement_within_window() {
        let report = build(snapshot_with(
            vec![
                mount_event("C3", ts(2024, 1, 1), MountKind::Mount, ""),
                mount_event("C3", ts(2024, 3, 15), MountKind::Unmount, "wear"),
                // Replacement lands after month end: not matched.
                mount_event("C4", ts(2024, 4, 2), MountKind::Mount, ""),
            ],
            Vec::new(),
        ))
        .await;

        let swap = &report.swaps[0];
        assert!(swap.replacement_component_id.is_none());
        assert!(swap.replacement_mounted_at.is_none());
    }

    #[tokio::test]
    async fn test_unmount_outside_month_is_ignored() {
        let report = build(snapshot_with(
            vec![
                mount_event("C3", ts(2024, 1, 1), MountKind::Mount, ""),
                mount_event("C3", ts(2024, 2, 10), MountKind::Unmount, "wear"),
            ],
            Vec::new(),
        ))
        .await;
        assert!(report.swaps.is_empty());
    }

    #[tokio::test]
    async fn test_replacement_may_be_same_component_remounted() {
        let report = build(snapshot_with(
            vec![
                mount_event("C3", ts(2024, 3, 1), MountKind::Mount, ""),
                mount_event("C3", ts(2024, 3, 10), MountKind::Unmount, "inspection"),
                mount_event("C3", ts(2024, 3, 12), MountKind::Mount, ""),
            ],
            Vec::new(),
        ))
        .await;

        assert_eq!(report.swaps.len(), 1);
        assert_eq!(report.swaps[0].replacement_component_id.as_deref(), Some("C3"));
    }
}
