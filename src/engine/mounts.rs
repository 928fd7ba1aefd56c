//! Component mount-episode reconstruction and operating-hour attribution.
//!
//! Joins the sparse mount/unmount event log against the dense daily operating
//! series. Events for one (equipment, component) pair replay through a
//! two-state machine (unmounted ⇄ mounted); each completed or open episode is
//! then attributed slices of the equipment's operating hours.
//!
//! The source system does not guarantee well-formed sequences. A MOUNT while
//! already mounted supersedes the open episode; an UNMOUNT while unmounted is
//! dropped. Both are logged, neither aborts the report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::warn;

use super::window::ReportWindow;
use super::QueryCtx;
use crate::error::EngineError;
use crate::types::{Equipment, MountEvent, MountKind};

/// One reconstructed mount episode. `unmounted_at == None` means the
/// component is still on the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Episode {
    pub mounted_at: DateTime<Utc>,
    pub unmounted_at: Option<DateTime<Utc>>,
}

/// Replay ordered events for one (equipment, component) pair into episodes.
pub(crate) fn replay_episodes(events: &[MountEvent]) -> Vec<Episode> {
    let mut episodes: Vec<Episode> = Vec::new();
    let mut open: Option<DateTime<Utc>> = None;

    for event in events {
        match (event.kind, open) {
            (MountKind::Mount, None) => open = Some(event.timestamp),
            (MountKind::Mount, Some(previous)) => {
                warn!(
                    equipment = %event.equipment_id,
                    component = %event.component_id,
                    previous_mount = %previous,
                    superseding_mount = %event.timestamp,
                    "Consecutive MOUNT without UNMOUNT; superseding open episode"
                );
                open = Some(event.timestamp);
            }
            (MountKind::Unmount, Some(mounted_at)) => {
                episodes.push(Episode {
                    mounted_at,
                    unmounted_at: Some(event.timestamp),
                });
                open = None;
            }
            (MountKind::Unmount, None) => {
                warn!(
                    equipment = %event.equipment_id,
                    component = %event.component_id,
                    timestamp = %event.timestamp,
                    "UNMOUNT without prior MOUNT; event dropped"
                );
            }
        }
    }

    if let Some(mounted_at) = open {
        episodes.push(Episode {
            mounted_at,
            unmounted_at: None,
        });
    }
    episodes
}

/// Hour attribution for one episode within the reporting month.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeAttribution {
    pub mounted_at: DateTime<Utc>,
    pub unmounted_at: Option<DateTime<Utc>>,
    /// Σ HRM from the mount through the episode end, capped at month end.
    pub hours_since_mount: f64,
    /// Σ HRM for the slice of the episode inside the reporting month.
    pub hours_in_month: f64,
}

/// One row per (equipment, component) pair with at least one MOUNT event.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHoursRow {
    pub equipment_id: String,
    pub equipment_name: String,
    pub component_id: String,
    pub component_name: String,
    /// True iff the last episode is still open.
    pub still_mounted: bool,
    pub hours_since_mount: f64,
    pub hours_in_month: f64,
    pub episodes: Vec<EpisodeAttribution>,
}

/// Per-component operating-hour attribution for one reporting month.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHoursReport {
    pub month: u32,
    pub year: i32,
    pub rows: Vec<ComponentHoursRow>,
}

/// Build the component-hours report for one reporting period.
pub(crate) async fn build_component_hours(
    ctx: &QueryCtx<'_>,
    window: &ReportWindow,
) -> Result<ComponentHoursReport, EngineError> {
    // Component history outlives the active flag, so all equipment is in scope.
    let mut equipment = ctx.run(ctx.store.list_equipment(false)).await?;
    equipment.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let components = ctx.run(ctx.store.list_components()).await?;
    let component_names: BTreeMap<&str, &str> = components
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();

    let row_futures: Vec<_> = equipment
        .iter()
        .map(|e| rows_for_equipment(ctx, window, e, &component_names))
        .collect();
    let rows: Vec<Vec<ComponentHoursRow>> = stream::iter(row_futures)
        .buffered(ctx.max_concurrency)
        .try_collect()
        .await?;

    Ok(ComponentHoursReport {
        month: window.month,
        year: window.year,
        rows: rows.into_iter().flatten().collect(),
    })
}

/// Attribute all of one equipment's component pairs.
async fn rows_for_equipment(
    ctx: &QueryCtx<'_>,
    window: &ReportWindow,
    equipment: &Equipment,
    component_names: &BTreeMap<&str, &str>,
) -> Result<Vec<ComponentHoursRow>, EngineError> {
    let events = ctx
        .run(ctx.store.list_mount_events(&equipment.id, None))
        .await?;

    // Group the equipment's events per component, keeping order.
    let mut per_component: BTreeMap<String, Vec<MountEvent>> = BTreeMap::new();
    for event in events {
        per_component
            .entry(event.component_id.clone())
            .or_default()
            .push(event);
    }

    let mut equipment_rows = Vec::new();
    for (component_id, events) in &per_component {
        if let Some(row) =
            attribute_pair(ctx, window, equipment, component_id, component_names, events).await?
        {
            equipment_rows.push(row);
        }
    }
    Ok(equipment_rows)
}

/// Attribute hours for one (equipment, component) pair. `None` when the pair
/// has no MOUNT event at all.
async fn attribute_pair(
    ctx: &QueryCtx<'_>,
    window: &ReportWindow,
    equipment: &Equipment,
    component_id: &str,
    component_names: &BTreeMap<&str, &str>,
    events: &[MountEvent],
) -> Result<Option<ComponentHoursRow>, EngineError> {
    let episodes = replay_episodes(events);
    if episodes.is_empty() {
        return Ok(None);
    }

    let equipment_ids = vec![equipment.id.clone()];
    let mut attributions = Vec::with_capacity(episodes.len());
    let mut total_since_mount = 0.0;
    let mut total_in_month = 0.0;

    for episode in &episodes {
        let episode_end = episode.unmounted_at.unwrap_or(window.month_end);
        let capped_end = episode_end.min(window.month_end);

        let hours_since_mount = if episode.mounted_at <= window.month_end
            && episode.mounted_at <= capped_end
        {
            ctx.run(ctx.store.sum_operating_hours(
                &equipment_ids,
                episode.mounted_at,
                capped_end,
            ))
            .await?
        } else {
            0.0
        };

        // Slice of the episode inside the month: pre-mount readings are never
        // attributed, so the lower bound is the later of month start and mount.
        let in_month_start = window.month_start.max(episode.mounted_at);
        let hours_in_month = if in_month_start <= capped_end {
            ctx.run(ctx.store.sum_operating_hours(
                &equipment_ids,
                in_month_start,
                capped_end,
            ))
            .await?
        } else {
            0.0
        };

        total_since_mount += hours_since_mount;
        total_in_month += hours_in_month;
        attributions.push(EpisodeAttribution {
            mounted_at: episode.mounted_at,
            unmounted_at: episode.unmounted_at,
            hours_since_mount,
            hours_in_month,
        });
    }

    let still_mounted = episodes
        .last()
        .is_some_and(|e| e.unmounted_at.is_none());

    Ok(Some(ComponentHoursRow {
        equipment_id: equipment.id.clone(),
        equipment_name: equipment.name.clone(),
        component_id: component_id.to_string(),
        component_name: component_names
            .get(component_id)
            .map_or_else(|| component_id.to_string(), ToString::to_string),
        still_mounted,
        hours_since_mount: total_since_mount,
        hours_in_month: total_in_month,
        episodes: attributions,
    }))
}
