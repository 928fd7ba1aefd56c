//! Hierarchical reliability rollup: FleetType → Fleet → Equipment.
//!
//! Raw quantities (HIM, HRM, NI) sum upward through the hierarchy; derived
//! indicators are recomputed at every level from that level's own sums.
//! Averaging child percentages would weight a 2-unit fleet the same as a
//! 40-unit fleet, so it is never done. Fleets with zero in-scope equipment are
//! omitted entirely.

use std::collections::HashMap;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;

use super::aggregate::{aggregate_raw, DowntimeSplit, RawTotals};
use super::indicators::{derive_indicators, Indicators, RawInputs};
use super::window::ReportWindow;
use super::QueryCtx;
use crate::error::EngineError;
use crate::types::{Equipment, Objective};

/// Raw sums, nominal hours, and derived indicators for one scope and window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowTotals {
    pub nominal_hours: f64,
    pub raw: RawTotals,
    pub indicators: Indicators,
}

impl WindowTotals {
    pub(crate) fn compute(raw: RawTotals, nominal_hours: f64, split: DowntimeSplit) -> Self {
        Self {
            nominal_hours,
            raw,
            indicators: derive_indicators(&RawInputs::new(raw, nominal_hours, split)),
        }
    }

    pub(crate) fn rounded(&self) -> Self {
        Self {
            nominal_hours: self.nominal_hours,
            raw: self.raw,
            indicators: self.indicators.rounded(),
        }
    }
}

/// Per-equipment detail row.
#[derive(Debug, Clone, Serialize)]
pub struct EquipmentRow {
    pub equipment_id: String,
    pub equipment_name: String,
    pub month: WindowTotals,
    pub year: WindowTotals,
}

/// Fleet-level rollup with its equipment detail and optional yearly targets.
#[derive(Debug, Clone, Serialize)]
pub struct FleetRollup {
    pub fleet_id: String,
    pub fleet_name: String,
    pub equipment_count: usize,
    pub objective: Option<Objective>,
    pub month: WindowTotals,
    pub year: WindowTotals,
    pub equipment: Vec<EquipmentRow>,
}

/// Top-level rollup node.
#[derive(Debug, Clone, Serialize)]
pub struct FleetTypeRollup {
    pub fleet_type_id: String,
    pub fleet_type_name: String,
    pub month: WindowTotals,
    pub year: WindowTotals,
    pub fleets: Vec<FleetRollup>,
}

/// The full month + year-to-date reliability report.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchicalReliabilityReport {
    pub month: u32,
    pub year: i32,
    pub fleet_types: Vec<FleetTypeRollup>,
}

impl HierarchicalReliabilityReport {
    /// Presentation copy with indicator fields rounded to 2 decimals.
    pub fn rounded(&self) -> Self {
        Self {
            month: self.month,
            year: self.year,
            fleet_types: self
                .fleet_types
                .iter()
                .map(|ft| FleetTypeRollup {
                    fleet_type_id: ft.fleet_type_id.clone(),
                    fleet_type_name: ft.fleet_type_name.clone(),
                    month: ft.month.rounded(),
                    year: ft.year.rounded(),
                    fleets: ft
                        .fleets
                        .iter()
                        .map(|f| FleetRollup {
                            fleet_id: f.fleet_id.clone(),
                            fleet_name: f.fleet_name.clone(),
                            equipment_count: f.equipment_count,
                            objective: f.objective.clone(),
                            month: f.month.rounded(),
                            year: f.year.rounded(),
                            equipment: f
                                .equipment
                                .iter()
                                .map(|e| EquipmentRow {
                                    equipment_id: e.equipment_id.clone(),
                                    equipment_name: e.equipment_name.clone(),
                                    month: e.month.rounded(),
                                    year: e.year.rounded(),
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

async fn row_for_equipment(
    ctx: &QueryCtx<'_>,
    window: &ReportWindow,
    split: DowntimeSplit,
    equipment: &Equipment,
) -> Result<EquipmentRow, EngineError> {
    let ids = vec![equipment.id.clone()];
    let month_raw = aggregate_raw(ctx, &ids, window.month_start, window.month_end, None).await?;
    let year_raw = aggregate_raw(ctx, &ids, window.year_start, window.year_end, None).await?;
    Ok(EquipmentRow {
        equipment_id: equipment.id.clone(),
        equipment_name: equipment.name.clone(),
        month: WindowTotals::compute(month_raw, window.nominal_hours_month, split),
        year: WindowTotals::compute(year_raw, window.nominal_hours_year, split),
    })
}

/// Build the hierarchical rollup for one reporting period.
pub(crate) async fn build_reliability_report(
    ctx: &QueryCtx<'_>,
    window: &ReportWindow,
    split: DowntimeSplit,
) -> Result<HierarchicalReliabilityReport, EngineError> {
    let equipment = ctx.run(ctx.store.list_equipment(true)).await?;
    let fleets = ctx.run(ctx.store.list_fleets()).await?;
    let fleet_types = ctx.run(ctx.store.list_fleet_types()).await?;

    // Group in-scope equipment by fleet, in stable (name, id) order.
    let mut by_fleet: HashMap<&str, Vec<&Equipment>> = HashMap::new();
    for e in &equipment {
        by_fleet.entry(e.fleet_id.as_str()).or_default().push(e);
    }
    for members in by_fleet.values_mut() {
        members.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    }

    let mut sorted_fleets: Vec<_> = fleets.iter().collect();
    sorted_fleets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    let mut sorted_types: Vec<_> = fleet_types.iter().collect();
    sorted_types.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let mut type_nodes = Vec::new();
    for fleet_type in sorted_types {
        let mut fleet_nodes = Vec::new();
        let mut type_month_raw = RawTotals::default();
        let mut type_year_raw = RawTotals::default();
        let mut type_month_nho = 0.0;
        let mut type_year_nho = 0.0;

        for fleet in sorted_fleets
            .iter()
            .filter(|f| f.fleet_type_id == fleet_type.id)
        {
            let Some(members) = by_fleet.get(fleet.id.as_str()) else {
                // Zero in-scope equipment: the fleet is omitted, not zeroed.
                continue;
            };

            // Futures are built eagerly so the stream item type is a plain
            // future, not a closure call.
            let row_futures: Vec<_> = members
                .iter()
                .map(|e| row_for_equipment(ctx, window, split, e))
                .collect();
            let rows: Vec<EquipmentRow> = stream::iter(row_futures)
                .buffered(ctx.max_concurrency)
                .try_collect()
                .await?;

            let mut fleet_month_raw = RawTotals::default();
            let mut fleet_year_raw = RawTotals::default();
            for row in &rows {
                fleet_month_raw.absorb(row.month.raw);
                fleet_year_raw.absorb(row.year.raw);
            }
            let count = rows.len();
            let fleet_month_nho = window.nominal_hours_month * count as f64;
            let fleet_year_nho = window.nominal_hours_year * count as f64;

            let objective = ctx
                .run(ctx.store.get_objective(&fleet.id, window.year))
                .await?;

            type_month_raw.absorb(fleet_month_raw);
            type_year_raw.absorb(fleet_year_raw);
            type_month_nho += fleet_month_nho;
            type_year_nho += fleet_year_nho;

            fleet_nodes.push(FleetRollup {
                fleet_id: fleet.id.clone(),
                fleet_name: fleet.name.clone(),
                equipment_count: count,
                objective,
                month: WindowTotals::compute(fleet_month_raw, fleet_month_nho, split),
                year: WindowTotals::compute(fleet_year_raw, fleet_year_nho, split),
                equipment: rows,
            });
        }

        if fleet_nodes.is_empty() {
            continue;
        }
        type_nodes.push(FleetTypeRollup {
            fleet_type_id: fleet_type.id.clone(),
            fleet_type_name: fleet_type.name.clone(),
            month: WindowTotals::compute(type_month_raw, type_month_nho, split),
            year: WindowTotals::compute(type_year_raw, type_year_nho, split),
            fleets: fleet_nodes,
        });
    }

    Ok(HierarchicalReliabilityReport {
        month: window.month,
        year: window.year,
        fleet_types: type_nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{ctx_parts, fixture_store};
    use crate::store::Snapshot;
    use crate::types::{Equipment, FailureEvent, Fleet, FleetType, OperatingReading};

    fn equipment(id: &str, name: &str, fleet_id: &str, active: bool) -> Equipment {
        Equipment {
            id: id.into(),
            name: name.into(),
            fleet_id: fleet_id.into(),
            site_id: "SITE-1".into(),
            active,
            initial_hour_meter: 0.0,
        }
    }

    fn reading(equipment_id: &str, date: &str, hours: f64) -> OperatingReading {
        OperatingReading {
            equipment_id: equipment_id.into(),
            date: date.parse().unwrap(),
            operating_hours: hours,
            hour_meter: 0.0,
        }
    }

    fn failure(equipment_id: &str, date: &str, hours: f64) -> FailureEvent {
        FailureEvent {
            equipment_id: equipment_id.into(),
            date: date.parse().unwrap(),
            downtime_hours: hours,
            category_id: "CAT-A".into(),
            notes: String::new(),
        }
    }

    fn two_fleet_snapshot() -> Snapshot {
        Snapshot {
            fleet_types: vec![FleetType {
                id: "FT1".into(),
                name: "Haulers".into(),
            }],
            fleets: vec![
                Fleet {
                    id: "F1".into(),
                    name: "North pit".into(),
                    fleet_type_id: "FT1".into(),
                },
                Fleet {
                    id: "F2".into(),
                    name: "South pit".into(),
                    fleet_type_id: "FT1".into(),
                },
            ],
            equipment: vec![
                equipment("E1", "Truck 01", "F1", true),
                equipment("E2", "Truck 02", "F1", true),
                equipment("E3", "Truck 03", "F2", true),
                equipment("E4", "Truck 04", "F2", false),
            ],
            readings: vec![
                reading("E1", "2024-03-10", 200.0),
                reading("E2", "2024-03-10", 100.0),
                reading("E3", "2024-03-10", 50.0),
                reading("E4", "2024-03-10", 999.0),
            ],
            failures: vec![
                failure("E1", "2024-03-11", 10.0),
                failure("E2", "2024-03-12", 30.0),
                failure("E3", "2024-03-13", 5.0),
            ],
            ..Snapshot::default()
        }
    }

    async fn build(snapshot: Snapshot) -> HierarchicalReliabilityReport {
        let store = fixture_store(snapshot);
        let (timeout, cancel) = ctx_parts();
        let ctx = QueryCtx {
            store: &store,
            timeout,
            cancel: &cancel,
            max_concurrency: 4,
        };
        let window = ReportWindow::resolve(3, 2024).unwrap();
        build_reliability_report(&ctx, &window, DowntimeSplit::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_raw_sums_roll_up_exactly() {
        let report = build(two_fleet_snapshot()).await;
        let ft = &report.fleet_types[0];

        let fleet_him: f64 = ft.fleets.iter().map(|f| f.month.raw.him).sum();
        let fleet_hrm: f64 = ft.fleets.iter().map(|f| f.month.raw.hrm).sum();
        let fleet_ni: u64 = ft.fleets.iter().map(|f| f.month.raw.ni).sum();

        assert!((ft.month.raw.him - fleet_him).abs() < 1e-9);
        assert!((ft.month.raw.hrm - fleet_hrm).abs() < 1e-9);
        assert_eq!(ft.month.raw.ni, fleet_ni);
        // Inactive E4 never contributes.
        assert!((ft.month.raw.hrm - 350.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_indicators_derived_from_aggregate_sums_not_averaged() {
        let report = build(two_fleet_snapshot()).await;
        let ft = &report.fleet_types[0];

        let expected = derive_indicators(&RawInputs::new(
            ft.month.raw,
            ft.month.nominal_hours,
            DowntimeSplit::default(),
        ));
        assert!((ft.month.indicators.disp - expected.disp).abs() < 1e-9);

        // A naive average of fleet-level DISP must diverge here: F1 has two
        // units (40 h HIM over 1488 NHO), F2 has one (5 h over 744).
        let avg_disp: f64 = ft.fleets.iter().map(|f| f.month.indicators.disp).sum::<f64>()
            / ft.fleets.len() as f64;
        assert!((ft.month.indicators.disp - avg_disp).abs() > 1e-6);
    }

    #[tokio::test]
    async fn test_fleet_without_in_scope_equipment_is_omitted() {
        let mut snapshot = two_fleet_snapshot();
        snapshot.fleets.push(Fleet {
            id: "F3".into(),
            name: "Empty pit".into(),
            fleet_type_id: "FT1".into(),
        });
        let report = build(snapshot).await;
        let ft = &report.fleet_types[0];
        assert_eq!(ft.fleets.len(), 2);
        assert!(ft.fleets.iter().all(|f| f.fleet_id != "F3"));
    }

    #[tokio::test]
    async fn test_output_ordering_is_deterministic() {
        let report = build(two_fleet_snapshot()).await;
        let ft = &report.fleet_types[0];
        assert_eq!(ft.fleets[0].fleet_name, "North pit");
        assert_eq!(ft.fleets[1].fleet_name, "South pit");
        assert_eq!(ft.fleets[0].equipment[0].equipment_name, "Truck 01");
        assert_eq!(ft.fleets[0].equipment[1].equipment_name, "Truck 02");
    }

    #[tokio::test]
    async fn test_equipment_nho_is_single_unit_nominal() {
        let report = build(two_fleet_snapshot()).await;
        let fleet = &report.fleet_types[0].fleets[0];
        assert!((fleet.equipment[0].month.nominal_hours - 744.0).abs() < 1e-9);
        assert!((fleet.month.nominal_hours - 1488.0).abs() < 1e-9);
    }
}
