//! Failure breakdown with global-share coefficients.
//!
//! Two sequential passes over the failure log, restricted to active
//! equipment. Pass 1 sums grand totals (NI and HIM) for the month and the
//! year-to-date window across the whole scope. Pass 2 computes, for every
//! (FailureType → Fleet → FailureCategory) leaf, its raw quantities and its
//! percent share of the pass-1 totals. The passes are deliberately separate:
//! pass 2 needs pass 1's completed totals.
//!
//! Rollup matches the historical system: intermediate nodes sum their
//! children's coefficients. Summed percentages stop being a share of one
//! global total, so every node also carries its summed raw NI/HIM per window —
//! a rigorous share can always be recomputed from those without re-querying.

use std::collections::HashMap;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;

use super::aggregate::aggregate_raw;
use super::indicators::round2;
use super::window::ReportWindow;
use super::QueryCtx;
use crate::error::EngineError;
use crate::types::{Equipment, FailureCategory};

/// Grand totals over the whole scope (pass 1 output).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GlobalTotals {
    pub ni_month: u64,
    pub him_month: f64,
    pub ni_year: u64,
    pub him_year: f64,
}

/// Raw NI/HIM for one node, month and year windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BreakdownRaw {
    pub ni_month: u64,
    pub him_month: f64,
    pub ni_year: u64,
    pub him_year: f64,
}

impl BreakdownRaw {
    fn absorb(&mut self, other: BreakdownRaw) {
        self.ni_month += other.ni_month;
        self.him_month += other.him_month;
        self.ni_year += other.ni_year;
        self.him_year += other.him_year;
    }
}

/// Percent shares of the global totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CoefficientSet {
    pub ni_month: f64,
    pub him_month: f64,
    pub ni_year: f64,
    pub him_year: f64,
}

impl CoefficientSet {
    fn absorb(&mut self, other: CoefficientSet) {
        self.ni_month += other.ni_month;
        self.him_month += other.him_month;
        self.ni_year += other.ni_year;
        self.him_year += other.him_year;
    }

    fn rounded(&self) -> Self {
        Self {
            ni_month: round2(self.ni_month),
            him_month: round2(self.him_month),
            ni_year: round2(self.ni_year),
            him_year: round2(self.him_year),
        }
    }
}

fn share(value: f64, global: f64) -> f64 {
    if global == 0.0 {
        0.0
    } else {
        value / global * 100.0
    }
}

/// Leaf node: one failure category within one fleet.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    pub category_id: String,
    pub category_name: String,
    pub raw: BreakdownRaw,
    pub coefficients: CoefficientSet,
}

/// Fleet node: sum of its category leaves.
#[derive(Debug, Clone, Serialize)]
pub struct FleetBreakdown {
    pub fleet_id: String,
    pub fleet_name: String,
    pub raw: BreakdownRaw,
    pub coefficients: CoefficientSet,
    pub categories: Vec<CategoryBreakdown>,
}

/// Failure-type node: sum of its fleet nodes.
#[derive(Debug, Clone, Serialize)]
pub struct FailureTypeBreakdown {
    pub failure_type_id: String,
    pub failure_type_name: String,
    pub raw: BreakdownRaw,
    pub coefficients: CoefficientSet,
    pub fleets: Vec<FleetBreakdown>,
}

/// The full two-pass breakdown report.
#[derive(Debug, Clone, Serialize)]
pub struct FailureBreakdownReport {
    pub month: u32,
    pub year: i32,
    pub global: GlobalTotals,
    pub failure_types: Vec<FailureTypeBreakdown>,
}

impl FailureBreakdownReport {
    /// Presentation copy with coefficients rounded to 2 decimals.
    pub fn rounded(&self) -> Self {
        Self {
            month: self.month,
            year: self.year,
            global: self.global,
            failure_types: self
                .failure_types
                .iter()
                .map(|ft| FailureTypeBreakdown {
                    failure_type_id: ft.failure_type_id.clone(),
                    failure_type_name: ft.failure_type_name.clone(),
                    raw: ft.raw,
                    coefficients: ft.coefficients.rounded(),
                    fleets: ft
                        .fleets
                        .iter()
                        .map(|f| FleetBreakdown {
                            fleet_id: f.fleet_id.clone(),
                            fleet_name: f.fleet_name.clone(),
                            raw: f.raw,
                            coefficients: f.coefficients.rounded(),
                            categories: f
                                .categories
                                .iter()
                                .map(|c| CategoryBreakdown {
                                    category_id: c.category_id.clone(),
                                    category_name: c.category_name.clone(),
                                    raw: c.raw,
                                    coefficients: c.coefficients.rounded(),
                                })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Compute one (fleet, category) leaf: raw quantities for both windows plus
/// their shares of the pass-1 totals.
async fn category_leaf(
    ctx: &QueryCtx<'_>,
    window: &ReportWindow,
    global: GlobalTotals,
    member_ids: &[String],
    category: &FailureCategory,
) -> Result<CategoryBreakdown, EngineError> {
    let month = aggregate_raw(
        ctx,
        member_ids,
        window.month_start,
        window.month_end,
        Some(category.id.as_str()),
    )
    .await?;
    let year = aggregate_raw(
        ctx,
        member_ids,
        window.year_start,
        window.year_end,
        Some(category.id.as_str()),
    )
    .await?;

    let raw = BreakdownRaw {
        ni_month: month.ni,
        him_month: month.him,
        ni_year: year.ni,
        him_year: year.him,
    };
    Ok(CategoryBreakdown {
        category_id: category.id.clone(),
        category_name: category.name.clone(),
        raw,
        coefficients: CoefficientSet {
            ni_month: share(raw.ni_month as f64, global.ni_month as f64),
            him_month: share(raw.him_month, global.him_month),
            ni_year: share(raw.ni_year as f64, global.ni_year as f64),
            him_year: share(raw.him_year, global.him_year),
        },
    })
}

/// Build the failure breakdown for one reporting period.
pub(crate) async fn build_failure_breakdown(
    ctx: &QueryCtx<'_>,
    window: &ReportWindow,
) -> Result<FailureBreakdownReport, EngineError> {
    let equipment = ctx.run(ctx.store.list_equipment(true)).await?;
    let fleets = ctx.run(ctx.store.list_fleets()).await?;
    let categories = ctx.run(ctx.store.list_failure_categories()).await?;
    let failure_types = ctx.run(ctx.store.list_failure_types()).await?;

    let all_ids: Vec<String> = equipment.iter().map(|e| e.id.clone()).collect();

    // Pass 1: grand totals over the entire active scope, both windows.
    let month_raw = aggregate_raw(ctx, &all_ids, window.month_start, window.month_end, None).await?;
    let year_raw = aggregate_raw(ctx, &all_ids, window.year_start, window.year_end, None).await?;
    let global = GlobalTotals {
        ni_month: month_raw.ni,
        him_month: month_raw.him,
        ni_year: year_raw.ni,
        him_year: year_raw.him,
    };

    // Pass 2: per-leaf raw quantities and their shares of the pass-1 totals.
    let mut fleet_members: HashMap<&str, Vec<&Equipment>> = HashMap::new();
    for e in &equipment {
        fleet_members.entry(e.fleet_id.as_str()).or_default().push(e);
    }

    let mut sorted_fleets: Vec<_> = fleets.iter().collect();
    sorted_fleets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    let mut sorted_types: Vec<_> = failure_types.iter().collect();
    sorted_types.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    let mut sorted_categories: Vec<_> = categories.iter().collect();
    sorted_categories.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let mut type_nodes = Vec::new();
    for failure_type in sorted_types {
        let mut fleet_nodes = Vec::new();
        let mut type_raw = BreakdownRaw::default();
        let mut type_coeff = CoefficientSet::default();

        for fleet in &sorted_fleets {
            let Some(members) = fleet_members.get(fleet.id.as_str()) else {
                continue;
            };
            let member_ids: Vec<String> = members.iter().map(|e| e.id.clone()).collect();

            let applicable: Vec<_> = sorted_categories
                .iter()
                .filter(|c| c.failure_type_id == failure_type.id)
                .filter(|c| c.fleet_ids.iter().any(|f| f == &fleet.id))
                .collect();
            if applicable.is_empty() {
                continue;
            }

            let leaf_futures: Vec<_> = applicable
                .iter()
                .map(|category| category_leaf(ctx, window, global, &member_ids, category))
                .collect();
            let leaves: Vec<CategoryBreakdown> = stream::iter(leaf_futures)
                .buffered(ctx.max_concurrency)
                .try_collect()
                .await?;

            let mut fleet_raw = BreakdownRaw::default();
            let mut fleet_coeff = CoefficientSet::default();
            for leaf in &leaves {
                fleet_raw.absorb(leaf.raw);
                fleet_coeff.absorb(leaf.coefficients);
            }

            type_raw.absorb(fleet_raw);
            type_coeff.absorb(fleet_coeff);
            fleet_nodes.push(FleetBreakdown {
                fleet_id: fleet.id.clone(),
                fleet_name: fleet.name.clone(),
                raw: fleet_raw,
                coefficients: fleet_coeff,
                categories: leaves,
            });
        }

        if fleet_nodes.is_empty() {
            continue;
        }
        type_nodes.push(FailureTypeBreakdown {
            failure_type_id: failure_type.id.clone(),
            failure_type_name: failure_type.name.clone(),
            raw: type_raw,
            coefficients: type_coeff,
            fleets: fleet_nodes,
        });
    }

    Ok(FailureBreakdownReport {
        month: window.month,
        year: window.year,
        global,
        failure_types: type_nodes,
    })
}
