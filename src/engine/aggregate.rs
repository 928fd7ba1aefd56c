//! Raw quantity aggregation over a time window.
//!
//! Sums the dense daily series (HRM), the failure log downtime (HIM), and the
//! incident row count (NI) for a set of equipment, optionally restricted to
//! one failure category. Pure read; an empty equipment set short-circuits to
//! zero totals without touching the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::QueryCtx;
use crate::error::EngineError;

/// Raw sums for one scope and window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTotals {
    /// Failure downtime hours.
    pub him: f64,
    /// Operating hours.
    pub hrm: f64,
    /// Incident count (row count, never a field sum).
    pub ni: u64,
}

impl RawTotals {
    /// Fold another scope's totals into this one.
    pub fn absorb(&mut self, other: RawTotals) {
        self.him += other.him;
        self.hrm += other.hrm;
        self.ni += other.ni;
    }
}

/// Downtime sub-categories referenced by the SW formula.
///
/// No data source populates these today; they are threaded explicitly so a
/// future source can be wired in without touching the formula code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DowntimeSplit {
    /// Planned/preventive downtime hours.
    pub tp: f64,
    /// Service-visit downtime hours.
    pub vs: f64,
}

/// Aggregate HIM/HRM/NI for a set of equipment over `[start, end]`.
pub(crate) async fn aggregate_raw(
    ctx: &QueryCtx<'_>,
    equipment_ids: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    category_id: Option<&str>,
) -> Result<RawTotals, EngineError> {
    if equipment_ids.is_empty() {
        return Ok(RawTotals::default());
    }

    let (hrm, him, ni) = futures::try_join!(
        ctx.run(ctx.store.sum_operating_hours(equipment_ids, start, end)),
        ctx.run(ctx.store.sum_failure_hours(equipment_ids, start, end, category_id)),
        ctx.run(ctx.store.count_failure_events(equipment_ids, start, end, category_id)),
    )?;

    Ok(RawTotals { him, hrm, ni })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{ctx_parts, fixture_store};
    use crate::store::Snapshot;
    use crate::types::{FailureEvent, OperatingReading};
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_empty_equipment_set_yields_zero_without_querying() {
        let store = fixture_store(Snapshot::default());
        let (timeout, cancel) = ctx_parts();
        let ctx = QueryCtx {
            store: &store,
            timeout,
            cancel: &cancel,
            max_concurrency: 4,
        };

        let totals = aggregate_raw(&ctx, &[], ts(2024, 3, 1), ts(2024, 3, 31), None)
            .await
            .unwrap();
        assert_eq!(totals, RawTotals::default());
    }

    #[tokio::test]
    async fn test_aggregates_all_three_quantities() {
        let snapshot = Snapshot {
            readings: vec![
                OperatingReading {
                    equipment_id: "E1".into(),
                    date: "2024-03-05".parse().unwrap(),
                    operating_hours: 8.0,
                    hour_meter: 0.0,
                },
                OperatingReading {
                    equipment_id: "E1".into(),
                    date: "2024-03-06".parse().unwrap(),
                    operating_hours: 6.5,
                    hour_meter: 0.0,
                },
            ],
            failures: vec![
                FailureEvent {
                    equipment_id: "E1".into(),
                    date: "2024-03-05".parse().unwrap(),
                    downtime_hours: 3.0,
                    category_id: "CAT-A".into(),
                    notes: String::new(),
                },
                FailureEvent {
                    equipment_id: "E1".into(),
                    date: "2024-03-06".parse().unwrap(),
                    downtime_hours: 1.5,
                    category_id: "CAT-B".into(),
                    notes: String::new(),
                },
            ],
            ..Snapshot::default()
        };
        let store = fixture_store(snapshot);
        let (timeout, cancel) = ctx_parts();
        let ctx = QueryCtx {
            store: &store,
            timeout,
            cancel: &cancel,
            max_concurrency: 4,
        };

        let ids = vec!["E1".to_string()];
        let all = aggregate_raw(&ctx, &ids, ts(2024, 3, 1), ts(2024, 3, 31), None)
            .await
            .unwrap();
        assert!((all.hrm - 14.5).abs() < 1e-9);
        assert!((all.him - 4.5).abs() < 1e-9);
        assert_eq!(all.ni, 2);

        let cat_a = aggregate_raw(&ctx, &ids, ts(2024, 3, 1), ts(2024, 3, 31), Some("CAT-A"))
            .await
            .unwrap();
        assert!((cat_a.him - 3.0).abs() < 1e-9);
        assert_eq!(cat_a.ni, 1);
        // HRM is never category-scoped.
        assert!((cat_a.hrm - 14.5).abs() < 1e-9);
    }
}
