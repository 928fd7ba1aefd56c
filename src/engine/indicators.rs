//! Derived reliability indicators.
//!
//! Pure formulas, no I/O. Every division is guarded: a zero denominator yields
//! 0 rather than NaN/infinity, so downstream rollups and serialization never
//! see non-finite values. Percent-valued outputs keep full precision here;
//! rounding to 2 decimals happens only at the API boundary.

use serde::{Deserialize, Serialize};

use super::aggregate::{DowntimeSplit, RawTotals};

/// Inputs to one indicator evaluation: raw sums for a scope plus that scope's
/// nominal hours and the (currently zero) downtime split.
#[derive(Debug, Clone, Copy)]
pub struct RawInputs {
    /// Failure downtime hours.
    pub him: f64,
    /// Operating hours.
    pub hrm: f64,
    /// Incident count.
    pub ni: u64,
    /// Nominal available hours for the scope and window.
    pub nominal_hours: f64,
    pub split: DowntimeSplit,
}

impl RawInputs {
    pub fn new(raw: RawTotals, nominal_hours: f64, split: DowntimeSplit) -> Self {
        Self {
            him: raw.him,
            hrm: raw.hrm,
            ni: raw.ni,
            nominal_hours,
            split,
        }
    }
}

/// Derived indicators for one scope and window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    /// Idle hours remaining: NHO − (HIM + HRM).
    pub hrd: f64,
    /// Mean time to repair: HIM / NI.
    pub mttr: f64,
    /// Scheduled-downtime share of HIM, percent: (TP + VS) / HIM × 100.
    pub sw: f64,
    /// Availability, percent: (1 − HIM / NHO) × 100.
    pub disp: f64,
    /// Usage rate, percent: HRM / NHO × 100.
    pub tdm: f64,
    /// Mean time between failures: HRM / NI.
    pub mtbf: f64,
    /// Utilization, percent: HRM / (HRM + HRD) × 100.
    pub util: f64,
}

/// Evaluate the indicator set for one scope.
pub fn derive_indicators(input: &RawInputs) -> Indicators {
    let RawInputs {
        him,
        hrm,
        ni,
        nominal_hours: nho,
        split,
    } = *input;
    let ni = ni as f64;

    let hrd = nho - (him + hrm);
    let mttr = if ni == 0.0 { 0.0 } else { him / ni };
    let sw = if him == 0.0 {
        0.0
    } else {
        (split.tp + split.vs) / him * 100.0
    };
    let disp = if nho == 0.0 {
        0.0
    } else {
        (1.0 - him / nho) * 100.0
    };
    let tdm = if nho == 0.0 { 0.0 } else { hrm / nho * 100.0 };
    let mtbf = if ni == 0.0 { 0.0 } else { hrm / ni };
    let util = if hrm + hrd == 0.0 {
        0.0
    } else {
        hrm / (hrm + hrd) * 100.0
    };

    Indicators {
        hrd,
        mttr,
        sw,
        disp,
        tdm,
        mtbf,
        util,
    }
}

/// Round to 2 decimals for presentation. Boundary use only.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Indicators {
    /// Presentation copy with percent fields (and hour/ratio fields) rounded.
    pub fn rounded(&self) -> Self {
        Self {
            hrd: round2(self.hrd),
            mttr: round2(self.mttr),
            sw: round2(self.sw),
            disp: round2(self.disp),
            tdm: round2(self.tdm),
            mtbf: round2(self.mtbf),
            util: round2(self.util),
        }
    }
}
