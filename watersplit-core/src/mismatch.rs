//! Severity tiers for the main/sub-meter discrepancy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MismatchStatus {
    #[serde(rename = "ok")]
    Ok,
    #[serde(rename = "warning")]
    Warning,
    #[serde(rename = "investigate")]
    Investigate,
}

impl MismatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchStatus::Ok => "ok",
            MismatchStatus::Warning => "warning",
            MismatchStatus::Investigate => "investigate",
        }
    }
}

/// Classify a mismatch by absolute volume OR relative fraction.
///
/// Both tests run on absolute values and either passing is enough to avoid
/// escalation: on a small main reading the percentage is noisy, on a large
/// one the volume is. The fraction may be absent (no main reading).
pub fn mismatch_status(mismatch_m3: f64, mismatch_pct: Option<f64>) -> MismatchStatus {
    let abs_m3 = mismatch_m3.abs();
    let abs_pct = mismatch_pct.map(f64::abs);

    if abs_m3 <= 1.0 || abs_pct.is_some_and(|pct| pct <= 0.05) {
        return MismatchStatus::Ok;
    }
    if abs_m3 <= 3.0 || abs_pct.is_some_and(|pct| pct <= 0.10) {
        return MismatchStatus::Warning;
    }
    MismatchStatus::Investigate
}
