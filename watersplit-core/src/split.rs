//! Billing-period split: fee allocation across two sub-metered occupants,
//! with optional main-meter mismatch correction.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the delta between the main meter and the sub-meter sum is allocated.
///
/// Closed set: adding a policy is a code change, not configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MismatchPolicy {
    /// Mismatch is display-only; raw sub-meter usages are billed.
    #[serde(rename = "ignore")]
    Ignore,
    /// The delta is split equally between both occupants.
    #[serde(rename = "half")]
    Half,
    /// The delta follows each occupant's share of the sub-meter sum.
    #[serde(rename = "proportional")]
    Proportional,
}

impl MismatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchPolicy::Ignore => "ignore",
            MismatchPolicy::Half => "half",
            MismatchPolicy::Proportional => "proportional",
        }
    }

    /// Whether this policy needs a positive main-meter reading.
    pub fn requires_main(&self) -> bool {
        matches!(self, MismatchPolicy::Half | MismatchPolicy::Proportional)
    }
}

impl fmt::Display for MismatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MismatchPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "ignore" => Ok(MismatchPolicy::Ignore),
            "half" => Ok(MismatchPolicy::Half),
            "proportional" => Ok(MismatchPolicy::Proportional),
            other => bail!("unknown mismatch policy: {other}"),
        }
    }
}

/// Outcome of one billing-period split.
///
/// Transient: copied into a history entry or shown to the user, never
/// persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitResult {
    pub adj_s1_use: f64,
    pub adj_s2_use: f64,
    pub usage_share_1: f64,
    pub usage_share_2: f64,
    /// Each occupant's half of the basic fees.
    pub basic_share: f64,
    pub total_1: f64,
    pub total_2: f64,
    /// Main usage minus sub-meter sum; `None` without a positive main reading.
    pub mismatch_m3: Option<f64>,
    /// Mismatch as a fraction of main usage; `None` alongside `mismatch_m3`.
    pub mismatch_pct: Option<f64>,
}

/// Compute the two-occupant allocation for one billing period.
///
/// Basic fees are always split 50/50. Usage fees follow each occupant's
/// share of the *adjusted* usage total, so a mismatch correction changes who
/// pays for the unaccounted variance. Pure function; validation failures are
/// errors with a message naming the violated invariant.
pub fn compute_split(
    s1_use: f64,
    s2_use: f64,
    basic_fees: f64,
    usage_fees: f64,
    mismatch_policy: MismatchPolicy,
    main_use: Option<f64>,
) -> Result<SplitResult> {
    if s1_use < 0.0 || s2_use < 0.0 {
        bail!("Sub-meter usage cannot be negative.");
    }
    let sub_sum = s1_use + s2_use;
    if sub_sum <= 0.0 {
        bail!("Total sub-meter usage must be greater than 0.");
    }

    if mismatch_policy.requires_main() {
        match main_use {
            Some(main) if main > 0.0 => {}
            _ => bail!("Main meter usage must be greater than 0."),
        }
    }

    let (mismatch_m3, mismatch_pct) = match main_use {
        Some(main) if main > 0.0 => (Some(main - sub_sum), Some((main - sub_sum) / main)),
        _ => (None, None),
    };

    let (adj_s1_use, adj_s2_use) = match (mismatch_policy, mismatch_m3) {
        (MismatchPolicy::Half, Some(diff)) => (s1_use + diff / 2.0, s2_use + diff / 2.0),
        (MismatchPolicy::Proportional, Some(diff)) => (
            s1_use + diff * (s1_use / sub_sum),
            s2_use + diff * (s2_use / sub_sum),
        ),
        _ => (s1_use, s2_use),
    };

    if adj_s1_use < 0.0 || adj_s2_use < 0.0 {
        bail!("Adjusted usage became negative.");
    }

    let adj_total = adj_s1_use + adj_s2_use;
    let usage_share_1 = usage_fees * (adj_s1_use / adj_total);
    let usage_share_2 = usage_fees * (adj_s2_use / adj_total);
    let basic_share = basic_fees / 2.0;

    Ok(SplitResult {
        adj_s1_use,
        adj_s2_use,
        usage_share_1,
        usage_share_2,
        basic_share,
        total_1: basic_share + usage_share_1,
        total_2: basic_share + usage_share_2,
        mismatch_m3,
        mismatch_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_ignore_keeps_raw_usages() {
        let result = compute_split(30.0, 20.0, 100.0, 200.0, MismatchPolicy::Ignore, Some(55.0))
            .unwrap();
        assert!(approx(result.adj_s1_use, 30.0));
        assert!(approx(result.adj_s2_use, 20.0));
        assert!(approx(result.total_1 + result.total_2, 300.0));
        // Mismatch is still reported for display.
        assert!(approx(result.mismatch_m3.unwrap(), 5.0));
    }

    #[test]
    fn test_half_splits_delta_evenly() {
        let result = compute_split(30.0, 20.0, 100.0, 200.0, MismatchPolicy::Half, Some(60.0))
            .unwrap();
        assert!(approx(result.adj_s1_use, 35.0));
        assert!(approx(result.adj_s2_use, 25.0));
    }

    #[test]
    fn test_proportional_follows_raw_shares() {
        let result = compute_split(
            30.0,
            20.0,
            100.0,
            200.0,
            MismatchPolicy::Proportional,
            Some(60.0),
        )
        .unwrap();
        assert!(approx(result.adj_s1_use, 36.0));
        assert!(approx(result.adj_s2_use, 24.0));
        // Adjusted usages absorb the full main reading.
        assert!(approx(result.adj_s1_use + result.adj_s2_use, 60.0));
    }

    #[test]
    fn test_usage_fees_conserved_under_ignore() {
        let result = compute_split(12.5, 7.5, 84.03, 222.13, MismatchPolicy::Ignore, None)
            .unwrap();
        assert!(approx(result.usage_share_1 + result.usage_share_2, 222.13));
        assert!(approx(result.basic_share, 42.015));
        assert!(result.mismatch_m3.is_none());
        assert!(result.mismatch_pct.is_none());
    }

    #[test]
    fn test_negative_usage_rejected() {
        let err = compute_split(-1.0, 20.0, 100.0, 200.0, MismatchPolicy::Ignore, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Sub-meter usage cannot be negative.");
    }

    #[test]
    fn test_zero_total_rejected() {
        let err = compute_split(0.0, 0.0, 100.0, 200.0, MismatchPolicy::Ignore, None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Total sub-meter usage must be greater than 0."
        );
    }

    #[test]
    fn test_half_requires_main_reading() {
        let err = compute_split(30.0, 20.0, 100.0, 200.0, MismatchPolicy::Half, None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Main meter usage must be greater than 0.");

        let err = compute_split(30.0, 20.0, 100.0, 200.0, MismatchPolicy::Proportional, Some(0.0))
            .unwrap_err();
        assert_eq!(err.to_string(), "Main meter usage must be greater than 0.");
    }

    #[test]
    fn test_pathological_adjustment_rejected() {
        // Main reading far below the sub-meter sum drives one adjusted usage
        // negative under the half policy.
        let err = compute_split(50.0, 1.0, 100.0, 200.0, MismatchPolicy::Half, Some(10.0))
            .unwrap_err();
        assert_eq!(err.to_string(), "Adjusted usage became negative.");
    }

    #[test]
    fn test_policy_round_trips_through_serde() {
        let json = serde_json::to_string(&MismatchPolicy::Proportional).unwrap();
        assert_eq!(json, "\"proportional\"");
        let back: MismatchPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, MismatchPolicy::Proportional);
        assert_eq!("half".parse::<MismatchPolicy>().unwrap(), MismatchPolicy::Half);
        assert!("both".parse::<MismatchPolicy>().is_err());
    }
}
