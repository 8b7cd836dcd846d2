//! True-up settlement: proportional allocation of a provider correction.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Outcome of a true-up split. Transient, like [`crate::SplitResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrueupResult {
    pub share_1: f64,
    pub share_2: f64,
    pub total_use: f64,
}

/// Split a correction amount strictly proportionally to usage.
///
/// The amount may be positive (extra charge) or negative (credit). The
/// usages here are an already-settled aggregate over prior periods; there is
/// no main-meter comparison and no mismatch concept at this stage.
pub fn compute_trueup(s1_use: f64, s2_use: f64, trueup_amount: f64) -> Result<TrueupResult> {
    if s1_use < 0.0 || s2_use < 0.0 {
        bail!("Sub-meter usage cannot be negative.");
    }
    let total_use = s1_use + s2_use;
    if total_use <= 0.0 {
        bail!("Total usage must be greater than 0.");
    }

    Ok(TrueupResult {
        share_1: trueup_amount * (s1_use / total_use),
        share_2: trueup_amount * (s2_use / total_use),
        total_use,
    })
}
