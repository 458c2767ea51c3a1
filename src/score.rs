//! Quality scoring: a fixed-allocation point budget with hard vetoes.
//!
//! Vetoes short-circuit to a zero score; otherwise five components add up
//! to at most 100 points on a 40/20/20/10/10 split (cloud, transparency,
//! sky darkness, seeing, dew margin).

use serde::{Deserialize, Serialize};

/// Cloud cover above this percentage vetoes the hour outright.
pub const CLOUD_VETO_PERCENT: f64 = 70.0;
/// Sun altitude must be below this for the sky to count as dark.
pub const ASTRONOMICAL_TWILIGHT_DEG: f64 = -18.0;

/// SQM range normalised into the sky-darkness component.
const SQM_FLOOR: f64 = 17.0;
const SQM_CEILING: f64 = 22.0;

/// Instantaneous inputs to the scorer. All values are already resolved —
/// the scorer does no physics of its own.
#[derive(Debug, Clone, Copy)]
pub struct QualityInput {
    /// Total cloud cover, percent.
    pub cloud_cover: f64,
    /// Sun altitude, degrees.
    pub sun_alt_deg: f64,
    /// Beer-Lambert transparency, percent.
    pub transparency_percent: f64,
    /// Moon- and extinction-adjusted sky brightness, mag/arcsec².
    pub dynamic_sqm: f64,
    /// Seeing on the 0–100 higher-is-better scale (see [`seeing_score`]).
    pub seeing_score: f64,
    /// Temperature minus dew point, °C.
    pub delta_temp_dew_c: f64,
}

/// Scorer verdict. Invariant: `vetoed` implies `score == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityResult {
    pub score: u8,
    pub vetoed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veto_reason: Option<String>,
}

impl QualityResult {
    fn veto(reason: &str) -> Self {
        Self {
            score: 0,
            vetoed: true,
            veto_reason: Some(reason.to_string()),
        }
    }
}

/// Compute the observability quality score for one timestep.
///
/// Hard vetoes are checked first: cloud cover strictly above 70%, or a sun
/// that has not yet passed astronomical twilight. The point allocation is
/// fixed at 40/20/20/10/10 and deliberately does NOT read the
/// user-configurable [`ScoreWeights`] — an inherited product inconsistency
/// that is preserved, not silently repaired.
pub fn quality_score(input: &QualityInput) -> QualityResult {
    if input.cloud_cover > CLOUD_VETO_PERCENT {
        return QualityResult::veto("Cloud cover > 70%");
    }
    if input.sun_alt_deg > ASTRONOMICAL_TWILIGHT_DEG {
        return QualityResult::veto("Sun is above astronomical twilight (-18°)");
    }

    let cloud_pts = (40.0 * (1.0 - input.cloud_cover / CLOUD_VETO_PERCENT)).max(0.0);
    let transparency_pts = 20.0 * (input.transparency_percent / 100.0);

    let sqm_norm =
        ((input.dynamic_sqm - SQM_FLOOR) / (SQM_CEILING - SQM_FLOOR)).clamp(0.0, 1.0);
    let sqm_pts = 20.0 * sqm_norm;

    let seeing_pts = 10.0 * (input.seeing_score / 100.0);

    // Dew margin: saturated at ΔT ≥ 5 °C, zero at ΔT ≤ 1 °C, linear between
    let dew_norm = if input.delta_temp_dew_c >= 5.0 {
        1.0
    } else if input.delta_temp_dew_c > 1.0 {
        (input.delta_temp_dew_c - 1.0) / 4.0
    } else {
        0.0
    };
    let dew_pts = 10.0 * dew_norm;

    let total = (cloud_pts + transparency_pts + sqm_pts + seeing_pts + dew_pts).round();
    QualityResult {
        score: total.clamp(0.0, 100.0) as u8,
        vetoed: false,
        veto_reason: None,
    }
}

/// Convert the 1–8 astro-forecast seeing index (1 = excellent, 8 = very
/// poor) to the 0–100 higher-is-better scale the scorer consumes.
pub fn seeing_score(index: f64) -> f64 {
    (100.0 - (index - 1.0) * 14.0).max(0.0)
}

// ─── User-configurable weights ──────────────────────────────────

/// Display weights for the five score components.
///
/// These are user-facing configuration only: they are validated and echoed
/// in output, but [`quality_score`] ignores them in favour of its fixed
/// allocation. The mismatch is inherited from the product definition and
/// kept on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub cloud: f64,
    pub transparency: f64,
    pub sky_darkness: f64,
    pub seeing: f64,
    pub dew_margin: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            cloud: 35.0,
            transparency: 20.0,
            sky_darkness: 20.0,
            seeing: 15.0,
            dew_margin: 10.0,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.cloud + self.transparency + self.sky_darkness + self.seeing + self.dew_margin
    }

    /// Weights should sum to 100; a small drift is tolerated for display.
    pub fn is_balanced(&self) -> bool {
        (self.sum() - 100.0).abs() < 0.5
    }

    /// Reject negative components. Sum imbalance is reported separately
    /// via [`ScoreWeights::is_balanced`] — it is a warning, not an error.
    pub fn validate(&self) -> Result<(), WeightError> {
        for (name, value) in [
            ("cloud", self.cloud),
            ("transparency", self.transparency),
            ("sky_darkness", self.sky_darkness),
            ("seeing", self.seeing),
            ("dew_margin", self.dew_margin),
        ] {
            if value < 0.0 {
                return Err(WeightError::Negative { component: name, value });
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum WeightError {
    Negative { component: &'static str, value: f64 },
}

impl std::fmt::Display for WeightError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Negative { component, value } => {
                write!(f, "Weight '{}' must be non-negative, got {}", component, value)
            }
        }
    }
}

impl std::error::Error for WeightError {}
