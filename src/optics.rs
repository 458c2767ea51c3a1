//! Atmospheric optics models for night-sky quality assessment.
//!
//! Covers Beer-Lambert extinction, the modified Krisciunas-Schaefer (2001)
//! lunar sky-brightness penalty, Saemundsson (1986) refraction, the empirical
//! 500 hPa jet-stream scintillation thresholds, and the aerosol optical depth
//! priority resolver. All functions are pure and tolerant: out-of-range
//! inputs are clamped or passed through rather than rejected, because a
//! partial physical estimate is more useful to a forecast consumer than a
//! hard failure.

use serde::Serialize;
use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// Fallback aerosol optical depth when neither an override nor a
/// measurement is available.
pub const DEFAULT_AOD: f64 = 0.1;

/// ICAO standard sea-level pressure, hPa.
pub const STANDARD_PRESSURE_HPA: f64 = 1013.25;
/// Reference air temperature for refraction, °C.
pub const STANDARD_TEMP_C: f64 = 10.0;

// ─── Beer-Lambert transparency ──────────────────────────────────

/// Extinction coefficient and the resulting zenith transparency.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Transparency {
    /// Extinction coefficient k, magnitudes per airmass.
    pub k: f64,
    /// Fraction of incident light surviving one airmass, percent.
    pub percent: f64,
}

/// True atmospheric transparency from the Beer-Lambert law.
///
/// `k = 0.15 + 0.001·aqi + 0.002·max(0, humidity − 60) + aod`. The humidity
/// term only engages above 60% RH, where hygroscopic haze growth begins.
pub fn transparency(aqi: f64, humidity: f64, aod: f64) -> Transparency {
    let humidity_term = if humidity > 60.0 {
        0.002 * (humidity - 60.0)
    } else {
        0.0
    };
    let k = 0.15 + 0.001 * aqi + humidity_term + aod;
    let percent = ((-k).exp() * 100.0).clamp(0.0, 100.0);
    Transparency { k, percent }
}

// ─── Dynamic SQM (modified Krisciunas-Schaefer) ─────────────────

/// Sky brightness at the target, mag/arcsec², after moonlight and
/// extinction penalties.
///
/// The lunar penalty `illum · sin(moon_alt) · k · 5.0` vanishes when the
/// moon is at or below the horizon, and is amplified by angular proximity
/// to the target through `1 + (180/(ρ+10))²`. The +10° offset bounds the
/// multiplier analytically (≈325 at ρ=0); no additional cap is applied.
/// The result is clamped to ≥0 only — it can never exceed `base_sqm`
/// because both penalty terms are non-negative.
pub fn dynamic_sqm(
    base_sqm: f64,
    moon_alt_deg: f64,
    moon_illumination: f64,
    k: f64,
    separation_deg: f64,
    target_airmass: f64,
) -> f64 {
    let base_penalty = if moon_alt_deg > 0.0 {
        moon_illumination * (moon_alt_deg * DEG).sin() * k * 5.0
    } else {
        0.0
    };
    let proximity = 1.0 + (180.0 / (separation_deg + 10.0)).powi(2);
    let target_penalty = base_penalty * proximity;
    (base_sqm - target_penalty - 1.25 * k * target_airmass).max(0.0)
}

/// Plane-parallel airmass for a target altitude.
///
/// `1 / sin(alt)`, capped at 38 (the horizontal airmass of a curved
/// atmosphere). At or below the horizon the cap itself is returned.
pub fn airmass(altitude_deg: f64) -> f64 {
    const HORIZONTAL_AIRMASS: f64 = 38.0;
    if altitude_deg <= 0.0 {
        return HORIZONTAL_AIRMASS;
    }
    (1.0 / (altitude_deg * DEG).sin()).min(HORIZONTAL_AIRMASS)
}

// ─── Saemundsson refraction ─────────────────────────────────────

/// Chromatic dispersion severity near the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispersionLevel {
    None,
    /// Below 15° altitude an ADC corrector is recommended.
    Moderate,
    /// Below 5° dispersion reaches 15–30″; imaging is impractical.
    Severe,
}

impl std::fmt::Display for DispersionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Moderate => write!(f, "moderate"),
            Self::Severe => write!(f, "severe"),
        }
    }
}

/// Refraction estimate for a target altitude.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Refraction {
    /// Apparent lift of the target, arcminutes.
    pub arcmin: f64,
    pub dispersion_warning: bool,
    pub dispersion_level: DispersionLevel,
}

/// Saemundsson's refraction formula, pressure- and temperature-corrected:
///
/// `R = 1.02 / tan(alt + 10.3/(alt + 5.11)) · (P/1010) · (283/(273+T))`
///
/// Objects below the horizon get zero refraction and no warning; the
/// formula is undefined there and the caller has nothing to image anyway.
pub fn refraction(altitude_deg: f64, pressure_hpa: f64, temp_c: f64) -> Refraction {
    if altitude_deg < 0.0 {
        return Refraction {
            arcmin: 0.0,
            dispersion_warning: false,
            dispersion_level: DispersionLevel::None,
        };
    }

    let r0 = 1.02 / ((altitude_deg + 10.3 / (altitude_deg + 5.11)) * DEG).tan();
    let correction = (pressure_hpa / 1010.0) * (283.0 / (273.0 + temp_c));

    let dispersion_level = if altitude_deg < 5.0 {
        DispersionLevel::Severe
    } else if altitude_deg < 15.0 {
        DispersionLevel::Moderate
    } else {
        DispersionLevel::None
    };

    Refraction {
        arcmin: r0 * correction,
        dispersion_warning: dispersion_level != DispersionLevel::None,
        dispersion_level,
    }
}

// ─── Jet-stream scintillation risk ──────────────────────────────

/// Risk band for high-altitude wind shear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JetStreamLevel {
    Good,
    Moderate,
    High,
    Severe,
}

impl std::fmt::Display for JetStreamLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Good => write!(f, "good"),
            Self::Moderate => write!(f, "moderate"),
            Self::High => write!(f, "high"),
            Self::Severe => write!(f, "severe"),
        }
    }
}

/// Scintillation assessment from the 500 hPa wind speed.
#[derive(Debug, Clone, Serialize)]
pub struct JetStreamRisk {
    pub level: JetStreamLevel,
    /// Expected FWHM star-image bloat, arcseconds.
    pub fwhm_bloat_arcsec: f64,
    pub message: String,
    /// Display hint for downstream consumers.
    pub color_hint: &'static str,
}

/// Empirical jet-stream thresholds (amateur astrophotography community):
/// <30 km/h negligible, 30–60 moderate, 60–90 high, ≥90 severe.
/// A pure lookup table — no interpolation between bands.
pub fn jet_stream_risk(wind_500hpa_kmh: f64) -> JetStreamRisk {
    if wind_500hpa_kmh < 30.0 {
        JetStreamRisk {
            level: JetStreamLevel::Good,
            fwhm_bloat_arcsec: 0.0,
            message: "Jet stream weak — seeing stable".to_string(),
            color_hint: "#34d399",
        }
    } else if wind_500hpa_kmh < 60.0 {
        JetStreamRisk {
            level: JetStreamLevel::Moderate,
            fwhm_bloat_arcsec: 1.5,
            message: format!(
                "Moderate jet stream ({:.0} km/h) — seeing mildly degraded",
                wind_500hpa_kmh
            ),
            color_hint: "#fbbf24",
        }
    } else if wind_500hpa_kmh < 90.0 {
        JetStreamRisk {
            level: JetStreamLevel::High,
            fwhm_bloat_arcsec: 3.0,
            message: format!(
                "Strong jet stream ({:.0} km/h) — high-frequency scintillation, planets blurred",
                wind_500hpa_kmh
            ),
            color_hint: "#f97316",
        }
    } else {
        JetStreamRisk {
            level: JetStreamLevel::Severe,
            fwhm_bloat_arcsec: 5.0,
            message: format!(
                "Extreme jet stream ({:.0} km/h) — imaging impractical",
                wind_500hpa_kmh
            ),
            color_hint: "#ef4444",
        }
    }
}

// ─── AOD priority resolver ──────────────────────────────────────

/// Where the resolved AOD value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AodSource {
    Manual,
    Measured,
    Default,
}

impl std::fmt::Display for AodSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Measured => write!(f, "measured"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Aerosol optical depth with provenance.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResolvedAod {
    pub aod: f64,
    pub source: AodSource,
}

/// Select the aerosol optical depth by priority: a non-negative manual
/// override wins, then a non-negative real-time measurement, then the
/// constant default. Negative values are treated as absent and fall
/// through to the next priority.
pub fn resolve_aod(manual_override: Option<f64>, measured: Option<f64>) -> ResolvedAod {
    if let Some(aod) = manual_override {
        if aod >= 0.0 {
            return ResolvedAod { aod, source: AodSource::Manual };
        }
    }
    if let Some(aod) = measured {
        if aod >= 0.0 {
            return ResolvedAod { aod, source: AodSource::Measured };
        }
    }
    ResolvedAod { aod: DEFAULT_AOD, source: AodSource::Default }
}
