//! Celestial geometry: angular separation on the sky and the pluggable
//! sun/moon position source consumed by the forecast aggregator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// Sun and moon state at one instant, as seen from an observing site.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CelestialSnapshot {
    /// Sun altitude, degrees (negative below the horizon).
    pub sun_alt_deg: f64,
    /// Moon altitude, degrees.
    pub moon_alt_deg: f64,
    /// Moon azimuth, degrees east of north.
    pub moon_az_deg: f64,
    /// Illuminated fraction of the lunar disc, 0.0–1.0.
    pub moon_illumination: f64,
}

/// A source of sun/moon positions for arbitrary (lat, lon, instant).
///
/// The scoring core never computes positions itself; it consumes whatever
/// implementation the caller supplies (the built-in analytic one, or a
/// fixed stub in tests).
pub trait Ephemeris {
    fn celestial(&self, lat: f64, lon: f64, instant: DateTime<Utc>) -> CelestialSnapshot;
}

/// Ephemeris stub returning the same snapshot for every query.
/// Used by tests and what-if runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedEphemeris(pub CelestialSnapshot);

impl Ephemeris for FixedEphemeris {
    fn celestial(&self, _lat: f64, _lon: f64, _instant: DateTime<Utc>) -> CelestialSnapshot {
        self.0
    }
}

/// Angular separation between two objects given horizontal coordinates,
/// via the spherical law of cosines. Returns degrees.
///
/// Azimuths may be any real value (the cosine of the difference is
/// periodic). The acos argument is clamped to [−1, 1] to guard against
/// floating-point overshoot at near-identical positions.
pub fn angular_separation(alt_a: f64, az_a: f64, alt_b: f64, az_b: f64) -> f64 {
    let alt_a_r = alt_a * DEG;
    let alt_b_r = alt_b * DEG;
    let az_diff_r = (az_a - az_b) * DEG;

    let cos_sep =
        alt_a_r.sin() * alt_b_r.sin() + alt_a_r.cos() * alt_b_r.cos() * az_diff_r.cos();
    cos_sep.clamp(-1.0, 1.0).acos() / DEG
}
