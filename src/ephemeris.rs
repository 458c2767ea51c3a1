//! Built-in analytic sun/moon ephemeris.
//!
//! Sun altitude comes from a simplified SPA (Solar Position Algorithm);
//! the moon from a truncated Jean Meeus "Astronomical Algorithms" Ch. 47
//! series. Accuracy is on the order of 0.1°, far tighter than the
//! twilight-veto and moon-interference models downstream require.
//! Illuminated fraction is derived from the Sun–Moon elongation.

use crate::celestial::{CelestialSnapshot, Ephemeris};
use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};
use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// The default ephemeris implementation. Stateless; safe to share.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeeusEphemeris;

impl Ephemeris for MeeusEphemeris {
    fn celestial(&self, lat: f64, lon: f64, instant: DateTime<Utc>) -> CelestialSnapshot {
        let dt = instant.naive_utc();
        let (moon_alt_deg, moon_az_deg) = moon_horizontal(&dt, lat, lon);
        CelestialSnapshot {
            sun_alt_deg: sun_altitude(&dt, lat, lon),
            moon_alt_deg,
            moon_az_deg,
            moon_illumination: moon_illumination(&dt),
        }
    }
}

// ─── Time scales ────────────────────────────────────────────────

/// Convert a NaiveDateTime (UTC) to Julian Date.
pub fn julian_date(dt: &NaiveDateTime) -> f64 {
    let y = dt.year() as f64;
    let m = dt.month() as f64;
    let d = dt.day() as f64;
    let h = dt.hour() as f64 + dt.minute() as f64 / 60.0 + dt.second() as f64 / 3600.0;

    let (y2, m2) = if m <= 2.0 { (y - 1.0, m + 12.0) } else { (y, m) };

    let a = (y2 / 100.0_f64).floor();
    let b = 2.0 - a + (a / 4.0_f64).floor();

    (365.25_f64 * (y2 + 4716.0)).floor()
        + (30.6001_f64 * (m2 + 1.0)).floor()
        + d
        + h / 24.0
        + b
        - 1524.5
}

fn julian_century(jd: f64) -> f64 {
    (jd - 2451545.0) / 36525.0
}

fn normalize_degrees(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d < 0.0 {
        d += 360.0;
    }
    d
}

// ─── Sun ────────────────────────────────────────────────────────

fn sun_mean_longitude(t: f64) -> f64 {
    normalize_degrees(280.46646 + t * (36000.76983 + t * 0.0003032))
}

fn sun_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(357.52911 + t * (35999.05029 - t * 0.0001537))
}

fn earth_eccentricity(t: f64) -> f64 {
    0.016708634 - t * (0.000042037 + t * 0.0000001267)
}

fn sun_equation_of_center(t: f64) -> f64 {
    let m = sun_mean_anomaly(t) * DEG;
    m.sin() * (1.914602 - t * (0.004817 + t * 0.000014))
        + (2.0 * m).sin() * (0.019993 - t * 0.000101)
        + (3.0 * m).sin() * 0.000289
}

fn sun_apparent_longitude(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    sun_mean_longitude(t) + sun_equation_of_center(t) - 0.00569 - 0.00478 * (omega * DEG).sin()
}

fn mean_obliquity(t: f64) -> f64 {
    23.0 + (26.0 + (21.448 - t * (46.815 + t * (0.00059 - t * 0.001813))) / 60.0) / 60.0
}

fn obliquity_corrected(t: f64) -> f64 {
    let omega = 125.04 - 1934.136 * t;
    mean_obliquity(t) + 0.00256 * (omega * DEG).cos()
}

fn solar_declination(t: f64) -> f64 {
    let e = obliquity_corrected(t) * DEG;
    let lambda = sun_apparent_longitude(t) * DEG;
    (e.sin() * lambda.sin()).asin() / DEG
}

/// Equation of time, minutes.
fn equation_of_time(t: f64) -> f64 {
    let e = obliquity_corrected(t) * DEG;
    let l0 = sun_mean_longitude(t) * DEG;
    let ecc = earth_eccentricity(t);
    let m = sun_mean_anomaly(t) * DEG;

    let y = (e / 2.0).tan().powi(2);
    let eq = y * (2.0 * l0).sin() - 2.0 * ecc * m.sin()
        + 4.0 * ecc * y * m.sin() * (2.0 * l0).cos()
        - 0.5 * y * y * (4.0 * l0).sin()
        - 1.25 * ecc * ecc * (2.0 * m).sin();

    4.0 * eq / DEG
}

/// Geometric sun altitude in degrees for a UTC instant and observer.
pub fn sun_altitude(dt: &NaiveDateTime, lat: f64, lon: f64) -> f64 {
    let jd = julian_date(dt);
    let t = julian_century(jd);

    let decl = solar_declination(t) * DEG;
    let eqt = equation_of_time(t);

    let clock_minutes =
        dt.hour() as f64 * 60.0 + dt.minute() as f64 + dt.second() as f64 / 60.0;
    let solar_minutes = clock_minutes + eqt + 4.0 * lon;
    let hour_angle = (solar_minutes / 4.0 - 180.0) * DEG;

    let lat_r = lat * DEG;
    let sin_alt = lat_r.sin() * decl.sin() + lat_r.cos() * decl.cos() * hour_angle.cos();
    sin_alt.asin() / DEG
}

// ─── Moon ───────────────────────────────────────────────────────

// Leading periodic terms for lunar longitude and distance (Meeus Table
// 47.A, truncated). Entries: (D, M, M', F, coeff_l [1e-6 deg], coeff_r [1e-3 km]).
const MOON_TERMS_LR: [(f64, f64, f64, f64, f64, f64); 14] = [
    (0.0, 0.0, 1.0, 0.0, 6288774.0, -20905355.0),
    (2.0, 0.0, -1.0, 0.0, 1274027.0, -3699111.0),
    (2.0, 0.0, 0.0, 0.0, 658314.0, -2955968.0),
    (0.0, 0.0, 2.0, 0.0, 213618.0, -569925.0),
    (0.0, 1.0, 0.0, 0.0, -185116.0, 48888.0),
    (0.0, 0.0, 0.0, 2.0, -114332.0, -3149.0),
    (2.0, 0.0, -2.0, 0.0, 58793.0, 246158.0),
    (2.0, -1.0, -1.0, 0.0, 57066.0, -152138.0),
    (2.0, 0.0, 1.0, 0.0, 53322.0, -170733.0),
    (2.0, -1.0, 0.0, 0.0, 45758.0, -204586.0),
    (0.0, 1.0, -1.0, 0.0, -40923.0, -129620.0),
    (1.0, 0.0, 0.0, 0.0, -34720.0, 108743.0),
    (0.0, 1.0, 1.0, 0.0, -30383.0, 104755.0),
    (2.0, 0.0, 0.0, -2.0, 15327.0, 10321.0),
];

// Leading periodic terms for lunar latitude (Meeus Table 47.B, truncated).
// Entries: (D, M, M', F, coeff_b [1e-6 deg]).
const MOON_TERMS_B: [(f64, f64, f64, f64, f64); 10] = [
    (0.0, 0.0, 0.0, 1.0, 5128122.0),
    (0.0, 0.0, 1.0, 1.0, 280602.0),
    (0.0, 0.0, 1.0, -1.0, 277693.0),
    (2.0, 0.0, 0.0, -1.0, 173237.0),
    (2.0, 0.0, -1.0, 1.0, 55413.0),
    (2.0, 0.0, -1.0, -1.0, 46271.0),
    (2.0, 0.0, 0.0, 1.0, 32573.0),
    (0.0, 0.0, 2.0, 1.0, 17198.0),
    (2.0, 0.0, 1.0, -1.0, 9266.0),
    (0.0, 0.0, 2.0, -1.0, 8822.0),
];

fn moon_mean_longitude(t: f64) -> f64 {
    normalize_degrees(218.3164477 + 481267.88123421 * t - 0.0015786 * t * t)
}

fn moon_mean_elongation(t: f64) -> f64 {
    normalize_degrees(297.8501921 + 445267.1114034 * t - 0.0018819 * t * t)
}

fn moon_mean_anomaly(t: f64) -> f64 {
    normalize_degrees(134.9633964 + 477198.8675055 * t + 0.0087414 * t * t)
}

fn moon_argument_of_latitude(t: f64) -> f64 {
    normalize_degrees(93.2720950 + 483202.0175233 * t - 0.0036539 * t * t)
}

/// Ecliptic coordinates of the moon: (longitude°, latitude°, distance km).
fn moon_ecliptic(t: f64) -> (f64, f64, f64) {
    let lp = moon_mean_longitude(t);
    let d = moon_mean_elongation(t);
    let m = sun_mean_anomaly(t);
    let mp = moon_mean_anomaly(t);
    let f = moon_argument_of_latitude(t);

    // Earth eccentricity factor for terms involving the solar anomaly
    let e = 1.0 - 0.002516 * t - 0.0000074 * t * t;

    let mut sum_l = 0.0;
    let mut sum_r = 0.0;
    for &(td, tm, tmp, tf, cl, cr) in &MOON_TERMS_LR {
        let arg = (td * d + tm * m + tmp * mp + tf * f) * DEG;
        let e_factor = match tm.abs() as i32 {
            1 => e,
            2 => e * e,
            _ => 1.0,
        };
        sum_l += cl * e_factor * arg.sin();
        sum_r += cr * e_factor * arg.cos();
    }

    let mut sum_b = 0.0;
    for &(td, tm, tmp, tf, cb) in &MOON_TERMS_B {
        let arg = (td * d + tm * m + tmp * mp + tf * f) * DEG;
        let e_factor = match tm.abs() as i32 {
            1 => e,
            2 => e * e,
            _ => 1.0,
        };
        sum_b += cb * e_factor * arg.sin();
    }

    let longitude = normalize_degrees(lp + sum_l / 1_000_000.0);
    let latitude = sum_b / 1_000_000.0;
    let distance = 385000.56 + sum_r / 1000.0;

    (longitude, latitude, distance)
}

// ─── Coordinate transforms ──────────────────────────────────────

/// Local sidereal time in degrees for a JD and east longitude.
fn local_sidereal_time(jd: f64, lon: f64) -> f64 {
    let t = julian_century(jd);
    let gmst = normalize_degrees(
        280.46061837 + 360.98564736629 * (jd - 2451545.0) + 0.000387933 * t * t,
    );
    normalize_degrees(gmst + lon)
}

/// Ecliptic → equatorial. Returns (right ascension°, declination°).
fn ecliptic_to_equatorial(lon: f64, lat: f64, obliquity: f64) -> (f64, f64) {
    let lon_r = lon * DEG;
    let lat_r = lat * DEG;
    let obl_r = obliquity * DEG;

    let sin_ra = lon_r.sin() * obl_r.cos() - lat_r.tan() * obl_r.sin();
    let ra = normalize_degrees(sin_ra.atan2(lon_r.cos()) / DEG);

    let sin_dec = lat_r.sin() * obl_r.cos() + lat_r.cos() * obl_r.sin() * lon_r.sin();
    let dec = sin_dec.asin() / DEG;

    (ra, dec)
}

/// Equatorial (RA/Dec, degrees) → horizontal (altitude/azimuth, degrees)
/// for an observer and UTC instant. This is how a deep-sky target's
/// catalogue coordinates become the alt/az the scoring core consumes.
pub fn equatorial_to_horizontal(
    ra: f64,
    dec: f64,
    lat: f64,
    lon: f64,
    instant: DateTime<Utc>,
) -> (f64, f64) {
    let jd = julian_date(&instant.naive_utc());
    let lst = local_sidereal_time(jd, lon);

    let ha = normalize_degrees(lst - ra) * DEG;
    let dec_r = dec * DEG;
    let lat_r = lat * DEG;

    let sin_alt = lat_r.sin() * dec_r.sin() + lat_r.cos() * dec_r.cos() * ha.cos();
    let alt_r = sin_alt.clamp(-1.0, 1.0).asin();

    let cos_az = (dec_r.sin() - sin_alt * lat_r.sin()) / (alt_r.cos() * lat_r.cos());
    let az = cos_az.clamp(-1.0, 1.0).acos() / DEG;
    let azimuth = if ha.sin() > 0.0 { 360.0 - az } else { az };

    (alt_r / DEG, azimuth)
}

/// Topocentric moon altitude and azimuth in degrees.
///
/// Applies the parallax-in-altitude correction (up to ~0.95° for the moon);
/// no refraction — the optics model handles refraction separately.
pub fn moon_horizontal(dt: &NaiveDateTime, lat: f64, lon: f64) -> (f64, f64) {
    let jd = julian_date(dt);
    let t = julian_century(jd);

    let (moon_lon, moon_lat, distance) = moon_ecliptic(t);
    let (ra, dec) = ecliptic_to_equatorial(moon_lon, moon_lat, obliquity_corrected(t));

    let instant = DateTime::<Utc>::from_naive_utc_and_offset(*dt, Utc);
    let (geo_alt, az) = equatorial_to_horizontal(ra, dec, lat, lon, instant);

    let horizontal_parallax = (6378.14 / distance).asin();
    let topo_alt = geo_alt - horizontal_parallax * (geo_alt * DEG).cos() / DEG;

    (topo_alt, az)
}

/// Sun–Moon elongation in degrees (0° at new moon, ~180° at full moon).
pub fn moon_sun_elongation(dt: &NaiveDateTime) -> f64 {
    let jd = julian_date(dt);
    let t = julian_century(jd);

    let (moon_lon, moon_lat, _) = moon_ecliptic(t);
    let sun_lon = sun_apparent_longitude(t);

    let d_lon = (moon_lon - sun_lon) * DEG;
    let cos_elong = (moon_lat * DEG).cos() * d_lon.cos();
    cos_elong.clamp(-1.0, 1.0).acos() / DEG
}

/// Illuminated fraction of the lunar disc, 0.0–1.0.
///
/// Uses the far-sun approximation (phase angle ≈ 180° − elongation), which
/// is accurate to well under 1% of the fraction.
pub fn moon_illumination(dt: &NaiveDateTime) -> f64 {
    let elongation = moon_sun_elongation(dt) * DEG;
    ((1.0 - elongation.cos()) / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_meeus_example_47a() {
        // Meeus Example 47.a: 1992 April 12, 0h TD
        // Expected: longitude ~133.17°, latitude ~-3.23°, distance ~368409 km
        let dt = at(1992, 4, 12, 0, 0);
        let t = julian_century(julian_date(&dt));
        let (lon, lat, dist) = moon_ecliptic(t);

        assert!(
            (lon - 133.17).abs() < 0.5,
            "moon longitude: expected ~133.17°, got {:.2}°",
            lon
        );
        assert!(
            (lat - (-3.23)).abs() < 0.5,
            "moon latitude: expected ~-3.23°, got {:.2}°",
            lat
        );
        assert!(
            (dist - 368409.0).abs() < 2000.0,
            "moon distance: expected ~368409 km, got {:.0} km",
            dist
        );
    }

    #[test]
    fn test_sun_altitude_cairo_equinox() {
        // Cairo (30.04°N) at local solar noon on the equinox: altitude ≈ 60°
        let dt = at(2024, 3, 20, 10, 0); // ~noon local solar time at 31.2°E
        let alt = sun_altitude(&dt, 30.0444, 31.2357);
        assert!(
            (alt - 60.0).abs() < 2.0,
            "equinox noon altitude should be ~60°, got {:.2}°",
            alt
        );
    }

    #[test]
    fn test_sun_below_horizon_at_night() {
        let dt = at(2024, 3, 20, 22, 0); // ~midnight local at Cairo
        let alt = sun_altitude(&dt, 30.0444, 31.2357);
        assert!(alt < -18.0, "sun should be well below horizon, got {:.2}°", alt);
    }

    #[test]
    fn test_full_moon_nearly_fully_lit() {
        // Jan 13, 2025 is approximately a full moon
        let dt = at(2025, 1, 13, 12, 0);
        let illum = moon_illumination(&dt);
        assert!(illum > 0.95, "full moon illumination should be ~1, got {:.3}", illum);
    }

    #[test]
    fn test_new_moon_nearly_dark() {
        // New moon conjunction around Feb 17, 2026
        let dt = at(2026, 2, 17, 12, 0);
        let illum = moon_illumination(&dt);
        assert!(illum < 0.05, "new moon illumination should be ~0, got {:.3}", illum);
    }

    #[test]
    fn test_moon_horizontal_in_range() {
        let dt = at(2026, 2, 18, 15, 30);
        let (alt, az) = moon_horizontal(&dt, 21.4225, 39.8262);
        assert!((-90.0..=90.0).contains(&alt));
        assert!((0.0..=360.0).contains(&az));
    }

    #[test]
    fn test_polaris_altitude_matches_latitude() {
        // Polaris (RA 37.95°, Dec 89.26°) sits within ~1° of the observer's
        // latitude from any northern site, at any time.
        let instant = DateTime::<Utc>::from_naive_utc_and_offset(at(2026, 8, 25, 3, 0), Utc);
        let (alt, _az) = equatorial_to_horizontal(37.95, 89.26, 45.0, 10.0, instant);
        assert!(
            (alt - 45.0).abs() < 1.5,
            "Polaris altitude should track latitude, got {:.2}°",
            alt
        );
    }

    #[test]
    fn test_snapshot_fields_sane() {
        let eph = MeeusEphemeris;
        let instant = DateTime::<Utc>::from_naive_utc_and_offset(at(2026, 3, 1, 18, 0), Utc);
        let snap = eph.celestial(20.866, 105.783, instant);
        assert!((-90.0..=90.0).contains(&snap.sun_alt_deg));
        assert!((-90.0..=90.0).contains(&snap.moon_alt_deg));
        assert!((0.0..=360.0).contains(&snap.moon_az_deg));
        assert!((0.0..=1.0).contains(&snap.moon_illumination));
    }
}
