//! Observing sites and deep-sky targets, with built-in presets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An observing site: coordinates plus the baseline zenith sky brightness
/// of its Bortle class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Baseline SQM for the site's Bortle class, mag/arcsec² (17–22).
    pub base_sqm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_m: Option<f64>,
    /// True for user-entered sites, false for presets.
    #[serde(default)]
    pub custom: bool,
}

impl Site {
    /// Build a custom site from raw coordinates, validating ranges.
    pub fn custom(lat: f64, lon: f64, base_sqm: f64) -> Result<Self, SiteError> {
        let site = Self {
            id: format!("{:.4},{:.4}", lat, lon),
            name: format!("{:.4}, {:.4}", lat, lon),
            lat,
            lon,
            base_sqm,
            elevation_m: None,
            custom: true,
        };
        site.validate()?;
        Ok(site)
    }

    pub fn validate(&self) -> Result<(), SiteError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(SiteError::Latitude(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(SiteError::Longitude(self.lon));
        }
        if !(17.0..=22.0).contains(&self.base_sqm) {
            return Err(SiteError::BaseSqm(self.base_sqm));
        }
        Ok(())
    }
}

/// Site validation errors.
#[derive(Debug)]
pub enum SiteError {
    Latitude(f64),
    Longitude(f64),
    BaseSqm(f64),
}

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latitude(v) => write!(f, "Latitude must be within -90..90, got {}", v),
            Self::Longitude(v) => write!(f, "Longitude must be within -180..180, got {}", v),
            Self::BaseSqm(v) => {
                write!(f, "Base SQM must be within 17..22 mag/arcsec², got {}", v)
            }
        }
    }
}

impl std::error::Error for SiteError {}

/// A deep-sky target by catalogue coordinates. The core only ever consumes
/// the alt/az derived from these per instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    /// Right ascension, degrees.
    pub ra_deg: f64,
    /// Declination, degrees.
    pub dec_deg: f64,
}

// ─── Built-in presets ───────────────────────────────────────────

struct BuiltinSite {
    names: &'static [&'static str], // canonical id + aliases
    display: &'static str,
    lat: f64,
    lon: f64,
    base_sqm: f64,
    elevation_m: f64,
}

const BUILTIN_SITES: &[BuiltinSite] = &[
    BuiltinSite {
        names: &["binh-minh", "binh minh", "hanoi"],
        display: "Bình Minh, Hà Nội",
        lat: 20.866, lon: 105.783, base_sqm: 19.5, elevation_m: 15.0,
    },
    BuiltinSite {
        names: &["cao-dai", "cao dai"],
        display: "Cao Đại, Vĩnh Phúc",
        lat: 21.216, lon: 105.483, base_sqm: 20.2, elevation_m: 12.0,
    },
    BuiltinSite {
        names: &["dong-van", "dong van", "ha giang"],
        display: "Đồng Văn, Hà Giang",
        lat: 23.272, lon: 105.363, base_sqm: 21.6, elevation_m: 1000.0,
    },
    BuiltinSite {
        names: &["sapa", "sa-pa", "sa pa"],
        display: "Sa Pa, Lào Cai",
        lat: 22.336, lon: 103.844, base_sqm: 21.2, elevation_m: 1600.0,
    },
    BuiltinSite {
        names: &["da-lat", "da lat", "dalat"],
        display: "Đà Lạt, Lâm Đồng",
        lat: 11.942, lon: 108.458, base_sqm: 20.8, elevation_m: 1500.0,
    },
    BuiltinSite {
        names: &["ha-long", "ha long", "halong"],
        display: "Hạ Long, Quảng Ninh",
        lat: 20.959, lon: 107.044, base_sqm: 19.0, elevation_m: 5.0,
    },
    BuiltinSite {
        names: &["mui-ne", "mui ne"],
        display: "Mũi Né, Bình Thuận",
        lat: 10.933, lon: 108.287, base_sqm: 20.4, elevation_m: 5.0,
    },
    BuiltinSite {
        names: &["pu-luong", "pu luong"],
        display: "Pù Luông, Thanh Hóa",
        lat: 20.428, lon: 104.986, base_sqm: 21.0, elevation_m: 1000.0,
    },
];

struct BuiltinTarget {
    names: &'static [&'static str],
    display: &'static str,
    ra: f64,
    dec: f64,
}

const BUILTIN_TARGETS: &[BuiltinTarget] = &[
    BuiltinTarget {
        names: &["m42", "orion", "orion nebula"],
        display: "M42 — Orion Nebula",
        ra: 83.82, dec: -5.39,
    },
    BuiltinTarget {
        names: &["m31", "andromeda"],
        display: "M31 — Andromeda Galaxy",
        ra: 10.68, dec: 41.27,
    },
    BuiltinTarget {
        names: &["m45", "pleiades"],
        display: "M45 — Pleiades",
        ra: 56.75, dec: 24.12,
    },
    BuiltinTarget {
        names: &["m13", "hercules"],
        display: "M13 — Hercules Cluster",
        ra: 250.42, dec: 36.46,
    },
    BuiltinTarget {
        names: &["m8", "lagoon"],
        display: "M8 — Lagoon Nebula",
        ra: 271.10, dec: -24.38,
    },
    BuiltinTarget {
        names: &["ngc7000", "ngc 7000", "north america"],
        display: "NGC 7000 — North America Nebula",
        ra: 314.75, dec: 44.53,
    },
    BuiltinTarget {
        names: &["m33", "triangulum"],
        display: "M33 — Triangulum Galaxy",
        ra: 23.46, dec: 30.66,
    },
    BuiltinTarget {
        names: &["sgr-a", "sgr a", "milky way", "galactic center"],
        display: "Milky Way Core (Sgr A*)",
        ra: 266.42, dec: -29.0,
    },
];

/// Look up a preset dark-sky site by id or alias (case-insensitive).
pub fn builtin_site(query: &str) -> Option<Site> {
    let q = query.trim().to_lowercase();
    BUILTIN_SITES
        .iter()
        .find(|s| s.names.contains(&q.as_str()))
        .map(|s| Site {
            id: s.names[0].to_string(),
            name: s.display.to_string(),
            lat: s.lat,
            lon: s.lon,
            base_sqm: s.base_sqm,
            elevation_m: Some(s.elevation_m),
            custom: false,
        })
}

/// Canonical ids of all preset sites, for CLI help output.
pub fn builtin_site_ids() -> Vec<&'static str> {
    BUILTIN_SITES.iter().map(|s| s.names[0]).collect()
}

/// Look up a preset deep-sky target by name or alias (case-insensitive).
pub fn builtin_target(query: &str) -> Option<Target> {
    let q = query.trim().to_lowercase();
    BUILTIN_TARGETS
        .iter()
        .find(|t| t.names.contains(&q.as_str()))
        .map(|t| Target {
            name: t.display.to_string(),
            ra_deg: t.ra,
            dec_deg: t.dec,
        })
}

/// Canonical ids of all preset targets.
pub fn builtin_target_ids() -> Vec<&'static str> {
    BUILTIN_TARGETS.iter().map(|t| t.names[0]).collect()
}
