//! Forecast providers: Open-Meteo for the meteorological series and
//! 7Timer! ASTRO for the seeing/transparency indices.
//!
//! Both endpoints are free and keyless. The 3-hourly ASTRO points are
//! stretched over the hourly meteorological grid (each index covers the
//! three hours it was issued for).

use crate::forecast::{ForecastSeries, HourlySample};
use chrono::NaiveDateTime;
use serde::Deserialize;

const METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const ASTRO_URL: &str = "https://www.7timer.info/bin/astro.php";
const USER_AGENT: &str = "skyscore/0.3";

/// Provider failures. Network and decode errors carry the underlying
/// message; an empty hourly series is its own case so callers can tell
/// "provider down" from "provider returned nothing".
#[derive(Debug)]
pub enum ProviderError {
    Network(String),
    InvalidResponse(String),
    EmptySeries,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Forecast request failed: {}", e),
            Self::InvalidResponse(e) => write!(f, "Unexpected forecast response: {}", e),
            Self::EmptySeries => write!(f, "Provider returned an empty forecast"),
        }
    }
}

impl std::error::Error for ProviderError {}

// ─── Wire formats ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MeteoResponse {
    timezone: String,
    hourly: MeteoHourly,
}

/// Open-Meteo returns parallel arrays keyed by the hourly variable names.
#[derive(Debug, Deserialize)]
struct MeteoHourly {
    time: Vec<String>,
    cloud_cover: Vec<f64>,
    #[serde(default)]
    cloud_cover_low: Vec<f64>,
    #[serde(default)]
    cloud_cover_mid: Vec<f64>,
    #[serde(default)]
    cloud_cover_high: Vec<f64>,
    relative_humidity_2m: Vec<f64>,
    temperature_2m: Vec<f64>,
    dew_point_2m: Vec<f64>,
    #[serde(rename = "wind_speed_500hPa")]
    wind_speed_500hpa: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct AstroResponse {
    dataseries: Vec<AstroPoint>,
}

/// One 3-hourly 7Timer! ASTRO point. Only the two index fields matter.
#[derive(Debug, Deserialize)]
struct AstroPoint {
    seeing: f64,
    transparency: f64,
}

// ─── Merge ──────────────────────────────────────────────────────

/// Middle-of-the-road indices used when the ASTRO series is unavailable.
const FALLBACK_INDEX: f64 = 3.0;

fn merge_series(meteo: MeteoResponse, astro: Option<AstroResponse>) -> Result<ForecastSeries, ProviderError> {
    let h = &meteo.hourly;
    if h.time.is_empty() {
        return Err(ProviderError::EmptySeries);
    }

    let n = h.time.len();
    for (name, len) in [
        ("cloud_cover", h.cloud_cover.len()),
        ("relative_humidity_2m", h.relative_humidity_2m.len()),
        ("temperature_2m", h.temperature_2m.len()),
        ("dew_point_2m", h.dew_point_2m.len()),
        ("wind_speed_500hPa", h.wind_speed_500hpa.len()),
    ] {
        if len != n {
            return Err(ProviderError::InvalidResponse(format!(
                "hourly array '{}' has {} entries, expected {}",
                name, len, n
            )));
        }
    }

    let astro_points = astro.map(|a| a.dataseries).unwrap_or_default();

    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let time = NaiveDateTime::parse_from_str(&h.time[i], "%Y-%m-%dT%H:%M")
            .map_err(|e| ProviderError::InvalidResponse(format!("bad timestamp '{}': {}", h.time[i], e)))?;

        // ASTRO is 3-hourly; reuse the last point past the end of its run
        let (seeing, transparency) = if astro_points.is_empty() {
            (FALLBACK_INDEX, FALLBACK_INDEX)
        } else {
            let p = &astro_points[(i / 3).min(astro_points.len() - 1)];
            (p.seeing, p.transparency)
        };

        samples.push(HourlySample {
            time,
            cloud_cover: h.cloud_cover[i],
            cloud_cover_low: h.cloud_cover_low.get(i).copied().unwrap_or(0.0),
            cloud_cover_mid: h.cloud_cover_mid.get(i).copied().unwrap_or(0.0),
            cloud_cover_high: h.cloud_cover_high.get(i).copied().unwrap_or(0.0),
            humidity: h.relative_humidity_2m[i],
            temperature_c: h.temperature_2m[i],
            dew_point_c: h.dew_point_2m[i],
            wind_500hpa_kmh: h.wind_speed_500hpa[i],
            seeing_index: seeing,
            transparency_index: transparency,
            aqi: None,
            aod: None,
        });
    }

    Ok(ForecastSeries { timezone: meteo.timezone, samples })
}

// ─── Fetch ──────────────────────────────────────────────────────

/// Fetch and merge the 7-day forecast for a site.
///
/// The meteorological series is required; a failed ASTRO request degrades
/// to the fallback indices rather than failing the whole fetch.
pub fn fetch_forecast(lat: f64, lon: f64) -> Result<ForecastSeries, ProviderError> {
    let meteo_url = format!(
        "{}?latitude={:.4}&longitude={:.4}\
         &hourly=cloud_cover,cloud_cover_low,cloud_cover_mid,cloud_cover_high,\
relative_humidity_2m,temperature_2m,dew_point_2m,wind_speed_500hPa\
         &timezone=auto&forecast_days=7",
        METEO_URL, lat, lon
    );

    let meteo: MeteoResponse = ureq::get(&meteo_url)
        .set("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| ProviderError::Network(e.to_string()))?
        .into_json()
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    let astro_url = format!(
        "{}?lon={:.3}&lat={:.3}&ac=0&unit=metric&output=json&tzshift=0",
        ASTRO_URL, lon, lat
    );

    let astro: Option<AstroResponse> = ureq::get(&astro_url)
        .set("User-Agent", USER_AGENT)
        .call()
        .ok()
        .and_then(|resp| resp.into_json().ok());

    merge_series(meteo, astro)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    const METEO_JSON: &str = r#"{
        "timezone": "Asia/Bangkok",
        "hourly": {
            "time": ["2026-01-05T00:00", "2026-01-05T01:00", "2026-01-05T02:00", "2026-01-05T03:00"],
            "cloud_cover": [10.0, 20.0, 30.0, 40.0],
            "cloud_cover_low": [5.0, 10.0, 15.0, 20.0],
            "cloud_cover_mid": [3.0, 6.0, 9.0, 12.0],
            "cloud_cover_high": [2.0, 4.0, 6.0, 8.0],
            "relative_humidity_2m": [60.0, 62.0, 64.0, 66.0],
            "temperature_2m": [12.0, 11.5, 11.0, 10.5],
            "dew_point_2m": [4.0, 4.2, 4.4, 4.6],
            "wind_speed_500hPa": [25.0, 28.0, 31.0, 34.0]
        }
    }"#;

    const ASTRO_JSON: &str = r#"{
        "dataseries": [
            {"seeing": 2, "transparency": 3},
            {"seeing": 4, "transparency": 5}
        ]
    }"#;

    fn meteo() -> MeteoResponse {
        serde_json::from_str(METEO_JSON).unwrap()
    }

    fn astro() -> AstroResponse {
        serde_json::from_str(ASTRO_JSON).unwrap()
    }

    #[test]
    fn test_merge_aligns_hourly_and_three_hourly() {
        let series = merge_series(meteo(), Some(astro())).unwrap();
        assert_eq!(series.timezone, "Asia/Bangkok");
        assert_eq!(series.samples.len(), 4);

        // Hours 0-2 take the first ASTRO point, hour 3 the second
        assert_eq!(series.samples[0].seeing_index, 2.0);
        assert_eq!(series.samples[2].seeing_index, 2.0);
        assert_eq!(series.samples[3].seeing_index, 4.0);
        assert_eq!(series.samples[3].transparency_index, 5.0);
    }

    #[test]
    fn test_merge_parses_times_and_fields() {
        let series = merge_series(meteo(), Some(astro())).unwrap();
        let s = &series.samples[1];
        assert_eq!(s.time.hour(), 1);
        assert_eq!(s.cloud_cover, 20.0);
        assert_eq!(s.humidity, 62.0);
        assert_eq!(s.wind_500hpa_kmh, 28.0);
        assert!(s.aqi.is_none());
        assert!(s.aod.is_none());
    }

    #[test]
    fn test_merge_without_astro_uses_fallback_indices() {
        let series = merge_series(meteo(), None).unwrap();
        assert!(series.samples.iter().all(|s| s.seeing_index == FALLBACK_INDEX));
        assert!(series.samples.iter().all(|s| s.transparency_index == FALLBACK_INDEX));
    }

    #[test]
    fn test_merge_reuses_last_astro_point_past_its_run() {
        let short = AstroResponse {
            dataseries: vec![serde_json::from_str(r#"{"seeing": 7, "transparency": 6}"#).unwrap()],
        };
        let series = merge_series(meteo(), Some(short)).unwrap();
        assert_eq!(series.samples[3].seeing_index, 7.0);
    }

    #[test]
    fn test_empty_hourly_series_is_error() {
        let empty: MeteoResponse = serde_json::from_str(
            r#"{"timezone": "UTC", "hourly": {
                "time": [], "cloud_cover": [], "relative_humidity_2m": [],
                "temperature_2m": [], "dew_point_2m": [], "wind_speed_500hPa": []
            }}"#,
        )
        .unwrap();
        assert!(matches!(merge_series(empty, None), Err(ProviderError::EmptySeries)));
    }

    #[test]
    fn test_mismatched_array_lengths_rejected() {
        let mut m = meteo();
        m.hourly.cloud_cover.pop();
        let err = merge_series(m, None).unwrap_err();
        assert!(err.to_string().contains("cloud_cover"));
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let mut m = meteo();
        m.hourly.time[0] = "yesterday".to_string();
        let err = merge_series(m, None).unwrap_err();
        assert!(err.to_string().contains("bad timestamp"));
    }
}
