//! Forecast aggregation: per-hour quality assessment, best-window search,
//! 7-day daily summaries, ensemble uncertainty, and the ASCII timeline.
//!
//! Everything here is a single linear pass over an already-resolved input
//! series with O(1) auxiliary state. No I/O, no hidden state: re-running
//! on identical inputs yields bit-identical output.

use crate::celestial::{self, Ephemeris};
use crate::ephemeris;
use crate::location::{Site, Target};
use crate::optics::{self, JetStreamRisk, Refraction, ResolvedAod};
use crate::score::{self, QualityInput, ScoreWeights};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The best-window search looks at most this far ahead.
pub const WINDOW_SCAN_HOURS: usize = 72;
/// The daily summary covers at most 7 days of hourly samples.
pub const SUMMARY_SCAN_HOURS: usize = 168;
/// Fixed observation-window length.
pub const WINDOW_DURATION_HOURS: i64 = 2;

/// A sample must beat this score to count toward a window.
const QUALIFYING_SCORE: u8 = 50;
/// Back-to-back qualifying hours required before a peak is accepted.
/// Filters single-hour noise spikes out of the window search.
const MIN_CONSECUTIVE_HOURS: u32 = 2;

/// Assumed air-quality index when no AQ series is configured.
pub const DEFAULT_AQI: f64 = 50.0;

// ─── Input series ───────────────────────────────────────────────

/// One timestep of externally supplied observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlySample {
    /// Provider-local wall time of this sample.
    pub time: NaiveDateTime,
    /// Total cloud cover, percent.
    pub cloud_cover: f64,
    #[serde(default)]
    pub cloud_cover_low: f64,
    #[serde(default)]
    pub cloud_cover_mid: f64,
    #[serde(default)]
    pub cloud_cover_high: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    pub temperature_c: f64,
    pub dew_point_c: f64,
    /// Wind speed at the 500 hPa level (~5500 m), km/h.
    pub wind_500hpa_kmh: f64,
    /// Astro-forecast seeing index, 1 (excellent) to 8 (very poor).
    pub seeing_index: f64,
    /// Astro-forecast transparency index, 1–8.
    pub transparency_index: f64,
    /// Air-quality index, if an AQ series is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aqi: Option<f64>,
    /// Measured aerosol optical depth, if available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aod: Option<f64>,
}

/// A time-ordered hourly forecast, tagged with the IANA timezone its
/// sample times are expressed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub timezone: String,
    pub samples: Vec<HourlySample>,
}

impl ForecastSeries {
    pub fn from_json(json: &str) -> Result<Self, SeriesError> {
        serde_json::from_str(json).map_err(SeriesError::Json)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SeriesError> {
        let raw = std::fs::read_to_string(path).map_err(SeriesError::Io)?;
        Self::from_json(&raw)
    }

    fn tz(&self) -> Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

/// Errors loading a forecast series from JSON.
#[derive(Debug)]
pub enum SeriesError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for SeriesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Cannot read forecast file: {}", e),
            Self::Json(e) => write!(f, "Invalid forecast JSON: {}", e),
        }
    }
}

impl std::error::Error for SeriesError {}

// ─── Output records ─────────────────────────────────────────────

/// Full per-hour verdict with the derived physical quantities.
#[derive(Debug, Clone, Serialize)]
pub struct HourAssessment {
    pub time: NaiveDateTime,
    /// Local hour falls within the 06–18 daytime band.
    pub daytime: bool,
    pub cloud_cover: f64,
    pub score: u8,
    pub vetoed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub veto_reason: Option<String>,
    pub extinction_k: f64,
    pub transparency_percent: f64,
    /// Moon- and extinction-adjusted sky brightness, mag/arcsec².
    pub sqm: f64,
    pub moon_separation_deg: f64,
    pub aod: ResolvedAod,
    pub jet_stream: JetStreamRisk,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_alt_deg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_refraction: Option<Refraction>,
}

/// The best contiguous observation window found in the scan horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObservationWindow {
    pub start: NaiveDateTime,
    /// Always `start` plus the fixed 2-hour duration.
    pub end: NaiveDateTime,
    pub peak_score: u8,
}

/// One calendar day of the 7-day outlook.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Max of the day's positive scores; 0 when every hour scored 0.
    pub peak_score: u8,
    /// Mean cloud cover over all of the day's samples, daytime included.
    pub mean_cloud_cover: f64,
}

/// Ensemble spread of the valid (night, non-vetoed) scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Uncertainty {
    /// Population standard deviation.
    pub sigma: f64,
    /// Sigma relative to the mean score, percent.
    pub sigma_percent: f64,
}

/// Complete aggregation result for one site and series.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub site: Site,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
    /// Display weights echoed for downstream consumers; the scorer itself
    /// uses its fixed allocation (see [`crate::score::quality_score`]).
    pub weights: ScoreWeights,
    pub hours: Vec<HourAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_window: Option<ObservationWindow>,
    pub daily: Vec<DailySummary>,
    pub uncertainty: Uncertainty,
}

// ─── Uncertainty (pure) ─────────────────────────────────────────

/// Population standard deviation of the provided scores, plus the spread
/// relative to the mean. Both are 0 for an empty list, and the percentage
/// is also 0 when the mean is 0 — never a division by zero.
pub fn forecast_uncertainty(scores: &[f64]) -> Uncertainty {
    if scores.is_empty() {
        return Uncertainty { sigma: 0.0, sigma_percent: 0.0 };
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let variance =
        scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / scores.len() as f64;
    let sigma = variance.sqrt();
    let sigma_percent = if mean > 0.0 { 100.0 * sigma / mean } else { 0.0 };
    Uncertainty { sigma, sigma_percent }
}

// ─── The assessor ───────────────────────────────────────────────

/// Combines the optics models, celestial geometry, and the scorer over a
/// forecast series for one site. Holds no mutable state.
pub struct Assessor<'a> {
    site: Site,
    ephemeris: &'a dyn Ephemeris,
    target: Option<Target>,
    aod_override: Option<f64>,
    weights: ScoreWeights,
}

impl<'a> Assessor<'a> {
    pub fn new(site: Site, ephemeris: &'a dyn Ephemeris) -> Self {
        Self {
            site,
            ephemeris,
            target: None,
            aod_override: None,
            weights: ScoreWeights::default(),
        }
    }

    /// Track a deep-sky target; moon separation and refraction are then
    /// evaluated at the target instead of the zenith.
    pub fn with_target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    /// Manual AOD override — wins over any per-sample measurement.
    pub fn with_aod_override(mut self, aod: f64) -> Self {
        self.aod_override = Some(aod);
        self
    }

    /// Display weights echoed into the assessment output.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Interpret a provider-local sample time as a UTC instant.
    fn to_utc(&self, tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
        match tz.from_local_datetime(&local).earliest() {
            Some(dt) => dt.with_timezone(&Utc),
            // DST gap: fall back to treating the wall time as UTC
            None => Utc.from_utc_datetime(&local),
        }
    }

    /// Assess a single timestep: optics → geometry → scorer.
    pub fn assess_hour(&self, tz: Tz, sample: &HourlySample) -> HourAssessment {
        let instant = self.to_utc(tz, sample.time);
        let sky = self.ephemeris.celestial(self.site.lat, self.site.lon, instant);

        let aod = optics::resolve_aod(self.aod_override, sample.aod);
        let transparency =
            optics::transparency(sample.aqi.unwrap_or(DEFAULT_AQI), sample.humidity, aod.aod);

        // Without a tracked target the moon penalty is evaluated at the
        // zenith, where the site's base SQM is defined.
        let (target_alt, target_az) = match &self.target {
            Some(t) => ephemeris::equatorial_to_horizontal(
                t.ra_deg,
                t.dec_deg,
                self.site.lat,
                self.site.lon,
                instant,
            ),
            None => (90.0, 0.0),
        };

        let separation = celestial::angular_separation(
            sky.moon_alt_deg,
            sky.moon_az_deg,
            target_alt,
            target_az,
        );

        let sqm = optics::dynamic_sqm(
            self.site.base_sqm,
            sky.moon_alt_deg,
            sky.moon_illumination,
            transparency.k,
            separation,
            optics::airmass(target_alt),
        );

        let result = score::quality_score(&QualityInput {
            cloud_cover: sample.cloud_cover,
            sun_alt_deg: sky.sun_alt_deg,
            transparency_percent: transparency.percent,
            dynamic_sqm: sqm,
            seeing_score: score::seeing_score(sample.seeing_index),
            delta_temp_dew_c: sample.temperature_c - sample.dew_point_c,
        });

        let target_refraction = self.target.as_ref().map(|_| {
            optics::refraction(target_alt, optics::STANDARD_PRESSURE_HPA, sample.temperature_c)
        });

        HourAssessment {
            time: sample.time,
            daytime: is_daytime(sample.time.hour()),
            cloud_cover: sample.cloud_cover,
            score: result.score,
            vetoed: result.vetoed,
            veto_reason: result.veto_reason,
            extinction_k: transparency.k,
            transparency_percent: transparency.percent,
            sqm,
            moon_separation_deg: separation,
            aod,
            jet_stream: optics::jet_stream_risk(sample.wind_500hpa_kmh),
            target_alt_deg: self.target.as_ref().map(|_| target_alt),
            target_refraction,
        }
    }

    /// Assess every sample within the summary horizon, in order.
    pub fn assess_series(&self, series: &ForecastSeries) -> Vec<HourAssessment> {
        let tz = series.tz();
        series
            .samples
            .iter()
            .take(SUMMARY_SCAN_HOURS)
            .map(|s| self.assess_hour(tz, s))
            .collect()
    }

    /// Find the best contiguous observation window within the 72-hour scan.
    ///
    /// Daytime hours (local 06–18) reset the consecutive counter. A
    /// non-vetoed night sample scoring above 50 extends the streak; a peak
    /// is accepted only once the streak has reached two hours, so a single
    /// good hour between bad ones never wins. Strictly-greater comparison
    /// keeps the earliest window among equal peaks.
    pub fn best_window(&self, series: &ForecastSeries) -> Option<ObservationWindow> {
        best_window_of(&self.assess_series(series))
    }

    /// Group the assessed hours by calendar date (up to 7 days).
    pub fn daily_summary(&self, series: &ForecastSeries) -> Vec<DailySummary> {
        daily_summary_of(&self.assess_series(series))
    }

    /// Run the full aggregation: hourly verdicts, best window, daily
    /// outlook, and ensemble uncertainty over the valid night scores.
    pub fn assess(&self, series: &ForecastSeries) -> Assessment {
        let hours = self.assess_series(series);

        let valid_scores: Vec<f64> = hours
            .iter()
            .take(WINDOW_SCAN_HOURS)
            .filter(|h| !h.daytime && !h.vetoed)
            .map(|h| h.score as f64)
            .collect();

        Assessment {
            site: self.site.clone(),
            target: self.target.clone(),
            weights: self.weights,
            best_window: best_window_of(&hours),
            daily: daily_summary_of(&hours),
            uncertainty: forecast_uncertainty(&valid_scores),
            hours,
        }
    }
}

/// Local hour within the 06–18 band counts as daytime for the scan.
fn is_daytime(hour: u32) -> bool {
    (6..=18).contains(&hour)
}

fn best_window_of(hours: &[HourAssessment]) -> Option<ObservationWindow> {
    let mut best_score = 0u8;
    let mut best_start: Option<NaiveDateTime> = None;
    let mut consecutive = 0u32;

    for hour in hours.iter().take(WINDOW_SCAN_HOURS) {
        if hour.daytime {
            consecutive = 0;
            continue;
        }
        if !hour.vetoed && hour.score > QUALIFYING_SCORE {
            consecutive += 1;
            if hour.score > best_score && consecutive >= MIN_CONSECUTIVE_HOURS {
                best_score = hour.score;
                best_start = Some(hour.time);
            }
        } else {
            consecutive = 0;
        }
    }

    best_start.map(|start| ObservationWindow {
        start,
        end: start + Duration::hours(WINDOW_DURATION_HOURS),
        peak_score: best_score,
    })
}

fn daily_summary_of(hours: &[HourAssessment]) -> Vec<DailySummary> {
    let mut days: Vec<(NaiveDate, Vec<u8>, Vec<f64>)> = Vec::new();

    for hour in hours.iter().take(SUMMARY_SCAN_HOURS) {
        let date = hour.time.date();
        match days.last_mut() {
            Some((d, scores, clouds)) if *d == date => {
                scores.push(hour.score);
                clouds.push(hour.cloud_cover);
            }
            _ => {
                days.push((date, vec![hour.score], vec![hour.cloud_cover]));
            }
        }
    }

    days.into_iter()
        .take(7)
        .map(|(date, scores, clouds)| DailySummary {
            date,
            peak_score: scores.iter().copied().filter(|s| *s > 0).max().unwrap_or(0),
            mean_cloud_cover: clouds.iter().sum::<f64>() / clouds.len() as f64,
        })
        .collect()
}

// ─── ASCII visualization ────────────────────────────────────────

/// Render the 72-hour score timeline, best window, and daily outlook as a
/// fixed-width text block (stderr companion to the JSON output).
pub fn render_ascii_forecast(assessment: &Assessment) -> String {
    let mut out = String::new();

    let bar_width = WINDOW_SCAN_HOURS;
    out.push_str(&format!("  ╔{}╗\n", "═".repeat(bar_width + 2)));

    let mut bar = String::with_capacity(bar_width);
    for i in 0..bar_width {
        let ch = match assessment.hours.get(i) {
            None => ' ',
            Some(h) if h.daytime => '·',
            Some(h) if h.vetoed || h.score == 0 => ' ',
            Some(h) if h.score <= 25 => '░',
            Some(h) if h.score <= 50 => '▒',
            Some(h) if h.score <= 75 => '▓',
            Some(_) => '█',
        };
        bar.push(ch);
    }
    out.push_str(&format!("  ║ {} ║\n", bar));

    // Mark the best window below the bar
    let mut marks = vec![' '; bar_width];
    if let Some(window) = &assessment.best_window {
        for (i, hour) in assessment.hours.iter().take(bar_width).enumerate() {
            if hour.time >= window.start && hour.time < window.end {
                marks[i] = '^';
            }
        }
    }
    out.push_str(&format!("  ║ {} ║\n", marks.iter().collect::<String>()));
    out.push_str(&format!("  ╚{}╝\n", "═".repeat(bar_width + 2)));
    out.push_str("  now                      +24h                     +48h                  +72h\n");

    match &assessment.best_window {
        Some(w) => out.push_str(&format!(
            "  Best window: {} — {}  (score {}/100)\n",
            w.start.format("%a %d/%m %H:%M"),
            w.end.format("%H:%M"),
            w.peak_score
        )),
        None => out.push_str("  Best window: none in the next 72 h\n"),
    }

    out.push_str(&format!(
        "  Forecast spread: σ = {:.1} ({:.0}% of mean)\n",
        assessment.uncertainty.sigma, assessment.uncertainty.sigma_percent
    ));

    for day in &assessment.daily {
        out.push_str(&format!(
            "  {}  peak {:>3}  cloud {:>3.0}%\n",
            day.date.format("%a %d/%m"),
            day.peak_score,
            day.mean_cloud_cover
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::celestial::{CelestialSnapshot, FixedEphemeris};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn dark_sky() -> FixedEphemeris {
        FixedEphemeris(CelestialSnapshot {
            sun_alt_deg: -25.0,
            moon_alt_deg: -10.0,
            moon_az_deg: 0.0,
            moon_illumination: 0.0,
        })
    }

    fn site() -> Site {
        Site::custom(20.866, 105.783, 21.0).unwrap()
    }

    fn sample_at(day: u32, hour: u32, cloud: f64) -> HourlySample {
        HourlySample {
            time: NaiveDate::from_ymd_opt(2026, 1, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            cloud_cover: cloud,
            cloud_cover_low: 0.0,
            cloud_cover_mid: 0.0,
            cloud_cover_high: 0.0,
            humidity: 40.0,
            temperature_c: 10.0,
            dew_point_c: 2.0,
            wind_500hpa_kmh: 20.0,
            seeing_index: 2.0,
            transparency_index: 2.0,
            aqi: None,
            aod: None,
        }
    }

    fn series(samples: Vec<HourlySample>) -> ForecastSeries {
        ForecastSeries { timezone: "UTC".to_string(), samples }
    }

    #[test]
    fn test_assess_hour_clear_night() {
        // aqi default 50, humidity 40, aod default 0.1 → k = 0.3
        // transparency ≈ 74.08 → 14.82 pts; sqm = 21 − 1.25·0.3 = 20.625
        // → 14.5 pts; seeing idx 2 → 86 → 8.6 pts; ΔT 8 → 10 pts; cloud 40.
        let eph = dark_sky();
        let assessor = Assessor::new(site(), &eph);
        let a = assessor.assess_hour(chrono_tz::UTC, &sample_at(5, 2, 0.0));

        assert!(!a.vetoed);
        assert!(!a.daytime);
        assert_eq!(a.score, 88);
        assert_relative_eq!(a.extinction_k, 0.3, epsilon = 1e-12);
        assert_relative_eq!(a.sqm, 20.625, epsilon = 1e-9);
        assert_eq!(a.aod.source, crate::optics::AodSource::Default);
        assert_eq!(a.jet_stream.level, crate::optics::JetStreamLevel::Good);
        assert!(a.target_alt_deg.is_none(), "no target → no target fields");
    }

    #[test]
    fn test_assess_hour_aod_override_wins() {
        let eph = dark_sky();
        let assessor = Assessor::new(site(), &eph).with_aod_override(0.3);
        let mut s = sample_at(5, 2, 0.0);
        s.aod = Some(0.05);
        let a = assessor.assess_hour(chrono_tz::UTC, &s);
        assert_eq!(a.aod.source, crate::optics::AodSource::Manual);
        assert_relative_eq!(a.extinction_k, 0.15 + 0.05 + 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_best_window_requires_two_consecutive_hours() {
        // A lone 88-score hour at 02:00 surrounded by vetoed hours must not
        // produce a window.
        let eph = dark_sky();
        let assessor = Assessor::new(site(), &eph);
        let s = series(vec![
            sample_at(5, 0, 100.0),
            sample_at(5, 1, 100.0),
            sample_at(5, 2, 0.0),
            sample_at(5, 3, 100.0),
            sample_at(5, 4, 100.0),
        ]);
        assert!(assessor.best_window(&s).is_none());
    }

    #[test]
    fn test_best_window_accepts_second_hour_of_streak() {
        // Hours 02 (score 88) and 03 (score 77): the streak reaches 2 at
        // 03:00, so the window anchors there with the 03:00 score — the
        // contract of the original scan, preserved exactly.
        let eph = dark_sky();
        let assessor = Assessor::new(site(), &eph);
        let s = series(vec![
            sample_at(5, 0, 100.0),
            sample_at(5, 1, 100.0),
            sample_at(5, 2, 0.0),
            sample_at(5, 3, 20.0),
            sample_at(5, 4, 100.0),
        ]);

        let w = assessor.best_window(&s).expect("two-hour streak must qualify");
        assert_eq!(w.start.hour(), 3);
        assert_eq!(w.end - w.start, Duration::hours(WINDOW_DURATION_HOURS));
        let expected = assessor.assess_hour(chrono_tz::UTC, &sample_at(5, 3, 20.0)).score;
        assert_eq!(w.peak_score, expected);
    }

    #[test]
    fn test_best_window_prefers_higher_peak_in_streak() {
        // Ascending streak: 04:00 outscores 03:00 once the streak is
        // established, so the window moves to the true peak.
        let eph = dark_sky();
        let assessor = Assessor::new(site(), &eph);
        let s = series(vec![
            sample_at(5, 2, 30.0),
            sample_at(5, 3, 20.0),
            sample_at(5, 4, 0.0),
        ]);

        let w = assessor.best_window(&s).unwrap();
        assert_eq!(w.start.hour(), 4);
        assert_eq!(w.peak_score, 88);
    }

    #[test]
    fn test_daytime_resets_streak() {
        // One good night hour, then day, then one more good hour: the
        // streak never reaches 2 across the daytime gap.
        let eph = dark_sky();
        let assessor = Assessor::new(site(), &eph);
        let s = series(vec![
            sample_at(5, 5, 0.0),
            sample_at(5, 6, 0.0),  // daytime band starts
            sample_at(5, 18, 0.0), // still daytime
            sample_at(5, 19, 0.0),
        ]);
        assert!(assessor.best_window(&s).is_none());
    }

    #[test]
    fn test_daytime_band_boundaries() {
        assert!(!is_daytime(5));
        assert!(is_daytime(6));
        assert!(is_daytime(18));
        assert!(!is_daytime(19));
    }

    #[test]
    fn test_best_window_idempotent() {
        let eph = dark_sky();
        let assessor = Assessor::new(site(), &eph);
        let s = series((0..24).map(|h| sample_at(5, h, (h * 4) as f64)).collect());
        let first = assessor.best_window(&s);
        let second = assessor.best_window(&s);
        assert_eq!(first, second, "pure scan must be bit-identical on re-run");
    }

    #[test]
    fn test_daily_summary_groups_by_date() {
        let eph = dark_sky();
        let assessor = Assessor::new(site(), &eph);
        let mut samples: Vec<HourlySample> = (0..24).map(|h| sample_at(5, h, 80.0)).collect();
        samples.extend((0..24).map(|h| sample_at(6, h, 10.0)));
        let s = series(samples);

        let daily = assessor.daily_summary(&s);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(daily[1].date, NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());

        // Day 1: every hour vetoed on cloud → all scores 0 → peak 0
        assert_eq!(daily[0].peak_score, 0);
        // Day 2: night hours score well
        assert!(daily[1].peak_score > 50);

        // Mean cloud cover includes every sample of the day
        assert_relative_eq!(daily[0].mean_cloud_cover, 80.0, epsilon = 1e-9);
        assert_relative_eq!(daily[1].mean_cloud_cover, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_daily_summary_capped_at_seven_days() {
        let eph = dark_sky();
        let assessor = Assessor::new(site(), &eph);
        let mut samples = Vec::new();
        for day in 1..=9 {
            for h in 0..24 {
                samples.push(sample_at(day, h, 50.0));
            }
        }
        let daily = assessor.daily_summary(&series(samples));
        assert_eq!(daily.len(), 7);
    }

    #[test]
    fn test_uncertainty_empty_is_zero() {
        let u = forecast_uncertainty(&[]);
        assert_eq!(u.sigma, 0.0);
        assert_eq!(u.sigma_percent, 0.0);
    }

    #[test]
    fn test_uncertainty_population_sigma() {
        let u = forecast_uncertainty(&[70.0, 90.0]);
        assert_relative_eq!(u.sigma, 10.0, epsilon = 1e-12);
        assert_relative_eq!(u.sigma_percent, 12.5, epsilon = 1e-12);
    }

    #[test]
    fn test_uncertainty_constant_scores() {
        let u = forecast_uncertainty(&[80.0, 80.0, 80.0]);
        assert_eq!(u.sigma, 0.0);
        assert_eq!(u.sigma_percent, 0.0);
    }

    #[test]
    fn test_uncertainty_all_zero_scores_no_division() {
        let u = forecast_uncertainty(&[0.0, 0.0]);
        assert_eq!(u.sigma, 0.0);
        assert_eq!(u.sigma_percent, 0.0, "zero mean must not divide");
    }

    #[test]
    fn test_full_assessment_consistency() {
        let eph = dark_sky();
        let assessor = Assessor::new(site(), &eph);
        let s = series((0..48).map(|i| sample_at(5 + i / 24, i % 24, 15.0)).collect());

        let assessment = assessor.assess(&s);
        println!("{}", serde_json::to_string_pretty(&assessment.daily).unwrap());

        assert_eq!(assessment.hours.len(), 48);
        assert_eq!(assessment.best_window, assessor.best_window(&s));
        assert_eq!(assessment.daily, assessor.daily_summary(&s));
        // Valid scores exist, so the spread fields are finite
        assert!(assessment.uncertainty.sigma.is_finite());
        assert!(assessment.uncertainty.sigma_percent.is_finite());
    }

    #[test]
    fn test_series_json_file_roundtrip() {
        use std::io::Write;

        let s = series(vec![sample_at(5, 2, 10.0)]);
        let json = serde_json::to_string(&s).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = ForecastSeries::from_json_file(file.path()).unwrap();
        assert_eq!(loaded.timezone, "UTC");
        assert_eq!(loaded.samples.len(), 1);
        assert_eq!(loaded.samples[0].cloud_cover, 10.0);
    }

    #[test]
    fn test_series_invalid_json_is_error() {
        let err = ForecastSeries::from_json("{not json").unwrap_err();
        assert!(err.to_string().contains("Invalid forecast JSON"));
    }

    #[test]
    fn test_render_ascii_forecast() {
        let eph = dark_sky();
        let assessor = Assessor::new(site(), &eph);
        let s = series((0..24).map(|h| sample_at(5, h, 10.0)).collect());
        let assessment = assessor.assess(&s);

        let ascii = render_ascii_forecast(&assessment);
        println!("{}", ascii);
        assert!(ascii.contains("Best window"));
        assert!(ascii.contains("Forecast spread"));
        assert!(ascii.contains("·"), "daytime hours should render as dots");
    }
}
