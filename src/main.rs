use clap::Parser;
use skyscore::ephemeris::MeeusEphemeris;
use skyscore::forecast::{render_ascii_forecast, Assessor, ForecastSeries};
use skyscore::location::{self, Site, Target};
use skyscore::providers;
use skyscore::score::ScoreWeights;
use std::path::PathBuf;

/// Skyscore v0.3 — Astrophotography Observability Engine
///
/// Scores every forecast hour for a site, finds the best 2-hour
/// observation window in the next 72 hours, and prints a 7-day outlook.
///
/// Examples:
///   skyscore sapa
///   skyscore --site dong-van --target m42
///   skyscore --lat 20.866 --lon 105.783 --sqm 19.5
///   skyscore sapa --aod 0.25
///   skyscore --site da-lat --input forecast.json
#[derive(Parser)]
#[command(name = "skyscore", version, about, long_about = None)]
struct Cli {
    /// Preset site id (positional). Example: skyscore sapa
    #[arg(index = 1)]
    site_positional: Option<String>,

    /// Preset site id (named). Example: --site dong-van
    #[arg(long)]
    site: Option<String>,

    /// Latitude (-90 to 90) for a custom site.
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude (-180 to 180) for a custom site.
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Baseline zenith SQM for a custom site, mag/arcsec² (17-22).
    #[arg(long, default_value_t = 19.5)]
    sqm: f64,

    /// Preset deep-sky target. Example: --target m42
    #[arg(long)]
    target: Option<String>,

    /// Right ascension of a custom target, degrees.
    #[arg(long, allow_hyphen_values = true)]
    ra: Option<f64>,

    /// Declination of a custom target, degrees.
    #[arg(long, allow_hyphen_values = true)]
    dec: Option<f64>,

    /// Manual aerosol optical depth override (wins over measurements).
    #[arg(long)]
    aod: Option<f64>,

    /// Read the forecast series from a JSON file instead of fetching.
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Display weights "cloud,transparency,sky,seeing,dew", e.g. 35,20,20,15,10.
    #[arg(long, value_parser = parse_weights)]
    weights: Option<ScoreWeights>,

    /// List preset sites and targets, then exit.
    #[arg(long)]
    list: bool,
}

fn parse_weights(s: &str) -> Result<ScoreWeights, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|e| format!("'{}': {}", p.trim(), e)))
        .collect::<Result<_, _>>()?;
    if parts.len() != 5 {
        return Err(format!("expected 5 comma-separated weights, got {}", parts.len()));
    }
    let w = ScoreWeights {
        cloud: parts[0],
        transparency: parts[1],
        sky_darkness: parts[2],
        seeing: parts[3],
        dew_margin: parts[4],
    };
    w.validate().map_err(|e| e.to_string())?;
    Ok(w)
}

fn main() {
    let cli = Cli::parse();

    if cli.list {
        eprintln!("  Sites:   {}", location::builtin_site_ids().join(", "));
        eprintln!("  Targets: {}", location::builtin_target_ids().join(", "));
        return;
    }

    let site = resolve_site(&cli);
    let target = resolve_target(&cli);

    let weights = cli.weights.unwrap_or_default();
    if !weights.is_balanced() {
        eprintln!(
            "  \u{26A0}\u{FE0F}  Weights sum to {:.1}, not 100 — shown as given.",
            weights.sum()
        );
    }

    // ── Load or fetch the forecast ──────────────────────────────

    let series: ForecastSeries = match &cli.input {
        Some(path) => ForecastSeries::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => providers::fetch_forecast(site.lat, site.lon).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
    };

    // ── Assess ──────────────────────────────────────────────────

    eprintln!(
        "  \u{1F52D} {}  ({:.3}, {:.3})  base SQM {:.1}",
        site.name, site.lat, site.lon, site.base_sqm
    );
    if let Some(ref t) = target {
        eprintln!("  Target: {} (RA {:.2}°, Dec {:.2}°)", t.name, t.ra_deg, t.dec_deg);
    }

    let ephemeris = MeeusEphemeris::default();
    let mut assessor = Assessor::new(site, &ephemeris).with_weights(weights);
    if let Some(t) = target {
        assessor = assessor.with_target(t);
    }
    if let Some(aod) = cli.aod {
        assessor = assessor.with_aod_override(aod);
    }

    let assessment = assessor.assess(&series);

    // ASCII timeline to stderr, JSON to stdout
    eprint!("{}", render_ascii_forecast(&assessment));
    println!("{}", serde_json::to_string_pretty(&assessment).unwrap());
}

fn resolve_site(cli: &Cli) -> Site {
    // Priority: --site > positional > --lat/--lon > error

    if let Some(ref id) = cli.site {
        return lookup_site(id);
    }
    if let Some(ref id) = cli.site_positional {
        return lookup_site(id);
    }
    if let (Some(lat), Some(lon)) = (cli.lat, cli.lon) {
        return Site::custom(lat, lon, cli.sqm).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
    }

    eprintln!("Error: No site specified.");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  skyscore sapa");
    eprintln!("  skyscore --site dong-van --target m42");
    eprintln!("  skyscore --lat 20.866 --lon 105.783 --sqm 19.5");
    eprintln!("  skyscore --list");
    std::process::exit(1);
}

fn lookup_site(id: &str) -> Site {
    location::builtin_site(id).unwrap_or_else(|| {
        eprintln!(
            "Error: Unknown site '{}'. Presets: {}",
            id,
            location::builtin_site_ids().join(", ")
        );
        std::process::exit(1);
    })
}

fn resolve_target(cli: &Cli) -> Option<Target> {
    if let Some(ref name) = cli.target {
        let target = location::builtin_target(name).unwrap_or_else(|| {
            eprintln!(
                "Error: Unknown target '{}'. Presets: {}",
                name,
                location::builtin_target_ids().join(", ")
            );
            std::process::exit(1);
        });
        return Some(target);
    }
    if let (Some(ra), Some(dec)) = (cli.ra, cli.dec) {
        if !(0.0..360.0).contains(&ra) || !(-90.0..=90.0).contains(&dec) {
            eprintln!("Error: Invalid target coordinates. RA: 0..360, Dec: -90..90");
            std::process::exit(1);
        }
        return Some(Target {
            name: format!("RA {:.2}, Dec {:.2}", ra, dec),
            ra_deg: ra,
            dec_deg: dec,
        });
    }
    None
}
