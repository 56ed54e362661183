//! commute: end-to-end demo of the traveltime ride detector.
//!
//! Six riders commute for a working week over a three-line synthetic network
//! (bus, tram, suburban train).  Every ping goes through `TransitService`;
//! finished trips are written to `output/commute/trips.csv`, learned
//! patterns and usage counters to `output/commute/analytics.json`.
//!
//! ```text
//! cargo run -p commute [-- config.json]
//! RUST_LOG=debug cargo run -p commute
//! ```
//!
//! `TT_CACHE_PATH` and `TT_ANALYTICS_PATH` override the file locations.

mod network;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tt_core::{RiderId, Timeframe, Timestamp, TrackerConfig};
use tt_output::{CsvTripWriter, TripOutputObserver};
use tt_service::TransitServiceBuilder;
use tt_session::PingState;

use network::{build_source, ride, route_points, Ping};

// ── Constants ─────────────────────────────────────────────────────────────────

const OUTPUT_DIR:  &str = "output/commute";
const DAYS:        i64  = 5;
/// Monday 2024-05-06 00:00 UTC.
const WEEK_START:  i64  = 1_714_953_600;
const PING_EVERY:  i64  = 60;

/// `(rider, route, speed km/h, morning departure offset s)`
const COMMUTERS: [(u64, &str, f64, i64); 6] = [
    (1, "bus-100", 14.0, 7 * 3_600 + 30 * 60),
    (2, "bus-100", 12.0, 7 * 3_600 + 45 * 60),
    (3, "tram-m4", 24.0, 8 * 3_600),
    (4, "tram-m4", 22.0, 8 * 3_600 + 10 * 60),
    (5, "s-1",     55.0, 7 * 3_600),
    (6, "s-1",     60.0, 7 * 3_600 + 20 * 60),
];

// ── Configuration ─────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> Result<TrackerConfig> {
    let mut config: TrackerConfig = match path {
        Some(p) => {
            let file = std::fs::File::open(p).with_context(|| format!("opening config {}", p.display()))?;
            serde_json::from_reader(file).with_context(|| format!("parsing config {}", p.display()))?
        }
        None => TrackerConfig::default(),
    };

    let out = Path::new(OUTPUT_DIR);
    config.route_cache_path = std::env::var_os("TT_CACHE_PATH")
        .map(PathBuf::from)
        .or(config.route_cache_path)
        .or_else(|| Some(out.join("routes.json")));
    config.analytics_path = std::env::var_os("TT_ANALYTICS_PATH")
        .map(PathBuf::from)
        .or(config.analytics_path)
        .or_else(|| Some(out.join("analytics.json")));
    Ok(config)
}

/// Morning ride out and evening ride back for every commuter and day,
/// in timestamp order.
fn week_of_pings() -> Vec<Ping> {
    let mut pings = Vec::new();
    for day in 0..DAYS {
        let midnight = WEEK_START + day * 86_400;
        for (rider, route, speed, depart) in COMMUTERS {
            let mut path = route_points(route);
            pings.extend(ride(rider, &path, speed, midnight + depart, PING_EVERY));
            path.reverse();
            pings.extend(ride(rider, &path, speed, midnight + depart + 9 * 3_600, PING_EVERY));
        }
    }
    pings.sort_by_key(|p| (p.ts, p.rider));
    pings
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;

    println!("=== commute: traveltime ride detector ===");
    println!("Riders: {}  |  Days: {DAYS}  |  Ping every {PING_EVERY} s", COMMUTERS.len());
    println!();

    // 1. Service with CSV trip output.
    let output = Arc::new(TripOutputObserver::new(CsvTripWriter::new(Path::new(OUTPUT_DIR))?));
    let service = TransitServiceBuilder::new(build_source()?)
        .config(config)
        .observer(output.clone())
        .build()?;

    // 2. Routes: fresh cache if present, otherwise the sources.
    let routes = service.load_routes()?;
    info!(routes, "route corpus ready");

    // 3. Replay the week.
    let pings = week_of_pings();
    let t0 = Instant::now();
    let mut ended = 0usize;
    let mut invalid = 0usize;
    let mut errors = 0usize;
    for p in &pings {
        let outcome = service.process_ping_at(RiderId(p.rider), p.at, Timestamp(p.ts))?;
        match outcome.session_state {
            PingState::Ended   => ended += 1,
            PingState::Invalid => invalid += 1,
            PingState::Error   => errors += 1,
            _ => {}
        }
    }
    let elapsed = t0.elapsed();

    service.flush()?;
    output.finish()?;
    if let Some(e) = output.take_error() {
        eprintln!("output error: {e}");
    }

    // 4. Summary.
    println!("Replayed {} pings in {:.3} s", pings.len(), elapsed.as_secs_f64());
    println!("  routes loaded : {routes}");
    println!("  trips ended   : {ended}");
    println!("  too short     : {invalid}");
    println!("  save errors   : {errors}");
    println!("  trips.csv     : {} rows", output.trips_written());
    println!();

    let now = Timestamp(WEEK_START + DAYS * 86_400);
    println!("{:<8} {:>6} {:>10} {:>10}", "Rider", "Trips", "Minutes", "Km");
    println!("{}", "-".repeat(38));
    for (rider, ..) in COMMUTERS {
        let stats = service.rider_stats_at(RiderId(rider), Timeframe::Weekly, now)?;
        println!(
            "{:<8} {:>6} {:>10.1} {:>10.2}",
            rider, stats.trips, stats.total_duration_min, stats.total_distance_km
        );
    }
    println!();

    println!("Popular routes:");
    for (route, uses) in service.popular_routes(5)? {
        println!("  {route:<10} {uses}");
    }
    println!();

    let summary = service.operator_summary()?;
    println!("Operators:");
    for op in &summary.operators {
        println!("  {:<10} {:>6} uses  {:>6.2} %", op.operator, op.total_uses, op.market_share_pct);
    }
    println!();

    let report = service.pattern_report()?;
    println!("{:<8} {:>8} {:>8} {:>10}  {}", "Type", "Samples", "Conf", "Avg km/h", "Status");
    println!("{}", "-".repeat(48));
    for p in &report.patterns {
        println!(
            "{:<8} {:>8} {:>8.2} {:>10.1}  {:?}",
            p.transport.as_str(),
            p.samples,
            p.confidence,
            p.speed.map_or(0.0, |s| s.avg),
            p.status,
        );
    }

    Ok(())
}
