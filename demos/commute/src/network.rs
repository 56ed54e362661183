//! Synthetic transit network and commuter ping streams.
//!
//! Three lines loosely laid over central Berlin: a bus and a tram from an
//! embedded route CSV, and a suburban train generated in code.

use std::io::Cursor;

use tt_core::{haversine_km, Coordinate};
use tt_spatial::{load_routes_reader, FnSource, MultiSource, RawRoute, RouteMeta, SourceError, StaticSource};

// ── Routes ────────────────────────────────────────────────────────────────────

const ROUTES_CSV: &str = "\
route_id,seq,lat,lon,transport,operator,name,ref\n\
bus-100,0,52.5200,13.3700,bus,BVG,Bus 100,100\n\
bus-100,1,52.5200,13.3850,bus,BVG,Bus 100,100\n\
bus-100,2,52.5200,13.4000,bus,BVG,Bus 100,100\n\
bus-100,3,52.5150,13.4200,bus,BVG,Bus 100,100\n\
tram-m4,0,52.5250,13.4100,tram,BVG,Tram M4,M4\n\
tram-m4,1,52.5330,13.4200,tram,BVG,Tram M4,M4\n\
tram-m4,2,52.5400,13.4300,tram,BVG,Tram M4,M4\n\
";

/// Straight suburban line, one vertex per kilometre or so.
fn train_line() -> RawRoute {
    let (a, b) = ([52.48, 13.30], [52.56, 13.38]);
    let points = (0..=10)
        .map(|k| {
            let t = k as f64 / 10.0;
            [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
        })
        .collect();
    RawRoute::new("s-1", points).with_meta(RouteMeta {
        transport: Some(tt_core::TransportType::Train),
        operator:  Some("S-Bahn".into()),
        name:      Some("S1".into()),
        reference: Some("S1".into()),
    })
}

/// Every line of the demo network behind one [`MultiSource`].
pub fn build_source() -> Result<MultiSource, SourceError> {
    let csv = load_routes_reader(Cursor::new(ROUTES_CSV))?;
    Ok(MultiSource::new()
        .with(StaticSource::new(csv))
        .with(FnSource::new("generated", || Ok(vec![train_line()]))))
}

/// Vertices of a route in the demo network, by id.
pub fn route_points(id: &str) -> Vec<Coordinate> {
    let raw = match id {
        "s-1" => vec![train_line()],
        _ => load_routes_reader(Cursor::new(ROUTES_CSV)).unwrap_or_default(),
    };
    raw.into_iter()
        .find(|r| r.id.as_deref() == Some(id))
        .map(|r| r.points.iter().map(|&[lat, lon]| Coordinate { lat, lon }).collect())
        .unwrap_or_default()
}

// ── Ping streams ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
pub struct Ping {
    pub rider: u64,
    pub at:    Coordinate,
    pub ts:    i64,
}

/// A ride along `path` at `speed_kmh` starting at `start`, one ping every
/// `every_secs`, followed by one off-route ping two minutes after arrival.
pub fn ride(rider: u64, path: &[Coordinate], speed_kmh: f64, start: i64, every_secs: i64) -> Vec<Ping> {
    let mut pings = Vec::new();
    let Some(&last) = path.last() else { return pings };

    let step_km = speed_kmh * every_secs as f64 / 3_600.0;
    let mut ts = start;
    let mut carried = 0.0;
    pings.push(Ping { rider, at: path[0], ts });

    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let leg = haversine_km(a, b);
        let mut along = step_km - carried;
        while along <= leg {
            let t = along / leg;
            ts += every_secs;
            pings.push(Ping {
                rider,
                at: Coordinate { lat: a.lat + (b.lat - a.lat) * t, lon: a.lon + (b.lon - a.lon) * t },
                ts,
            });
            along += step_km;
        }
        carried = leg - (along - step_km);
    }

    ts += every_secs;
    pings.push(Ping { rider, at: last, ts });
    // Walk away from the stop.
    pings.push(Ping { rider, at: last.offset_m(-2_000.0, 0.0), ts: ts + 120 });
    pings
}
