//! Test fixtures — a small synthetic Berlin dataset written to disk
//!
//! The network is an 11 x 11 grid of two-way streets covering roughly
//! 52.505–52.530 N, 13.405–13.450 E, with travel times for a steady
//! 50 km/h. It is fully deterministic, so checksums and results are stable
//! from run to run.

use crate::dataset::files::{encode_graph, encode_names, encode_nodes, write_file};
use crate::dataset::EdgeRecord;
use crate::error::Result;
use crate::geo::{haversine_distance, FixedCoordinate};
use std::path::Path;

/// The route used throughout the host contract tests.
pub const BERLIN_COORDINATES: [[f64; 2]; 2] = [[52.519930, 13.438640], [52.513191, 13.415852]];

pub const BERLIN_TIMESTAMP: &str = "2013-08-01T00:00:00Z";

const GRID: u32 = 11;
const LAT0: f64 = 52.505;
const LON0: f64 = 13.405;
const LAT_STEP: f64 = 0.0025;
const LON_STEP: f64 = 0.0045;
/// 50 km/h in metres per decisecond
const SPEED_M_PER_DS: f64 = 50.0 / 3.6 / 10.0;

const EAST_WEST: [&str; 11] = [
    "Köpenicker Straße",
    "Wallstraße",
    "Inselstraße",
    "Fischerinsel",
    "Rathausstraße",
    "Spandauer Straße",
    "Karl-Liebknecht-Straße",
    "Rosa-Luxemburg-Straße",
    "Torstraße",
    "Linienstraße",
    "Invalidenstraße",
];

const NORTH_SOUTH: [&str; 11] = [
    "Friedrichstraße",
    "Charlottenstraße",
    "Markgrafenstraße",
    "Jerusalemer Straße",
    "Spittelmarkt",
    "Neue Grünstraße",
    "Alte Jakobstraße",
    "Alexanderstraße",
    "Otto-Braun-Straße",
    "Lichtenberger Straße",
    "Andreasstraße",
];

fn node_id(row: u32, col: u32) -> u32 {
    row * GRID + col
}

/// Node coordinates, edges and street names of the grid.
pub fn berlin_network() -> (Vec<FixedCoordinate>, Vec<EdgeRecord>, Vec<String>) {
    let nodes: Vec<FixedCoordinate> = (0..GRID)
        .flat_map(|row| {
            (0..GRID).map(move |col| {
                FixedCoordinate::from_degrees(
                    LAT0 + row as f64 * LAT_STEP,
                    LON0 + col as f64 * LON_STEP,
                )
            })
        })
        .collect();

    let names: Vec<String> = EAST_WEST
        .iter()
        .chain(NORTH_SOUTH.iter())
        .map(|s| s.to_string())
        .collect();

    let street = |source: u32, target: u32, name_id: u32| {
        let meters = haversine_distance(nodes[source as usize], nodes[target as usize]);
        EdgeRecord {
            source,
            target,
            weight: ((meters / SPEED_M_PER_DS).round() as u32).max(1),
            name_id,
            forward: true,
            backward: true,
        }
    };

    let mut edges = Vec::new();
    for row in 0..GRID {
        for col in 0..GRID {
            if col + 1 < GRID {
                edges.push(street(node_id(row, col), node_id(row, col + 1), row));
            }
            if row + 1 < GRID {
                edges.push(street(node_id(row, col), node_id(row + 1, col), GRID + col));
            }
        }
    }

    (nodes, edges, names)
}

/// Write the grid dataset and `berlin.ini` into `dir`; returns the profile path.
pub fn write_berlin(dir: &Path) -> Result<String> {
    let (nodes, edges, names) = berlin_network();
    write_file(&dir.join("berlin.graph"), &encode_graph(&edges)?)?;
    write_file(&dir.join("berlin.nodes"), &encode_nodes(&nodes)?)?;
    write_file(&dir.join("berlin.names"), &encode_names(&names)?)?;
    write_file(
        &dir.join("berlin.timestamp"),
        format!("{BERLIN_TIMESTAMP}\n").as_bytes(),
    )?;
    write_profile(
        dir,
        "berlin.ini",
        "# synthetic Berlin Mitte grid\n\
         [files]\n\
         graph = berlin.graph\n\
         nodes = berlin.nodes\n\
         names = berlin.names\n\
         timestamp = berlin.timestamp\n",
    )
}

/// A zero-byte profile, `bogus.ini`.
pub fn write_empty_profile(dir: &Path) -> Result<String> {
    write_profile(dir, "bogus.ini", "")
}

/// A profile whose graph file does not exist.
pub fn write_missing_references(dir: &Path) -> Result<String> {
    write_berlin(dir)?;
    write_profile(
        dir,
        "references-missing-files.ini",
        "graph = doesnotexist.graph\nnodes = berlin.nodes\nnames = berlin.names\n",
    )
}

/// A profile whose graph file is empty.
pub fn write_corrupt_references(dir: &Path) -> Result<String> {
    write_berlin(dir)?;
    write_file(&dir.join("corrupt.graph"), b"")?;
    write_profile(
        dir,
        "references-corrupt-files.ini",
        "graph = corrupt.graph\nnodes = berlin.nodes\nnames = berlin.names\n",
    )
}

fn write_profile(dir: &Path, name: &str, contents: &str) -> Result<String> {
    let path = dir.join(name);
    write_file(&path, contents.as_bytes())?;
    Ok(path.to_string_lossy().into_owned())
}
