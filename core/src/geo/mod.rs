//! Geographic primitives shared by the dataset, query and routing layers
//!
//! - `coordinate`: fixed-point coordinates, distances and bearings
//! - `polyline`: encoded polyline geometry (precision 1e5)
//! - `simplify`: zoom-dependent Douglas–Peucker simplification

pub mod coordinate;
pub mod polyline;
pub mod simplify;

pub use coordinate::{bearing, haversine_distance, Coordinate, FixedCoordinate, COORDINATE_PRECISION};
pub use polyline::encode_polyline;
pub use simplify::{simplify, tolerance_for_zoom, MAX_ZOOM};
