//! Query — validated, immutable routing request
//!
//! Building a query is pure input validation. It never touches a dataset, so
//! malformed requests are rejected before any routing work is scheduled.

pub mod request;

pub use request::QueryRequest;

use crate::error::{Error, Result};
use crate::geo::{Coordinate, MAX_ZOOM};
use serde_json::Value;

/// Minimum number of coordinates in a query
pub const MIN_COORDINATES: usize = 2;

/// Output options for a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOptions {
    /// Geometry detail, 0 (coarsest) to 18 (unsimplified)
    pub zoom_level: u8,
    pub alternate_route: bool,
    pub print_instructions: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            zoom_level: MAX_ZOOM,
            alternate_route: true,
            print_instructions: true,
        }
    }
}

/// Hints from an earlier result together with the checksum they were made
/// against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayHints {
    pub hints: Vec<String>,
    pub checksum: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    coordinates: Vec<Coordinate>,
    options: RouteOptions,
    replay: Option<ReplayHints>,
}

impl Query {
    pub fn build(request: QueryRequest) -> Result<Self> {
        if request.coordinates.len() < MIN_COORDINATES {
            return Err(Error::InsufficientCoordinates {
                required: MIN_COORDINATES,
                got: request.coordinates.len(),
            });
        }

        let coordinates = request
            .coordinates
            .iter()
            .enumerate()
            .map(|(i, &[lat, lon])| {
                let c = Coordinate::new(lat, lon);
                if c.is_valid() {
                    Ok(c)
                } else {
                    Err(Error::invalid(format!(
                        "coordinates[{i}] is out of range: [{lat}, {lon}]"
                    )))
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let defaults = RouteOptions::default();
        let zoom_level = request.zoom_level.unwrap_or(defaults.zoom_level);
        if zoom_level > MAX_ZOOM {
            return Err(Error::invalid(format!(
                "zoomLevel must be an integer between 0 and {MAX_ZOOM}, got {zoom_level}"
            )));
        }
        let options = RouteOptions {
            zoom_level,
            alternate_route: request.alternate_route.unwrap_or(defaults.alternate_route),
            print_instructions: request
                .print_instructions
                .unwrap_or(defaults.print_instructions),
        };

        let replay = match (request.hints, request.checksum) {
            (None, None) => None,
            (Some(_), None) => return Err(Error::MalformedHintPair { missing: "checksum" }),
            (None, Some(_)) => return Err(Error::MalformedHintPair { missing: "hints" }),
            (Some(hints), Some(checksum)) => {
                if hints.len() != coordinates.len() {
                    return Err(Error::invalid(format!(
                        "hints must have one entry per coordinate: got {} for {} coordinates",
                        hints.len(),
                        coordinates.len()
                    )));
                }
                Some(ReplayHints { hints, checksum })
            }
        };

        Ok(Self {
            coordinates,
            options,
            replay,
        })
    }

    /// Build from a host-supplied JSON object.
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::build(QueryRequest::from_json(value)?)
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    pub fn replay(&self) -> Option<&ReplayHints> {
        self.replay.as_ref()
    }
}
