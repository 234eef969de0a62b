// Route result — the serialized answer to a query
//
// Field order is fixed by the struct layout, and every number in here is
// derived from fixed-point data, so equal inputs serialize to equal text.

use super::instructions::{compass, Description};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::geo::{encode_polyline, simplify, tolerance_for_zoom, FixedCoordinate};
use crate::hint::HintData;
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

pub const STATUS_OK: u32 = 0;
pub const STATUS_NO_ROUTE: u32 = 207;

pub const MESSAGE_OK: &str = "Found route between points";
pub const MESSAGE_NO_ROUTE: &str = "Cannot find route between points";

/// One turn instruction, serialized as
/// `[code, street, length_m, position, time_s, "<length>m", direction, azimuth]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub code: u8,
    pub street: String,
    pub length_m: u32,
    pub position: usize,
    pub time_s: u32,
    pub direction: &'static str,
    pub azimuth: u32,
}

impl Serialize for Instruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(8)?;
        tuple.serialize_element(&self.code.to_string())?;
        tuple.serialize_element(&self.street)?;
        tuple.serialize_element(&self.length_m)?;
        tuple.serialize_element(&self.position)?;
        tuple.serialize_element(&self.time_s)?;
        tuple.serialize_element(&format!("{}m", self.length_m))?;
        tuple.serialize_element(self.direction)?;
        tuple.serialize_element(&self.azimuth)?;
        tuple.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    /// Metres
    pub total_distance: u32,
    /// Seconds
    pub total_time: u32,
    pub start_point: String,
    pub end_point: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub status: u32,
    pub status_message: String,
    pub route_geometry: String,
    pub route_instructions: Vec<Instruction>,
    pub route_summary: RouteSummary,
    pub alternative_geometries: Vec<String>,
    pub alternative_instructions: Vec<Vec<Instruction>>,
    pub alternative_summaries: Vec<RouteSummary>,
    pub via_points: Vec<[f64; 2]>,
    pub hint_data: HintData,
}

impl RouteResult {
    /// Result for coordinates that could not be connected.
    pub fn no_route(hint_data: HintData, via_points: Vec<[f64; 2]>) -> Self {
        Self {
            status: STATUS_NO_ROUTE,
            status_message: MESSAGE_NO_ROUTE.to_string(),
            route_geometry: String::new(),
            route_instructions: Vec::new(),
            route_summary: RouteSummary::default(),
            alternative_geometries: Vec::new(),
            alternative_instructions: Vec::new(),
            alternative_summaries: Vec::new(),
            via_points,
            hint_data,
        }
    }

    pub fn is_found(&self) -> bool {
        self.status == STATUS_OK
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Geometry, instructions and summary of one rendered route.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRoute {
    pub geometry: String,
    pub instructions: Vec<Instruction>,
    pub summary: RouteSummary,
}

/// Simplify and encode a described route for output at `zoom_level`.
pub fn render(dataset: &Dataset, desc: &Description, zoom_level: u8, with_instructions: bool) -> RenderedRoute {
    let kept = simplify(&desc.points, &desc.pinned_positions(), tolerance_for_zoom(zoom_level));
    let points: Vec<FixedCoordinate> = kept.iter().map(|&i| desc.points[i]).collect();

    let instructions = if with_instructions {
        desc.steps
            .iter()
            .map(|step| {
                let length_m = step.distance_m.round() as u32;
                Instruction {
                    code: step.instruction.code(),
                    street: step.name_id.map(|id| dataset.name(id).to_string()).unwrap_or_default(),
                    length_m,
                    position: kept.binary_search(&step.position).unwrap_or_else(|i| i),
                    time_s: ((step.time_ds + 5) / 10) as u32,
                    direction: compass(step.heading),
                    azimuth: step.heading.round() as u32 % 360,
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    let name = |id: Option<u32>| id.map(|id| dataset.name(id).to_string()).unwrap_or_default();
    RenderedRoute {
        geometry: encode_polyline(&points),
        instructions,
        summary: RouteSummary {
            total_distance: desc.distance_m.round() as u32,
            total_time: ((desc.time_ds + 5) / 10) as u32,
            start_point: name(desc.first_name_id()),
            end_point: name(desc.last_name_id()),
        },
    }
}

/// `[lat, lon]` in degrees for output.
pub fn via_point(location: FixedCoordinate) -> [f64; 2] {
    [location.lat_deg(), location.lon_deg()]
}
