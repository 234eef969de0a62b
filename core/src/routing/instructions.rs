// Turn-by-turn description of a route
//
// Consecutive traversals on the same street collapse into one instruction.
// A new instruction starts whenever the street changes or a via point is
// reached; its code comes from the angle between the incoming and outgoing
// directions.

use super::search::Leg;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::geo::{bearing, FixedCoordinate};
use crate::hint::RATIO_SCALE;

/// Instruction codes as they appear in serialized results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnInstruction {
    GoStraight = 1,
    TurnSlightRight = 2,
    TurnRight = 3,
    TurnSharpRight = 4,
    UTurn = 5,
    TurnSharpLeft = 6,
    TurnLeft = 7,
    TurnSlightLeft = 8,
    ReachViaPoint = 9,
    HeadOn = 10,
    ReachedYourDestination = 15,
}

impl TurnInstruction {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Classify the change from heading `from` to heading `to` (degrees).
    pub fn from_headings(from: f64, to: f64) -> Self {
        let turn = (to - from + 360.0) % 360.0;
        match turn {
            t if !(23.0..=337.0).contains(&t) => TurnInstruction::GoStraight,
            t if t < 67.0 => TurnInstruction::TurnSlightRight,
            t if t < 113.0 => TurnInstruction::TurnRight,
            t if t < 158.0 => TurnInstruction::TurnSharpRight,
            t if t < 203.0 => TurnInstruction::UTurn,
            t if t < 248.0 => TurnInstruction::TurnSharpLeft,
            t if t < 293.0 => TurnInstruction::TurnLeft,
            _ => TurnInstruction::TurnSlightLeft,
        }
    }
}

/// Eight-point compass name for a heading.
pub fn compass(heading: f64) -> &'static str {
    const NAMES: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    NAMES[(((heading + 22.5) / 45.0).floor() as usize) % 8]
}

/// One instruction before serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub instruction: TurnInstruction,
    pub name_id: Option<u32>,
    /// Index into the route's point list where the step begins
    pub position: usize,
    pub distance_m: f64,
    /// Travel time in deciseconds
    pub time_ds: u64,
    pub heading: f64,
}

/// Points, steps and via positions of a whole route.
#[derive(Debug, Clone, Default)]
pub struct Description {
    pub points: Vec<FixedCoordinate>,
    pub steps: Vec<Step>,
    /// Point index of every via location, start and end included
    pub via_positions: Vec<usize>,
    pub distance_m: f64,
    pub time_ds: u64,
}

impl Description {
    /// Indices that must survive geometry simplification.
    pub fn pinned_positions(&self) -> Vec<usize> {
        let mut pinned: Vec<usize> = self
            .steps
            .iter()
            .map(|s| s.position)
            .chain(self.via_positions.iter().copied())
            .collect();
        pinned.sort_unstable();
        pinned.dedup();
        pinned
    }

    pub fn first_name_id(&self) -> Option<u32> {
        self.steps.iter().find_map(|s| s.name_id)
    }

    pub fn last_name_id(&self) -> Option<u32> {
        self.steps.iter().rev().find_map(|s| s.name_id)
    }
}

/// Walk `legs` and describe the route they form.
///
/// A traversal naming an edge the dataset does not have means the dataset
/// is corrupt.
pub fn describe(dataset: &Dataset, legs: &[Leg]) -> Result<Description> {
    let Some(first) = legs.first() else {
        return Ok(Description::default());
    };

    let mut out = Description {
        points: vec![first.start.location],
        via_positions: vec![0],
        ..Description::default()
    };
    let mut heading: Option<f64> = None;
    let mut open_new_step = true;

    for (leg_idx, leg) in legs.iter().enumerate() {
        if leg_idx > 0 {
            out.steps.push(Step {
                instruction: TurnInstruction::ReachViaPoint,
                name_id: None,
                position: out.points.len() - 1,
                distance_m: 0.0,
                time_ds: 0,
                heading: heading.unwrap_or(0.0),
            });
            open_new_step = true;
        }

        for t in &leg.traversals {
            let edge = dataset
                .edge(t.edge)
                .ok_or_else(|| Error::DatasetCorrupt(format!("route uses unknown edge {}", t.edge)))?;
            let (Some(a), Some(b)) = (dataset.node(edge.source), dataset.node(edge.target)) else {
                return Err(Error::DatasetCorrupt(format!(
                    "edge {} references a missing node",
                    t.edge
                )));
            };

            let span = t.from.abs_diff(t.to) as f64 / RATIO_SCALE as f64;
            let distance_m = edge.distance_m * span;
            let time_ds = (edge.weight as f64 * span).round() as u64;
            let from = a.interpolate(b, t.from as f64 / RATIO_SCALE as f64);
            let to = a.interpolate(b, t.to as f64 / RATIO_SCALE as f64);

            out.distance_m += distance_m;
            out.time_ds += time_ds;

            if from == to {
                if let Some(step) = out.steps.last_mut() {
                    step.distance_m += distance_m;
                    step.time_ds += time_ds;
                }
                continue;
            }

            let piece_heading = bearing(from, to);
            let same_street = out
                .steps
                .last()
                .is_some_and(|s| s.name_id == Some(edge.name_id));

            if open_new_step || !same_street {
                let instruction = match heading {
                    None => TurnInstruction::HeadOn,
                    Some(prev) => TurnInstruction::from_headings(prev, piece_heading),
                };
                out.steps.push(Step {
                    instruction,
                    name_id: Some(edge.name_id),
                    position: out.points.len() - 1,
                    distance_m,
                    time_ds,
                    heading: piece_heading,
                });
                open_new_step = false;
            } else if let Some(step) = out.steps.last_mut() {
                step.distance_m += distance_m;
                step.time_ds += time_ds;
            }

            if out.points.last() != Some(&to) {
                out.points.push(to);
            }
            heading = Some(piece_heading);
        }

        if out.points.last() != Some(&leg.end.location) {
            out.points.push(leg.end.location);
        }
        out.via_positions.push(out.points.len() - 1);
    }

    out.steps.push(Step {
        instruction: TurnInstruction::ReachedYourDestination,
        name_id: None,
        position: out.points.len() - 1,
        distance_m: 0.0,
        time_ds: 0,
        heading: 0.0,
    });

    Ok(out)
}
