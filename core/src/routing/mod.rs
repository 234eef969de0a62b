//! Routing core — from validated query to route result
//!
//! The engine hands every query to a `RoutingCore` together with the dataset
//! and the resolved search mode:
//! - `snap`: match query coordinates onto the road network
//! - `search`: Dijkstra between matched locations, plus alternatives
//! - `instructions`: collapse a path into turn-by-turn steps
//! - `result`: simplify, encode and serialize
//!
//! `GraphRoutingCore` is the implementation the engine uses by default.

pub mod instructions;
pub mod result;
pub mod search;
pub mod snap;

pub use result::{Instruction, RouteResult, RouteSummary, MESSAGE_NO_ROUTE, MESSAGE_OK, STATUS_NO_ROUTE, STATUS_OK};
pub use search::{Leg, Traversal};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::geo::FixedCoordinate;
use crate::hint::{HintData, PhantomNode};
use crate::query::{Query, RouteOptions, MIN_COORDINATES};
use crate::settings::EngineSettings;
use tracing::{debug, warn};

/// How query coordinates get matched onto the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// Snap every coordinate from scratch
    FullSearch,
    /// Reuse these hints where they are valid, snapping only the rest
    ReplaySearch { hints: Vec<String> },
}

/// Everything a routing core needs for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub coordinates: Vec<FixedCoordinate>,
    pub options: RouteOptions,
    pub mode: SearchMode,
}

impl RoutePlan {
    /// Resolve the search mode of `query` against the dataset checksum.
    ///
    /// Hints made against a different dataset are dropped and the query
    /// falls back to a full search.
    pub fn resolve(query: &Query, checksum: u32) -> Self {
        let mode = match query.replay() {
            None => SearchMode::FullSearch,
            Some(replay) if replay.checksum == checksum => SearchMode::ReplaySearch {
                hints: replay.hints.clone(),
            },
            Some(replay) => {
                warn!(
                    "Hint checksum {} does not match dataset checksum {}, running full search",
                    replay.checksum, checksum
                );
                SearchMode::FullSearch
            }
        };

        Self {
            coordinates: query.coordinates().iter().map(|&c| c.into()).collect(),
            options: *query.options(),
            mode,
        }
    }
}

/// Executes route plans against a dataset.
#[cfg_attr(test, mockall::automock)]
pub trait RoutingCore: Send + Sync {
    fn route(&self, dataset: &Dataset, plan: &RoutePlan) -> Result<RouteResult>;
}

/// Graph search over the loaded dataset.
#[derive(Debug, Clone, Default)]
pub struct GraphRoutingCore {
    settings: EngineSettings,
}

impl GraphRoutingCore {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    fn locate(&self, dataset: &Dataset, plan: &RoutePlan) -> Vec<Option<PhantomNode>> {
        let max = self.settings.max_snap_distance_m;
        plan.coordinates
            .iter()
            .enumerate()
            .map(|(i, &input)| {
                if let SearchMode::ReplaySearch { hints } = &plan.mode {
                    let replayed = hints.get(i).and_then(|h| snap::from_hint(dataset, h, input));
                    if replayed.is_some() {
                        return replayed;
                    }
                    warn!("Hint {} is not usable, snapping coordinate again", i);
                }
                snap::nearest(dataset, input, max)
            })
            .collect()
    }
}

impl RoutingCore for GraphRoutingCore {
    fn route(&self, dataset: &Dataset, plan: &RoutePlan) -> Result<RouteResult> {
        let phantoms = self.locate(dataset, plan);
        let hint_data = HintData::new(dataset.checksum(), &phantoms)?;
        let via_points: Vec<[f64; 2]> = phantoms
            .iter()
            .flatten()
            .map(|p| result::via_point(p.location))
            .collect();

        let Some(phantoms) = phantoms.into_iter().collect::<Option<Vec<_>>>() else {
            debug!("Coordinate outside coverage");
            return Ok(RouteResult::no_route(hint_data, via_points));
        };
        if phantoms.len() < MIN_COORDINATES {
            debug!("Plan has {} coordinates, nothing to route", phantoms.len());
            return Ok(RouteResult::no_route(hint_data, via_points));
        }

        let weight = |edge: u32| dataset.edge(edge).map_or(u64::MAX / 4, |e| e.weight as u64);
        let mut legs = Vec::with_capacity(phantoms.len() - 1);
        for pair in phantoms.windows(2) {
            match search::shortest_path(dataset, &pair[0], &pair[1], weight) {
                Some(leg) => legs.push(leg),
                None => {
                    debug!("No path between consecutive coordinates");
                    return Ok(RouteResult::no_route(hint_data, via_points));
                }
            }
        }

        let options = plan.options;
        let primary = instructions::describe(dataset, &legs)?;
        let rendered = result::render(dataset, &primary, options.zoom_level, options.print_instructions);

        let mut out = RouteResult {
            status: STATUS_OK,
            status_message: MESSAGE_OK.to_string(),
            route_geometry: rendered.geometry,
            route_instructions: rendered.instructions,
            route_summary: rendered.summary,
            alternative_geometries: Vec::new(),
            alternative_instructions: Vec::new(),
            alternative_summaries: Vec::new(),
            via_points,
            hint_data,
        };

        if options.alternate_route && legs.len() == 1 {
            let alt = &self.settings.alternative;
            if let Some(leg) = search::alternative(
                dataset,
                &legs[0],
                alt.penalty_factor,
                alt.max_cost_ratio,
                alt.max_shared_ratio,
            ) {
                let desc = instructions::describe(dataset, std::slice::from_ref(&leg))?;
                let rendered = result::render(dataset, &desc, options.zoom_level, options.print_instructions);
                out.alternative_geometries.push(rendered.geometry);
                if options.print_instructions {
                    out.alternative_instructions.push(rendered.instructions);
                }
                out.alternative_summaries.push(rendered.summary);
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Profile;
    use crate::fixtures;
    use crate::query::QueryRequest;

    const BERLIN: [[f64; 2]; 2] = [[52.519930, 13.438640], [52.513191, 13.415852]];

    fn berlin() -> (tempfile::TempDir, Dataset) {
        let dir = tempfile::tempdir().unwrap();
        let profile = fixtures::write_berlin(dir.path()).unwrap();
        let dataset = Dataset::load(&Profile::load(&profile).unwrap()).unwrap();
        (dir, dataset)
    }

    fn plan(request: QueryRequest, checksum: u32) -> RoutePlan {
        RoutePlan::resolve(&Query::build(request).unwrap(), checksum)
    }

    #[test]
    fn test_plan_mode_follows_checksum() {
        let request = QueryRequest {
            hints: Some(vec![String::new(), String::new()]),
            checksum: Some(7),
            ..QueryRequest::new(BERLIN.to_vec())
        };
        assert!(matches!(
            plan(request.clone(), 7).mode,
            SearchMode::ReplaySearch { .. }
        ));
        assert_eq!(plan(request, 8).mode, SearchMode::FullSearch);
        assert_eq!(
            plan(QueryRequest::new(BERLIN.to_vec()), 7).mode,
            SearchMode::FullSearch
        );
    }

    #[test]
    fn test_berlin_route_found() {
        let (_dir, ds) = berlin();
        let core = GraphRoutingCore::default();
        let result = core
            .route(&ds, &plan(QueryRequest::new(BERLIN.to_vec()), ds.checksum()))
            .unwrap();

        assert!(result.is_found());
        assert_eq!(result.status_message, MESSAGE_OK);
        assert!(!result.route_geometry.is_empty());
        assert!(result.route_instructions.len() >= 2);
        assert_eq!(result.route_instructions.first().unwrap().code, 10);
        assert_eq!(result.route_instructions.last().unwrap().code, 15);
        assert_eq!(result.via_points.len(), 2);
        assert_eq!(result.hint_data.checksum, ds.checksum());
        assert!(result.hint_data.locations.iter().all(|h| !h.is_empty()));
        assert!(result.route_summary.total_distance > 1500);
        // The grid offers equally fast parallel streets
        assert_eq!(result.alternative_geometries.len(), 1);
        assert_eq!(result.alternative_instructions.len(), 1);
    }

    #[test]
    fn test_options_suppress_output() {
        let (_dir, ds) = berlin();
        let core = GraphRoutingCore::default();
        let request = QueryRequest {
            zoom_level: Some(17),
            alternate_route: Some(false),
            print_instructions: Some(false),
            ..QueryRequest::new(BERLIN.to_vec())
        };
        let result = core.route(&ds, &plan(request, ds.checksum())).unwrap();
        assert!(result.is_found());
        assert!(result.route_instructions.is_empty());
        assert!(result.alternative_geometries.is_empty());
        assert!(result.alternative_instructions.is_empty());
    }

    #[test]
    fn test_replay_matches_full_search() {
        let (_dir, ds) = berlin();
        let core = GraphRoutingCore::default();
        let first = core
            .route(&ds, &plan(QueryRequest::new(BERLIN.to_vec()), ds.checksum()))
            .unwrap();

        let replay = QueryRequest {
            hints: Some(first.hint_data.locations.clone()),
            checksum: Some(first.hint_data.checksum),
            ..QueryRequest::new(BERLIN.to_vec())
        };
        let replay_plan = plan(replay, ds.checksum());
        assert!(matches!(replay_plan.mode, SearchMode::ReplaySearch { .. }));
        let second = core.route(&ds, &replay_plan).unwrap();
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn test_bad_hint_snaps_that_coordinate_only() {
        let (_dir, ds) = berlin();
        let core = GraphRoutingCore::default();
        let first = core
            .route(&ds, &plan(QueryRequest::new(BERLIN.to_vec()), ds.checksum()))
            .unwrap();

        let mut hints = first.hint_data.locations.clone();
        hints[1] = "garbage".to_string();
        let request = QueryRequest {
            hints: Some(hints),
            checksum: Some(ds.checksum()),
            ..QueryRequest::new(BERLIN.to_vec())
        };
        let second = core.route(&ds, &plan(request, ds.checksum())).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_coverage_is_no_route() {
        let (_dir, ds) = berlin();
        let core = GraphRoutingCore::default();
        let request = QueryRequest::new(vec![BERLIN[0], [48.137, 11.575]]);
        let result = core.route(&ds, &plan(request, ds.checksum())).unwrap();

        assert_eq!(result.status, STATUS_NO_ROUTE);
        assert_eq!(result.status_message, MESSAGE_NO_ROUTE);
        assert_eq!(result.hint_data.locations.len(), 2);
        assert!(!result.hint_data.locations[0].is_empty());
        assert_eq!(result.hint_data.locations[1], "");
        assert_eq!(result.via_points.len(), 1);
    }

    #[test]
    fn test_multi_leg_route_has_via_step() {
        let (_dir, ds) = berlin();
        let core = GraphRoutingCore::default();
        let request = QueryRequest::new(vec![BERLIN[0], [52.516, 13.427], BERLIN[1]]);
        let result = core.route(&ds, &plan(request, ds.checksum())).unwrap();

        assert!(result.is_found());
        assert_eq!(result.via_points.len(), 3);
        assert!(result.route_instructions.iter().any(|i| i.code == 9));
        // Alternatives are only searched for two-coordinate queries
        assert!(result.alternative_geometries.is_empty());
    }

    #[test]
    fn test_short_plan_is_no_route() {
        let (_dir, ds) = berlin();
        let core = GraphRoutingCore::default();
        let mut plan = plan(QueryRequest::new(BERLIN.to_vec()), ds.checksum());

        plan.coordinates.clear();
        let result = core.route(&ds, &plan).unwrap();
        assert_eq!(result.status, STATUS_NO_ROUTE);
        assert!(result.hint_data.locations.is_empty());
        assert!(result.via_points.is_empty());

        plan.coordinates = vec![FixedCoordinate::from_degrees(BERLIN[0][0], BERLIN[0][1])];
        let result = core.route(&ds, &plan).unwrap();
        assert_eq!(result.status, STATUS_NO_ROUTE);
        assert_eq!(result.hint_data.locations.len(), 1);
        assert_eq!(result.via_points.len(), 1);
    }
}
