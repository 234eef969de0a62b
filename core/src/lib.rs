// routekit core — route queries over a precomputed road network
//
// Configuration → Engine → Query → serialized result.
//
// A dataset is loaded once (privately or through a shared segment), queries
// are validated before any routing work happens, and the same query always
// serializes to the same text whichever way it was executed.

pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod geo;
pub mod hint;
pub mod logging;
pub mod query;
pub mod routing;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

pub use config::{Backing, Configuration, DatasetHandle};
pub use dataset::{shared, Dataset, Profile, SegmentInfo};
pub use engine::Engine;
pub use error::{Error, ErrorKind, FileKind, Result};
pub use geo::{Coordinate, FixedCoordinate};
pub use hint::{decode_hint, encode_hint, HintData, PhantomNode};
pub use query::{Query, QueryRequest, ReplayHints, RouteOptions};
pub use routing::{GraphRoutingCore, RoutePlan, RouteResult, RoutingCore, SearchMode};
pub use settings::{AlternativeSettings, EngineSettings, SettingsError};
