// Spatial index over edge bounding boxes, for nearest-segment lookups

use crate::geo::FixedCoordinate;
use rstar::{RTree, RTreeObject, AABB};

const METERS_PER_DEGREE: f64 = 111_195.0;

/// Bounding box of one edge, in degrees `[lat, lon]`
#[derive(Debug, Clone)]
struct EdgeBounds {
    edge: u32,
    bounds: AABB<[f64; 2]>,
}

impl RTreeObject for EdgeBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

pub struct SegmentIndex {
    tree: RTree<EdgeBounds>,
}

impl std::fmt::Debug for SegmentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentIndex")
            .field("edges", &self.tree.size())
            .finish()
    }
}

impl SegmentIndex {
    /// Build the index; `segments` yields `(edge_id, a, b)`.
    pub fn build<I>(segments: I) -> Self
    where
        I: IntoIterator<Item = (u32, FixedCoordinate, FixedCoordinate)>,
    {
        let entries: Vec<EdgeBounds> = segments
            .into_iter()
            .map(|(edge, a, b)| EdgeBounds {
                edge,
                bounds: AABB::from_corners([a.lat_deg(), a.lon_deg()], [b.lat_deg(), b.lon_deg()]),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Edge ids whose bounding boxes intersect the box of `radius_m` around
    /// `center`, sorted so callers iterate in a stable order.
    pub fn candidates(&self, center: FixedCoordinate, radius_m: f64) -> Vec<u32> {
        let dlat = radius_m / METERS_PER_DEGREE;
        let cos_lat = center.lat_deg().to_radians().cos().max(0.01);
        let dlon = radius_m / (METERS_PER_DEGREE * cos_lat);

        let (lat, lon) = (center.lat_deg(), center.lon_deg());
        let search = AABB::from_corners([lat - dlat, lon - dlon], [lat + dlat, lon + dlon]);

        let mut out: Vec<u32> = self
            .tree
            .locate_in_envelope_intersecting(&search)
            .map(|entry| entry.edge)
            .collect();
        out.sort_unstable();
        out
    }
}
