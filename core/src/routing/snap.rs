// Location matching — project query coordinates onto the nearest road
//
// Candidates come from the segment R-tree; the nearest segment wins, ties going
// to the lower edge id. Distances are measured on a local plane around the
// query point, which is accurate well beyond any sensible snap radius.

use crate::dataset::Dataset;
use crate::geo::FixedCoordinate;
use crate::hint::{decode_hint, PhantomNode, RATIO_SCALE};
use tracing::debug;

/// Match `input` onto the closest edge within `max_distance_m`.
pub fn nearest(dataset: &Dataset, input: FixedCoordinate, max_distance_m: f64) -> Option<PhantomNode> {
    let mut best: Option<(f64, u32, f64)> = None;

    for edge_id in dataset.index().candidates(input, max_distance_m) {
        let Some(edge) = dataset.edge(edge_id) else {
            continue;
        };
        let (Some(a), Some(b)) = (dataset.node(edge.source), dataset.node(edge.target)) else {
            continue;
        };
        let (t, distance) = project(input, a, b);
        if distance > max_distance_m {
            continue;
        }
        if best.map_or(true, |(d, _, _)| distance < d) {
            best = Some((distance, edge_id, t));
        }
    }

    let (_, edge_id, t) = best?;
    phantom_at(dataset, edge_id, (t * RATIO_SCALE as f64).round() as u32, input)
}

/// Recover a match from a hint, if it is consistent with this dataset and
/// was computed for the same input coordinate.
pub fn from_hint(dataset: &Dataset, hint: &str, input: FixedCoordinate) -> Option<PhantomNode> {
    let phantom = decode_hint(hint)?;
    if phantom.input != input {
        debug!("Hint was computed for a different coordinate");
        return None;
    }
    let expected = phantom_at(dataset, phantom.edge, phantom.ratio, input)?;
    (expected == phantom).then_some(phantom)
}

/// Phantom node at fixed-point `ratio` along `edge_id`.
fn phantom_at(dataset: &Dataset, edge_id: u32, ratio: u32, input: FixedCoordinate) -> Option<PhantomNode> {
    let edge = dataset.edge(edge_id)?;
    let a = dataset.node(edge.source)?;
    let b = dataset.node(edge.target)?;
    let ratio = ratio.min(RATIO_SCALE);
    Some(PhantomNode {
        edge: edge_id,
        ratio,
        location: a.interpolate(b, ratio as f64 / RATIO_SCALE as f64),
        input,
    })
}

/// Clamped projection parameter of `p` onto segment `a`-`b`, and the distance
/// from `p` to that point in metres.
fn project(p: FixedCoordinate, a: FixedCoordinate, b: FixedCoordinate) -> (f64, f64) {
    let (ax, ay) = a.to_local(p);
    let (bx, by) = b.to_local(p);
    let (dx, dy) = (bx - ax, by - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        ((-ax * dx - ay * dy) / len2).clamp(0.0, 1.0)
    };
    let (x, y) = (ax + t * dx, ay + t * dy);
    (t, (x * x + y * y).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::EdgeRecord;
    use crate::hint::encode_hint;
    use std::path::Path;

    fn line() -> Dataset {
        let nodes = vec![
            FixedCoordinate::from_degrees(52.500, 13.400),
            FixedCoordinate::from_degrees(52.500, 13.410),
            FixedCoordinate::from_degrees(52.510, 13.410),
        ];
        let edge = |source, target| EdgeRecord {
            source,
            target,
            weight: 500,
            name_id: 0,
            forward: true,
            backward: true,
        };
        Dataset::from_parts(
            "line.ini",
            Path::new("line.graph"),
            nodes,
            vec![edge(0, 1), edge(1, 2)],
            vec!["Testweg".into()],
            "n/a".into(),
            9,
        )
        .unwrap()
    }

    #[test]
    fn test_snaps_to_nearest_segment() {
        let ds = line();
        let input = FixedCoordinate::from_degrees(52.5003, 13.405);
        let phantom = nearest(&ds, input, 1000.0).unwrap();
        assert_eq!(phantom.edge, 0);
        assert!((phantom.ratio as i64 - 500_000).abs() < 1_000);
        assert_eq!(phantom.location.lat, 52_500_000);
        assert_eq!(phantom.input, input);
    }

    #[test]
    fn test_tie_goes_to_lower_edge() {
        let ds = line();
        // Exactly on the shared node of both edges
        let input = FixedCoordinate::from_degrees(52.500, 13.410);
        let phantom = nearest(&ds, input, 1000.0).unwrap();
        assert_eq!(phantom.edge, 0);
        assert_eq!(phantom.ratio, RATIO_SCALE);
    }

    #[test]
    fn test_out_of_coverage() {
        let ds = line();
        let munich = FixedCoordinate::from_degrees(48.137, 11.575);
        assert!(nearest(&ds, munich, 1000.0).is_none());

        // Within the index box but beyond the cutoff
        let near = FixedCoordinate::from_degrees(52.505, 13.400);
        assert!(nearest(&ds, near, 100.0).is_none());
    }

    #[test]
    fn test_hint_replay_requires_same_input() {
        let ds = line();
        let input = FixedCoordinate::from_degrees(52.5003, 13.405);
        let phantom = nearest(&ds, input, 1000.0).unwrap();
        let hint = encode_hint(&phantom).unwrap();

        assert_eq!(from_hint(&ds, &hint, input), Some(phantom));
        let moved = FixedCoordinate::from_degrees(52.5004, 13.405);
        assert_eq!(from_hint(&ds, &hint, moved), None);
    }

    #[test]
    fn test_hint_for_unknown_edge_rejected() {
        let ds = line();
        let input = FixedCoordinate::from_degrees(52.5003, 13.405);
        let bogus = PhantomNode {
            edge: 99,
            ..nearest(&ds, input, 1000.0).unwrap()
        };
        let hint = encode_hint(&bogus).unwrap();
        assert_eq!(from_hint(&ds, &hint, input), None);
    }
}
