// Douglas–Peucker simplification with pinned points
//
// Points listed as forced (turn points, via points) split the line into
// independent runs, so instruction positions survive simplification.

use super::coordinate::FixedCoordinate;

/// Zoom level at which no simplification happens.
pub const MAX_ZOOM: u8 = 18;

/// Tolerance in metres for a map zoom level; halves with every zoom step.
pub fn tolerance_for_zoom(zoom: u8) -> f64 {
    if zoom >= MAX_ZOOM {
        return 0.0;
    }
    0.6 * 2f64.powi(i32::from(MAX_ZOOM - zoom))
}

fn segment_distance(p: FixedCoordinate, a: FixedCoordinate, b: FixedCoordinate) -> f64 {
    let (px, py) = p.to_local(a);
    let (bx, by) = b.to_local(a);
    let len_sq = bx * bx + by * by;
    if len_sq == 0.0 {
        return (px * px + py * py).sqrt();
    }
    let t = ((px * bx + py * by) / len_sq).clamp(0.0, 1.0);
    let dx = px - t * bx;
    let dy = py - t * by;
    (dx * dx + dy * dy).sqrt()
}

/// Returns the sorted indices of `points` that survive simplification.
///
/// The first and last point and every index in `forced` are always kept.
pub fn simplify(points: &[FixedCoordinate], forced: &[usize], tolerance_m: f64) -> Vec<usize> {
    if points.len() <= 2 || tolerance_m <= 0.0 {
        return (0..points.len()).collect();
    }

    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;
    for &i in forced {
        if i <= last {
            keep[i] = true;
        }
    }

    let anchors: Vec<usize> = (0..points.len()).filter(|&i| keep[i]).collect();
    let mut stack = Vec::new();

    for pair in anchors.windows(2) {
        stack.push((pair[0], pair[1]));
        while let Some((start, end)) = stack.pop() {
            if end <= start + 1 {
                continue;
            }
            let mut max_dist = 0.0;
            let mut max_idx = start;
            for i in (start + 1)..end {
                let d = segment_distance(points[i], points[start], points[end]);
                if d > max_dist {
                    max_dist = d;
                    max_idx = i;
                }
            }
            if max_dist > tolerance_m {
                keep[max_idx] = true;
                stack.push((start, max_idx));
                stack.push((max_idx, end));
            }
        }
    }

    (0..points.len()).filter(|&i| keep[i]).collect()
}
