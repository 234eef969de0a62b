// Shortest-path search between two phantom nodes
//
// Plain Dijkstra over the node graph. Start and end sit part-way along edges,
// so the search is seeded with the partial cost to each end of the start edge
// and finishes through the partial cost from each end of the target edge.
// Weights are integer deciseconds, which keeps results reproducible.

use crate::dataset::Dataset;
use crate::hint::{PhantomNode, RATIO_SCALE};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

/// Part of one edge travelled by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traversal {
    pub edge: u32,
    /// Entry position along the edge, source = 0, target = RATIO_SCALE
    pub from: u32,
    /// Exit position along the edge
    pub to: u32,
}

impl Traversal {
    fn span(&self) -> u32 {
        self.from.abs_diff(self.to)
    }
}

/// Route between two consecutive query coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leg {
    pub start: PhantomNode,
    pub end: PhantomNode,
    pub traversals: Vec<Traversal>,
    /// Travel time in deciseconds
    pub cost: u64,
}

impl Leg {
    pub fn edges(&self) -> impl Iterator<Item = u32> + '_ {
        self.traversals.iter().map(|t| t.edge)
    }
}

/// Cost of travelling `span` millionths of an edge of weight `weight`.
fn partial(weight: u64, span: u32) -> u64 {
    (weight * span as u64 + RATIO_SCALE as u64 / 2) / RATIO_SCALE as u64
}

/// Real (unpenalized) travel time of a set of traversals.
pub fn travel_time(dataset: &Dataset, traversals: &[Traversal]) -> u64 {
    traversals
        .iter()
        .filter_map(|t| dataset.edge(t.edge).map(|e| partial(e.weight as u64, t.span())))
        .sum()
}

#[derive(Debug, Clone, Copy)]
struct Parent {
    /// Previous node, `None` when reached straight from the start phantom
    prev: Option<u32>,
    edge: u32,
}

/// Fastest leg from `start` to `end` with edge weights from `weight`.
pub fn shortest_path<W>(dataset: &Dataset, start: &PhantomNode, end: &PhantomNode, weight: W) -> Option<Leg>
where
    W: Fn(u32) -> u64,
{
    let start_edge = dataset.edge(start.edge)?;
    let end_edge = dataset.edge(end.edge)?;
    let n = dataset.node_count();

    let mut best: Option<(u64, Finish)> = None;

    // Start and end on the same edge, travelling along it directly
    if start.edge == end.edge {
        let w = weight(start.edge);
        if (start_edge.forward && end.ratio >= start.ratio)
            || (start_edge.backward && end.ratio <= start.ratio)
        {
            offer(partial(w, start.ratio.abs_diff(end.ratio)), Finish::Direct, &mut best);
        }
    }

    let mut dist = vec![u64::MAX; n];
    let mut parent: Vec<Option<Parent>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut heap = BinaryHeap::new();

    let w = weight(start.edge);
    if start_edge.forward {
        let cost = partial(w, RATIO_SCALE - start.ratio);
        seed(start_edge.target, cost, start.edge, &mut dist, &mut parent, &mut heap);
    }
    if start_edge.backward {
        let cost = partial(w, start.ratio);
        seed(start_edge.source, cost, start.edge, &mut dist, &mut parent, &mut heap);
    }

    let end_w = weight(end.edge);
    while let Some(Reverse((cost, node))) = heap.pop() {
        if best.map_or(false, |(c, _)| cost >= c) {
            break;
        }
        let idx = node as usize;
        if settled[idx] || cost > dist[idx] {
            continue;
        }
        settled[idx] = true;

        if node == end_edge.source && end_edge.forward {
            offer(cost + partial(end_w, end.ratio), Finish::Via(node), &mut best);
        }
        if node == end_edge.target && end_edge.backward {
            offer(cost + partial(end_w, RATIO_SCALE - end.ratio), Finish::Via(node), &mut best);
        }

        for adj in dataset.outgoing(node) {
            let next = cost.saturating_add(weight(adj.edge));
            let t = adj.target as usize;
            if next < dist[t] {
                dist[t] = next;
                parent[t] = Some(Parent {
                    prev: Some(node),
                    edge: adj.edge,
                });
                heap.push(Reverse((next, adj.target)));
            }
        }
    }

    let (_, finish) = best?;
    let traversals = match finish {
        Finish::Direct => vec![Traversal {
            edge: start.edge,
            from: start.ratio,
            to: end.ratio,
        }],
        Finish::Via(exit) => unwind(dataset, start, end, exit, &parent)?,
    };
    let traversals: Vec<Traversal> = traversals.into_iter().filter(|t| t.from != t.to).collect();

    Some(Leg {
        start: *start,
        end: *end,
        cost: travel_time(dataset, &traversals),
        traversals,
    })
}

fn offer(cost: u64, finish: Finish, best: &mut Option<(u64, Finish)>) {
    if best.map_or(true, |(c, _)| cost < c) {
        *best = Some((cost, finish));
    }
}

#[derive(Debug, Clone, Copy)]
enum Finish {
    Direct,
    /// Leave the graph at this node onto the end edge
    Via(u32),
}

fn seed(
    node: u32,
    cost: u64,
    edge: u32,
    dist: &mut [u64],
    parent: &mut [Option<Parent>],
    heap: &mut BinaryHeap<Reverse<(u64, u32)>>,
) {
    let idx = node as usize;
    if cost < dist[idx] {
        dist[idx] = cost;
        parent[idx] = Some(Parent { prev: None, edge });
        heap.push(Reverse((cost, node)));
    }
}

fn unwind(
    dataset: &Dataset,
    start: &PhantomNode,
    end: &PhantomNode,
    exit: u32,
    parent: &[Option<Parent>],
) -> Option<Vec<Traversal>> {
    let end_edge = dataset.edge(end.edge)?;
    let mut out = vec![Traversal {
        edge: end.edge,
        from: if exit == end_edge.source { 0 } else { RATIO_SCALE },
        to: end.ratio,
    }];

    let mut node = exit;
    // Bounded by node count so a broken parent chain cannot loop forever
    for _ in 0..=dataset.node_count() {
        let p = parent.get(node as usize).copied().flatten()?;
        let edge = dataset.edge(p.edge)?;
        let arrive = if node == edge.target { RATIO_SCALE } else { 0 };
        match p.prev {
            Some(prev) => {
                out.push(Traversal {
                    edge: p.edge,
                    from: RATIO_SCALE - arrive,
                    to: arrive,
                });
                node = prev;
            }
            None => {
                out.push(Traversal {
                    edge: p.edge,
                    from: start.ratio,
                    to: arrive,
                });
                out.reverse();
                return Some(out);
            }
        }
    }
    None
}

/// Search for an alternative to `primary` by penalizing its edges.
///
/// Returns the alternative leg when it is cheap enough and different enough
/// from the primary route.
pub fn alternative(
    dataset: &Dataset,
    primary: &Leg,
    penalty_factor: f64,
    max_cost_ratio: f64,
    max_shared_ratio: f64,
) -> Option<Leg> {
    let used: HashSet<u32> = primary.edges().collect();
    let base = |edge: u32| dataset.edge(edge).map_or(u64::MAX / 4, |e| e.weight as u64);
    let penalized = |edge: u32| {
        let w = base(edge);
        if used.contains(&edge) {
            (w as f64 * penalty_factor).round() as u64
        } else {
            w
        }
    };

    let alt = shortest_path(dataset, &primary.start, &primary.end, penalized)?;
    if alt.traversals == primary.traversals {
        return None;
    }
    if alt.cost as f64 > primary.cost as f64 * max_cost_ratio {
        return None;
    }

    let length = |t: &Traversal| {
        dataset
            .edge(t.edge)
            .map_or(0.0, |e| e.distance_m * t.span() as f64 / RATIO_SCALE as f64)
    };
    let total: f64 = alt.traversals.iter().map(length).sum();
    let shared: f64 = alt
        .traversals
        .iter()
        .filter(|t| used.contains(&t.edge))
        .map(length)
        .sum();
    if total <= 0.0 || shared / total > max_shared_ratio {
        return None;
    }
    Some(alt)
}
