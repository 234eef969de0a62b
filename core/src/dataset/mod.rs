//! Road-network dataset — the immutable graph every query runs against
//!
//! A dataset is described by a profile file pointing at its parts:
//! - graph: directed road segments with travel times and street names
//! - nodes: fixed-point coordinates of every intersection
//! - names: street name table
//! - timestamp (optional): data freshness marker
//!
//! Loading is all-or-nothing. The in-memory form adds a forward adjacency
//! list and an R-tree of edge bounding boxes for snapping. The dataset
//! checksum is the CRC-32 of the graph file bytes, so it is stable across
//! processes and load modes.

pub mod files;
pub mod index;
pub mod profile;
pub mod shared;

pub use files::EdgeRecord;
pub use index::SegmentIndex;
pub use profile::Profile;
pub use shared::SegmentInfo;

use crate::error::{Error, FileKind, Result};
use crate::geo::{haversine_distance, FixedCoordinate};
use std::path::Path;
use tracing::info;

/// A road segment with derived length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: u32,
    pub target: u32,
    /// Traversal time in deciseconds
    pub weight: u32,
    pub name_id: u32,
    pub forward: bool,
    pub backward: bool,
    pub distance_m: f64,
}

/// Outgoing traversal from a node along `edge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjacent {
    pub target: u32,
    pub edge: u32,
}

#[derive(Debug)]
pub struct Dataset {
    source: String,
    nodes: Vec<FixedCoordinate>,
    edges: Vec<Edge>,
    names: Vec<String>,
    first_out: Vec<u32>,
    adjacent: Vec<Adjacent>,
    index: SegmentIndex,
    checksum: u32,
    timestamp: String,
}

impl Dataset {
    /// Load every file named by `profile`.
    pub fn load(profile: &Profile) -> Result<Self> {
        let graph_bytes = files::read_bytes(FileKind::Graph, &profile.graph)?;
        let edges = files::decode_graph(&profile.graph, &graph_bytes)?;
        let nodes = files::read_nodes(&profile.nodes)?;
        if let Some(bad) = nodes.iter().position(|n| !n.is_valid()) {
            return Err(Error::ReferencedFileCorrupt {
                kind: FileKind::Nodes,
                path: profile.nodes.display().to_string(),
                reason: format!("has an out-of-range coordinate at node {bad}"),
            });
        }
        let names = files::read_names(&profile.names)?;
        let timestamp = match &profile.timestamp {
            Some(path) => files::read_timestamp(path)?,
            None => "n/a".to_string(),
        };
        let checksum = crc32fast::hash(&graph_bytes);

        let dataset = Self::from_parts(
            &profile.source,
            &profile.graph,
            nodes,
            edges,
            names,
            timestamp,
            checksum,
        )?;

        info!(
            "Loaded dataset {} ({} nodes, {} edges, checksum {})",
            profile.source,
            dataset.node_count(),
            dataset.edge_count(),
            dataset.checksum
        );
        Ok(dataset)
    }

    /// Assemble and validate a dataset from decoded parts.
    ///
    /// Node coordinates are range-checked when read from disk; this checks
    /// that the graph is consistent with the node and name tables.
    pub fn from_parts(
        source: &str,
        graph_path: &Path,
        nodes: Vec<FixedCoordinate>,
        records: Vec<EdgeRecord>,
        names: Vec<String>,
        timestamp: String,
        checksum: u32,
    ) -> Result<Self> {
        let corrupt = |reason: String| Error::ReferencedFileCorrupt {
            kind: FileKind::Graph,
            path: graph_path.display().to_string(),
            reason,
        };

        let node_count = nodes.len() as u32;
        let mut edges = Vec::with_capacity(records.len());
        for (id, r) in records.iter().enumerate() {
            if r.source >= node_count || r.target >= node_count {
                return Err(corrupt(format!(
                    "edge {id} references node {} but only {node_count} nodes exist",
                    r.source.max(r.target)
                )));
            }
            if r.source == r.target {
                return Err(corrupt(format!("edge {id} is a self loop")));
            }
            if r.weight == 0 {
                return Err(corrupt(format!("edge {id} has zero weight")));
            }
            if !r.forward && !r.backward {
                return Err(corrupt(format!("edge {id} is not traversable")));
            }
            if r.name_id as usize >= names.len() {
                return Err(corrupt(format!(
                    "edge {id} references name {} but only {} names exist",
                    r.name_id,
                    names.len()
                )));
            }
            edges.push(Edge {
                source: r.source,
                target: r.target,
                weight: r.weight,
                name_id: r.name_id,
                forward: r.forward,
                backward: r.backward,
                distance_m: haversine_distance(
                    nodes[r.source as usize],
                    nodes[r.target as usize],
                ),
            });
        }

        let (first_out, adjacent) = build_adjacency(nodes.len(), &edges);
        let index = SegmentIndex::build(
            edges
                .iter()
                .enumerate()
                .map(|(id, e)| (id as u32, nodes[e.source as usize], nodes[e.target as usize])),
        );

        Ok(Self {
            source: source.to_string(),
            nodes,
            edges,
            names,
            first_out,
            adjacent,
            index,
            checksum,
            timestamp,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: u32) -> Option<FixedCoordinate> {
        self.nodes.get(id as usize).copied()
    }

    pub fn edge(&self, id: u32) -> Option<&Edge> {
        self.edges.get(id as usize)
    }

    /// Street name for `name_id`; empty for unnamed roads.
    pub fn name(&self, name_id: u32) -> &str {
        self.names.get(name_id as usize).map(String::as_str).unwrap_or("")
    }

    /// Traversals leaving `node`.
    pub fn outgoing(&self, node: u32) -> &[Adjacent] {
        let n = node as usize;
        match (self.first_out.get(n), self.first_out.get(n + 1)) {
            (Some(&start), Some(&end)) => &self.adjacent[start as usize..end as usize],
            _ => &[],
        }
    }

    pub fn index(&self) -> &SegmentIndex {
        &self.index
    }
}

fn build_adjacency(node_count: usize, edges: &[Edge]) -> (Vec<u32>, Vec<Adjacent>) {
    let mut degree = vec![0u32; node_count + 1];
    for e in edges {
        if e.forward {
            degree[e.source as usize] += 1;
        }
        if e.backward {
            degree[e.target as usize] += 1;
        }
    }

    let mut first_out = vec![0u32; node_count + 1];
    for n in 0..node_count {
        first_out[n + 1] = first_out[n] + degree[n];
    }

    let mut cursor = first_out.clone();
    let mut adjacent = vec![Adjacent { target: 0, edge: 0 }; first_out[node_count] as usize];
    for (id, e) in edges.iter().enumerate() {
        if e.forward {
            let slot = &mut cursor[e.source as usize];
            adjacent[*slot as usize] = Adjacent {
                target: e.target,
                edge: id as u32,
            };
            *slot += 1;
        }
        if e.backward {
            let slot = &mut cursor[e.target as usize];
            adjacent[*slot as usize] = Adjacent {
                target: e.source,
                edge: id as u32,
            };
            *slot += 1;
        }
    }

    (first_out, adjacent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn triangle() -> (Vec<FixedCoordinate>, Vec<EdgeRecord>, Vec<String>) {
        let nodes = vec![
            FixedCoordinate::from_degrees(52.500, 13.400),
            FixedCoordinate::from_degrees(52.500, 13.410),
            FixedCoordinate::from_degrees(52.510, 13.405),
        ];
        let edge = |source, target, forward, backward| EdgeRecord {
            source,
            target,
            weight: 600,
            name_id: 0,
            forward,
            backward,
        };
        let edges = vec![edge(0, 1, true, true), edge(1, 2, true, false), edge(2, 0, true, true)];
        (nodes, edges, vec!["Ringstraße".to_string()])
    }

    #[test]
    fn test_adjacency_respects_direction() {
        let (nodes, edges, names) = triangle();
        let ds = Dataset::from_parts("t.ini", Path::new("t.graph"), nodes, edges, names, "n/a".into(), 1)
            .unwrap();

        let from_1: Vec<u32> = ds.outgoing(1).iter().map(|a| a.target).collect();
        assert_eq!(from_1, vec![0, 2]);
        // Edge 1 is one-way 1 -> 2, so node 2 only reaches 0
        let from_2: Vec<u32> = ds.outgoing(2).iter().map(|a| a.target).collect();
        assert_eq!(from_2, vec![0]);
        assert!(ds.outgoing(99).is_empty());
        assert_eq!(ds.name(0), "Ringstraße");
        assert_eq!(ds.name(42), "");
    }

    #[test]
    fn test_edge_lengths_derived() {
        let (nodes, edges, names) = triangle();
        let ds = Dataset::from_parts("t.ini", Path::new("t.graph"), nodes, edges, names, "n/a".into(), 1)
            .unwrap();
        let len = ds.edge(0).unwrap().distance_m;
        assert!(len > 600.0 && len < 750.0, "unexpected length {len}");
    }

    #[test]
    fn test_dangling_node_reference_is_corrupt() {
        let (nodes, mut edges, names) = triangle();
        edges[2].target = 17;
        let err = Dataset::from_parts("t.ini", Path::new("t.graph"), nodes, edges, names, "n/a".into(), 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReferencedFileCorrupt);
        assert_eq!(
            err.to_string(),
            "graph file t.graph edge 2 references node 17 but only 3 nodes exist"
        );
    }

    #[test]
    fn test_unknown_name_is_corrupt() {
        let (nodes, mut edges, names) = triangle();
        edges[0].name_id = 3;
        let err = Dataset::from_parts("t.ini", Path::new("t.graph"), nodes, edges, names, "n/a".into(), 1)
            .unwrap_err();
        assert!(err.to_string().contains("references name 3"));
    }

    #[test]
    fn test_untraversable_edge_is_corrupt() {
        let (nodes, mut edges, names) = triangle();
        edges[1].forward = false;
        let err = Dataset::from_parts("t.ini", Path::new("t.graph"), nodes, edges, names, "n/a".into(), 1)
            .unwrap_err();
        assert!(err.to_string().contains("not traversable"));
    }
}
