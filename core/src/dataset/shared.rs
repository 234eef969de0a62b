// Shared segments — datasets published once and attached by many handles
//
// Segments live in a process-wide table keyed by the canonical profile path.
// A segment outlives the handles attached to it until it is released, and
// releasing or republishing never disturbs handles that already attached.

use super::{Dataset, Profile};
use crate::error::Result;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

static SEGMENTS: Lazy<RwLock<HashMap<String, Arc<Dataset>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Description of a published segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInfo {
    pub name: String,
    pub checksum: u32,
    pub node_count: usize,
    pub edge_count: usize,
    /// Handles currently attached (excluding the table's own reference)
    pub attached: usize,
}

fn describe(name: &str, dataset: &Arc<Dataset>) -> SegmentInfo {
    SegmentInfo {
        name: name.to_string(),
        checksum: dataset.checksum(),
        node_count: dataset.node_count(),
        edge_count: dataset.edge_count(),
        attached: Arc::strong_count(dataset).saturating_sub(1),
    }
}

/// Load the dataset behind `profile` into its segment, replacing any
/// previous contents.
pub fn publish(profile: &Profile) -> Result<SegmentInfo> {
    let name = profile.segment_name();
    let dataset = Arc::new(Dataset::load(profile)?);
    let info = describe(&name, &dataset);
    let replaced = SEGMENTS.write().insert(name.clone(), dataset).is_some();
    info!(
        "Published shared segment {} (checksum {}, replaced: {})",
        name, info.checksum, replaced
    );
    Ok(info)
}

/// Attach to the segment for `profile`, publishing it on first use.
///
/// The dataset is read from disk without holding the table lock. When two
/// callers race to publish, the first insert wins and both share it.
pub fn attach(profile: &Profile) -> Result<(String, Arc<Dataset>)> {
    let name = profile.segment_name();
    if let Some(dataset) = SEGMENTS.read().get(&name) {
        return Ok((name, Arc::clone(dataset)));
    }

    let loaded = Arc::new(Dataset::load(profile)?);
    let mut published = false;
    let dataset = {
        let mut table = SEGMENTS.write();
        let entry = table.entry(name.clone()).or_insert_with(|| {
            published = true;
            Arc::clone(&loaded)
        });
        Arc::clone(entry)
    };
    if published {
        info!("Published shared segment {} on first attach", name);
    }
    Ok((name, dataset))
}

/// Drop a segment from the table. Attached handles keep their data.
pub fn release(name: &str) -> bool {
    let removed = SEGMENTS.write().remove(name).is_some();
    if removed {
        info!("Released shared segment {}", name);
    }
    removed
}

/// Snapshot of every published segment, sorted by name.
pub fn segments() -> Vec<SegmentInfo> {
    let table = SEGMENTS.read();
    let mut out: Vec<SegmentInfo> = table
        .iter()
        .map(|(name, dataset)| describe(name, dataset))
        .collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Look up a published segment by name.
pub fn lookup(name: &str) -> Option<SegmentInfo> {
    SEGMENTS.read().get(name).map(|dataset| describe(name, dataset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_attach_publishes_once() {
        let dir = tempfile::tempdir().unwrap();
        let profile_path = fixtures::write_berlin(dir.path()).unwrap();
        let profile = Profile::load(&profile_path).unwrap();

        let (name, first) = attach(&profile).unwrap();
        let (_, second) = attach(&profile).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let info = lookup(&name).unwrap();
        assert_eq!(info.attached, 2);
        assert_eq!(info.checksum, first.checksum());

        assert!(release(&name));
        assert!(!release(&name));
        // Attached handles keep working after release
        assert_eq!(first.node_count(), second.node_count());
    }

    #[test]
    fn test_concurrent_attach_shares_one_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let profile_path = fixtures::write_berlin(dir.path()).unwrap();
        let profile = Profile::load(&profile_path).unwrap();

        let barrier = Arc::new(std::sync::Barrier::new(8));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let profile = profile.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    attach(&profile).unwrap()
                })
            })
            .collect();
        let attached: Vec<(String, Arc<Dataset>)> =
            threads.into_iter().map(|t| t.join().unwrap()).collect();

        let (name, first) = &attached[0];
        assert!(attached.iter().all(|(_, d)| Arc::ptr_eq(d, first)));
        assert_eq!(lookup(name).unwrap().attached, 8);
        assert!(release(name));
    }

    #[test]
    fn test_publish_replaces_without_disturbing_attached() {
        let dir = tempfile::tempdir().unwrap();
        let profile_path = fixtures::write_berlin(dir.path()).unwrap();
        let profile = Profile::load(&profile_path).unwrap();

        let (name, attached) = attach(&profile).unwrap();
        let info = publish(&profile).unwrap();
        assert_eq!(info.name, name);
        assert_eq!(info.checksum, attached.checksum());

        let (_, fresh) = attach(&profile).unwrap();
        assert!(!Arc::ptr_eq(&attached, &fresh));
        assert!(segments().iter().any(|s| s.name == name));
        release(&name);
    }
}
