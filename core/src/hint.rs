//! Location hints — opaque, replayable snapping results
//!
//! A hint records where one query coordinate was matched onto the road
//! network: the edge, the fixed-point position along it, the snapped location
//! and the input coordinate it was computed for. Hints are bincode encoded and
//! rendered as base58 text so they survive any JSON transport untouched.
//!
//! All fields are integers, so encoding the same match always yields the same
//! string. That is what makes a replayed result byte-identical to the result
//! that produced its hints.

use crate::error::{Error, Result};
use crate::geo::FixedCoordinate;
use serde::{Deserialize, Serialize};

/// Hint encoding version, first field of every hint
const HINT_VERSION: u8 = 1;

/// Fixed-point scale of `PhantomNode::ratio`
pub const RATIO_SCALE: u32 = 1_000_000;

/// A coordinate matched onto an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhantomNode {
    pub edge: u32,
    /// Position along the edge from source to target, in millionths
    pub ratio: u32,
    /// Matched point on the edge
    pub location: FixedCoordinate,
    /// Query coordinate the match was computed for
    pub input: FixedCoordinate,
}

impl PhantomNode {
    pub fn ratio_f64(&self) -> f64 {
        self.ratio as f64 / RATIO_SCALE as f64
    }
}

#[derive(Serialize, Deserialize)]
struct HintRecord {
    version: u8,
    phantom: PhantomNode,
}

/// `hint_data` block of a route result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintData {
    pub checksum: u32,
    /// One hint per query coordinate; empty when the coordinate did not snap
    pub locations: Vec<String>,
}

impl HintData {
    pub fn new(checksum: u32, phantoms: &[Option<PhantomNode>]) -> Result<Self> {
        let locations = phantoms
            .iter()
            .map(|p| match p {
                Some(phantom) => encode_hint(phantom),
                None => Ok(String::new()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { checksum, locations })
    }
}

pub fn encode_hint(phantom: &PhantomNode) -> Result<String> {
    let record = HintRecord {
        version: HINT_VERSION,
        phantom: *phantom,
    };
    let bytes = bincode::serialize(&record).map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(bs58::encode(bytes).into_string())
}

/// Decode a hint, returning `None` for anything that is not a well-formed
/// hint of the current version.
pub fn decode_hint(hint: &str) -> Option<PhantomNode> {
    if hint.is_empty() {
        return None;
    }
    let bytes = bs58::decode(hint).into_vec().ok()?;
    let record: HintRecord = bincode::deserialize(&bytes).ok()?;
    if record.version != HINT_VERSION || record.phantom.ratio > RATIO_SCALE {
        return None;
    }
    // Reject trailing garbage: a valid hint is exactly its own encoding
    if bincode::serialized_size(&record).ok()? != bytes.len() as u64 {
        return None;
    }
    Some(record.phantom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phantom() -> PhantomNode {
        PhantomNode {
            edge: 42,
            ratio: 250_000,
            location: FixedCoordinate::new(52_519_000, 13_438_000),
            input: FixedCoordinate::new(52_519_930, 13_438_640),
        }
    }

    #[test]
    fn test_hint_is_deterministic_text() {
        let a = encode_hint(&phantom()).unwrap();
        let b = encode_hint(&phantom()).unwrap();
        assert_eq!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(decode_hint(&a), Some(phantom()));
    }

    #[test]
    fn test_garbage_hints_rejected() {
        assert_eq!(decode_hint(""), None);
        assert_eq!(decode_hint("0OIl"), None); // not base58
        assert_eq!(decode_hint("abc"), None); // too short

        let mut padded = bincode::serialize(&HintRecord {
            version: HINT_VERSION,
            phantom: phantom(),
        })
        .unwrap();
        padded.push(0);
        assert_eq!(decode_hint(&bs58::encode(padded).into_string()), None);
    }

    #[test]
    fn test_out_of_range_ratio_rejected() {
        let bad = PhantomNode {
            ratio: RATIO_SCALE + 1,
            ..phantom()
        };
        let hint = encode_hint(&bad).unwrap();
        assert_eq!(decode_hint(&hint), None);
    }

    #[test]
    fn test_hint_data_marks_unsnapped() {
        let data = HintData::new(7, &[Some(phantom()), None]).unwrap();
        assert_eq!(data.checksum, 7);
        assert_eq!(data.locations.len(), 2);
        assert!(!data.locations[0].is_empty());
        assert_eq!(data.locations[1], "");
    }
}
