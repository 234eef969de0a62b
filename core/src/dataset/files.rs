// Dataset file formats — bincode payloads behind a magic + version header
//
// Every binary file starts with a 4-byte magic and a little-endian u16
// format version, followed by the bincode body:
//   graph  RKGR  Vec<EdgeRecord>
//   nodes  RKND  Vec<FixedCoordinate>
//   names  RKNM  Vec<String>
// The timestamp file is plain UTF-8 text.

use crate::error::{Error, FileKind, Result};
use crate::geo::FixedCoordinate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const GRAPH_MAGIC: [u8; 4] = *b"RKGR";
pub const NODES_MAGIC: [u8; 4] = *b"RKND";
pub const NAMES_MAGIC: [u8; 4] = *b"RKNM";

/// Current on-disk format version
pub const FORMAT_VERSION: u16 = 1;

/// One road segment between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: u32,
    pub target: u32,
    /// Traversal time in deciseconds
    pub weight: u32,
    /// Index into the names file
    pub name_id: u32,
    /// Traversable source → target
    pub forward: bool,
    /// Traversable target → source
    pub backward: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct FileHeader {
    magic: [u8; 4],
    version: u16,
}

#[derive(Deserialize)]
struct FileBody<T> {
    header: FileHeader,
    records: Vec<T>,
}

#[derive(Serialize)]
struct FileBodyRef<'a, T> {
    header: FileHeader,
    records: &'a [T],
}

fn corrupt(kind: FileKind, path: &Path, reason: impl Into<String>) -> Error {
    Error::ReferencedFileCorrupt {
        kind,
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Read a referenced file, mapping absence and emptiness to their own errors.
pub(crate) fn read_bytes(kind: FileKind, path: &Path) -> Result<Vec<u8>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::ReferencedFileMissing {
                kind,
                path: path.display().to_string(),
            })
        }
        Err(e) => return Err(corrupt(kind, path, format!("could not be read: {e}"))),
    };
    if bytes.is_empty() {
        return Err(corrupt(kind, path, "is empty"));
    }
    Ok(bytes)
}

fn decode<T: DeserializeOwned>(
    kind: FileKind,
    path: &Path,
    magic: [u8; 4],
    bytes: &[u8],
) -> Result<Vec<T>> {
    let header: FileHeader =
        bincode::deserialize(bytes).map_err(|_| corrupt(kind, path, "has a truncated header"))?;
    if header.magic != magic {
        return Err(corrupt(kind, path, "has an invalid header"));
    }
    if header.version != FORMAT_VERSION {
        return Err(corrupt(
            kind,
            path,
            format!("has unsupported format version {}", header.version),
        ));
    }
    let body: FileBody<T> = bincode::deserialize(bytes)
        .map_err(|e| corrupt(kind, path, format!("is corrupt: {e}")))?;
    if body.records.is_empty() {
        return Err(corrupt(kind, path, "contains no records"));
    }
    Ok(body.records)
}

fn encode<T: Serialize>(magic: [u8; 4], records: &[T]) -> Result<Vec<u8>> {
    let body = FileBodyRef {
        header: FileHeader {
            magic,
            version: FORMAT_VERSION,
        },
        records,
    };
    bincode::serialize(&body).map_err(|e| Error::Serialization(e.to_string()))
}

pub(crate) fn decode_graph(path: &Path, bytes: &[u8]) -> Result<Vec<EdgeRecord>> {
    decode(FileKind::Graph, path, GRAPH_MAGIC, bytes)
}

pub(crate) fn read_nodes(path: &Path) -> Result<Vec<FixedCoordinate>> {
    let bytes = read_bytes(FileKind::Nodes, path)?;
    decode(FileKind::Nodes, path, NODES_MAGIC, &bytes)
}

pub(crate) fn read_names(path: &Path) -> Result<Vec<String>> {
    let bytes = read_bytes(FileKind::Names, path)?;
    decode(FileKind::Names, path, NAMES_MAGIC, &bytes)
}

pub(crate) fn read_timestamp(path: &Path) -> Result<String> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::ReferencedFileMissing {
                kind: FileKind::Timestamp,
                path: path.display().to_string(),
            })
        }
        Err(e) => {
            return Err(corrupt(
                FileKind::Timestamp,
                path,
                format!("could not be read: {e}"),
            ))
        }
    };
    let trimmed = text.trim();
    Ok(if trimmed.is_empty() {
        "n/a".to_string()
    } else {
        trimmed.to_string()
    })
}

pub fn encode_graph(edges: &[EdgeRecord]) -> Result<Vec<u8>> {
    encode(GRAPH_MAGIC, edges)
}

pub fn encode_nodes(nodes: &[FixedCoordinate]) -> Result<Vec<u8>> {
    encode(NODES_MAGIC, nodes)
}

pub fn encode_names(names: &[String]) -> Result<Vec<u8>> {
    encode(NAMES_MAGIC, names)
}

/// Write a file, mapping IO failures to `Error::Io`.
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).map_err(|e| Error::Io(format!("{}: {e}", path.display())))
}
