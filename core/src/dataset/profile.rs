// Dataset profile — the small INI file naming a dataset's files
//
// Keys may sit in any section. Relative file paths resolve against the
// profile directory. Only whole-line `#` or `;` comments are recognised, so
// paths may contain either character.
//
//   [files]
//   graph = berlin.graph
//   nodes = berlin.nodes
//   names = berlin.names
//   timestamp = berlin.timestamp

use crate::error::{Error, FileKind, Result};
use ini::{Ini, ParseOption};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Resolved locations of every file a dataset consists of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Profile path exactly as the caller supplied it
    pub source: String,
    pub graph: PathBuf,
    pub nodes: PathBuf,
    pub names: PathBuf,
    pub timestamp: Option<PathBuf>,
}

/// Backslashes stay literal so Windows paths survive.
fn parse_option() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    }
}

fn malformed(path: &str, reason: String) -> Error {
    Error::MalformedProfile {
        path: path.to_string(),
        reason,
    }
}

fn parse_error(path: &str, err: ini::ParseError) -> Error {
    malformed(path, format!("line {}: {}", err.line, err.msg))
}

impl Profile {
    /// Read and parse the profile at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let ini = match Ini::load_from_file_opt(path, parse_option()) {
            Ok(ini) => ini,
            Err(ini::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::DatasetNotFound { path: path.to_string() })
            }
            Err(ini::Error::Io(e)) if Path::new(path).is_dir() => {
                return Err(malformed(path, format!("is a directory ({e})")))
            }
            Err(ini::Error::Io(e)) => return Err(Error::Io(format!("{path}: {e}"))),
            Err(ini::Error::Parse(e)) => return Err(parse_error(path, e)),
        };
        Self::from_ini(path, &ini)
    }

    /// Parse profile text; `path` is used to resolve relative entries.
    pub fn parse(path: &str, contents: &str) -> Result<Self> {
        let ini = Ini::load_from_str_opt(contents, parse_option()).map_err(|e| parse_error(path, e))?;
        Self::from_ini(path, &ini)
    }

    fn from_ini(path: &str, ini: &Ini) -> Result<Self> {
        let base = Path::new(path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut graph = None;
        let mut nodes = None;
        let mut names = None;
        let mut timestamp = None;
        let mut saw_entry = false;

        for (section, properties) in ini.iter() {
            for (key, value) in properties.iter() {
                saw_entry = true;
                let value = value.trim();
                if value.is_empty() {
                    return Err(malformed(path, format!("`{key}` has no value")));
                }

                let slot = match key {
                    "graph" => &mut graph,
                    "nodes" => &mut nodes,
                    "names" => &mut names,
                    "timestamp" => &mut timestamp,
                    other => {
                        warn!(
                            "{}: ignoring unknown profile key `{}` in section {}",
                            path,
                            other,
                            section.unwrap_or("(general)")
                        );
                        continue;
                    }
                };
                if slot.is_some() {
                    return Err(malformed(path, format!("duplicate key `{key}`")));
                }
                *slot = Some(base.join(value));
            }
        }

        if !saw_entry {
            return Err(Error::DatasetEmpty { path: path.to_string() });
        }

        let require = |slot: Option<PathBuf>, kind: FileKind| {
            slot.ok_or_else(|| malformed(path, format!("missing required key `{}`", kind.profile_key())))
        };

        Ok(Self {
            source: path.to_string(),
            graph: require(graph, FileKind::Graph)?,
            nodes: require(nodes, FileKind::Nodes)?,
            names: require(names, FileKind::Names)?,
            timestamp,
        })
    }

    /// Canonical identity of this profile, used to name shared segments.
    pub fn segment_name(&self) -> String {
        std::fs::canonicalize(&self.source)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| self.source.clone())
    }
}
