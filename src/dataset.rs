//! Loads [`Location`]s from a JSON dataset file. The file is an array of
//! objects with `name`, `slug`, and `zip` fields, e.g.:
//!
//! ```json
//! [
//!   {"name": "Paris", "slug": "paris", "zip": "75001"},
//!   {"name": "Bourg-en-Bresse", "slug": "bourg-en-bresse", "zip": "01000"}
//! ]
//! ```

use crate::location::Location;
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Reads the dataset at `path`. Duplicate identifiers aren't rejected, but
/// each one is logged since the matcher treats identifiers as unique.
pub fn load(path: &Path) -> Result<Vec<Location>> {
    let file = File::open(path).map_err(|err| Error::Open {
        path: path.to_owned(),
        err,
    })?;
    let locations = from_reader(BufReader::new(file)).map_err(|err| match err {
        Error::DeserializeJson { path: _, err } => Error::DeserializeJson {
            path: Some(path.to_owned()),
            err,
        },
        err => err,
    })?;
    info!("{} locations loaded from {}", locations.len(), path.display());
    Ok(locations)
}

/// Reads a dataset from any reader. See [`load`].
pub fn from_reader<R: Read>(r: R) -> Result<Vec<Location>> {
    let locations: Vec<Location> =
        serde_json::from_reader(r).map_err(|err| Error::DeserializeJson { path: None, err })?;
    for id in duplicate_ids(&locations) {
        warn!("duplicate location identifier `{}`", id);
    }
    Ok(locations)
}

/// Returns each identifier that occurs more than once, in order of its
/// second occurrence.
pub fn duplicate_ids(locations: &[Location]) -> Vec<&str> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut reported: HashSet<&str> = HashSet::new();
    locations
        .iter()
        .map(|location| location.id.as_str())
        .filter(|id| !seen.insert(*id) && reported.insert(*id))
        .collect()
}

/// The result of a fallible dataset-loading operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a dataset.
#[derive(Debug)]
pub enum Error {
    /// Returned when the dataset file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the dataset isn't a JSON array of locations. `path` is
    /// unset when reading from an arbitrary reader.
    DeserializeJson {
        path: Option<PathBuf>,
        err: serde_json::Error,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Open { path, err } => {
                write!(f, "Opening dataset file '{}': {}", path.display(), err)
            }
            Error::DeserializeJson {
                path: Some(path),
                err,
            } => write!(f, "Parsing dataset file '{}': {}", path.display(), err),
            Error::DeserializeJson { path: None, err } => {
                write!(f, "Parsing dataset: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Open { path: _, err } => Some(err),
            Error::DeserializeJson { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_load() -> Result<()> {
        let locations = load(Path::new("./testdata/project/villes.json"))?;
        assert_eq!(12, locations.len());
        assert_eq!(Location::new("paris-1er", "Paris 1er", "75001"), locations[0]);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        match load(Path::new("./testdata/missing.json")) {
            Err(Error::Open { path, .. }) => {
                assert_eq!(PathBuf::from("./testdata/missing.json"), path)
            }
            other => panic!("wanted Error::Open, got {:?}", other),
        }
    }

    #[test]
    fn test_from_reader_invalid() {
        let input = r#"[{"name": "Paris", "zip": "75001"}]"#;
        match from_reader(input.as_bytes()) {
            Err(Error::DeserializeJson { path: None, .. }) => {}
            other => panic!("wanted Error::DeserializeJson, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_ids() {
        let locations = vec![
            Location::new("a", "A", "75001"),
            Location::new("b", "B", "75002"),
            Location::new("a", "A bis", "75003"),
            Location::new("a", "A ter", "75004"),
            Location::new("b", "B bis", "75005"),
        ];
        assert_eq!(vec!["a", "b"], duplicate_ids(&locations));
        assert!(duplicate_ids(&locations[..2]).is_empty());
    }
}
