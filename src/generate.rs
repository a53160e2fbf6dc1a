//! Exports the [`generate`] function which stitches together the steps of a
//! generation run: loading the dataset ([`crate::dataset`]), indexing it by
//! group ([`crate::index`]), finding each location's nearby locations
//! ([`crate::nearby`]), and writing the group summary. Rendering the pages
//! from the result is left to the caller.

use crate::config::Config;
use crate::dataset::{self, Error as DatasetError};
use crate::index::GroupIndex;
use crate::location::Location;
use crate::nearby::Matcher;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

/// Progress is logged every this many locations.
const PROGRESS_INTERVAL: usize = 1000;

/// A location paired with the locations to list as its neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Neighbours {
    pub location: Location,
    pub nearby: Vec<Location>,
}

/// Runs a generation from a [`Config`]. Returns one [`Neighbours`] per
/// location, in dataset order.
pub fn generate(config: &Config) -> Result<Vec<Neighbours>> {
    let locations = dataset::load(&config.dataset)?;
    let index = GroupIndex::new(&config.scheme, &locations);
    info!("{} groups identified", index.len());
    for (key, members) in index.groups() {
        debug!(group = %key, locations = members.len(), "indexed group");
    }

    let nearby = match_all(&index, &locations, config.count, config.threads)?;

    if let Some(path) = &config.summary {
        write_summary(&index, path)?;
        info!("group summary written to {}", path.display());
    }

    Ok(locations
        .iter()
        .zip(nearby)
        .map(|(location, nearby)| Neighbours {
            location: location.clone(),
            nearby: nearby.into_iter().cloned().collect(),
        })
        .collect())
}

/// Finds the `count` nearest locations for every location in `locations`,
/// which must be the dataset `index` was built from. The result is in the
/// same order as `locations`. With fewer than 2 `threads`, matching happens
/// on the calling thread; otherwise it's spread over a pool of workers.
pub fn match_all<'a>(
    index: &GroupIndex<'_, 'a>,
    locations: &'a [Location],
    count: usize,
    threads: usize,
) -> Result<Vec<Vec<&'a Location>>> {
    let matcher = Matcher::new(index);
    let progress = Progress::new(locations.len());
    if threads < 2 {
        Ok(locations
            .iter()
            .map(|location| {
                let nearby = matcher.find(location, count);
                progress.tick(location);
                nearby
            })
            .collect())
    } else {
        match_parallel(&matcher, locations, count, threads, &progress)
    }
}

fn match_parallel<'a>(
    matcher: &Matcher<'_, '_, 'a>,
    locations: &'a [Location],
    count: usize,
    threads: usize,
    progress: &Progress,
) -> Result<Vec<Vec<&'a Location>>> {
    use crossbeam_channel::unbounded;

    let (tx, rx) = unbounded::<usize>();
    for i in 0..locations.len() {
        // `rx` is held below, so the queue can't disconnect here.
        let _ = tx.send(i);
    }
    drop(tx);

    std::thread::scope(|scope| -> Result<Vec<Vec<&'a Location>>> {
        let mut workers = Vec::with_capacity(threads);
        for _ in 0..threads {
            let rx = rx.clone();
            workers.push(scope.spawn(move || {
                let mut v: Vec<(usize, Vec<&'a Location>)> = Vec::new();
                for i in rx {
                    v.push((i, matcher.find(&locations[i], count)));
                    progress.tick(&locations[i]);
                }
                v
            }));
        }

        let mut results: Vec<Vec<&'a Location>> = vec![Vec::new(); locations.len()];
        for worker in workers {
            for (i, nearby) in worker.join().map_err(|_| Error::WorkerPanicked)? {
                results[i] = nearby;
            }
        }
        Ok(results)
    })
}

/// Counts matched locations and logs every [`PROGRESS_INTERVAL`] of them, and
/// once more at the end.
struct Progress {
    done: AtomicUsize,
    total: usize,
}

impl Progress {
    fn new(total: usize) -> Progress {
        Progress {
            done: AtomicUsize::new(0),
            total,
        }
    }

    fn tick(&self, last: &Location) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % PROGRESS_INTERVAL == 0 || done == self.total {
            let percent = done as f64 / self.total as f64 * 100.0;
            info!("[{}/{}] {:.1}% - last: {}", done, self.total, percent, last.name);
        }
    }
}

fn write_summary(index: &GroupIndex, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|err| Error::CreateSummary {
            path: path.to_owned(),
            err,
        })?;
    }
    let file = File::create(path).map_err(|err| Error::CreateSummary {
        path: path.to_owned(),
        err,
    })?;
    index
        .write_summaries(BufWriter::new(file))
        .map_err(|err| Error::WriteSummary {
            path: path.to_owned(),
            err,
        })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for a generation run.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors loading the dataset.
    Dataset(DatasetError),

    /// Returned for I/O problems while creating the summary file or its
    /// directory.
    CreateSummary { path: PathBuf, err: std::io::Error },

    /// Returned for errors serializing or writing the group summary.
    WriteSummary {
        path: PathBuf,
        err: serde_json::Error,
    },

    /// Returned when a matching worker panics.
    WorkerPanicked,
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Dataset(err) => err.fmt(f),
            Error::CreateSummary { path, err } => {
                write!(f, "Creating summary file '{}': {}", path.display(), err)
            }
            Error::WriteSummary { path, err } => {
                write!(f, "Writing summary file '{}': {}", path.display(), err)
            }
            Error::WorkerPanicked => write!(f, "A matching worker panicked"),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Dataset(err) => Some(err),
            Error::CreateSummary { path: _, err } => Some(err),
            Error::WriteSummary { path: _, err } => Some(err),
            Error::WorkerPanicked => None,
        }
    }
}

impl From<DatasetError> for Error {
    /// Converts [`DatasetError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: DatasetError) -> Error {
        Error::Dataset(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scheme::Scheme;

    fn ids(locations: &[Location]) -> Vec<&str> {
        locations.iter().map(|l| l.id.as_str()).collect()
    }

    fn config(threads: usize, summary: Option<PathBuf>) -> Config {
        Config {
            dataset: PathBuf::from("./testdata/project/villes.json"),
            scheme: Scheme::french(),
            count: 3,
            threads,
            summary,
        }
    }

    #[test]
    fn test_generate() -> Result<()> {
        let neighbours = generate(&config(1, None))?;
        assert_eq!(12, neighbours.len());

        assert_eq!("paris-1er", neighbours[0].location.id);
        assert_eq!(vec!["paris-2e", "paris-10e", "rouen"], ids(&neighbours[0].nearby));

        // 97x departments are three digits wide, so Guadeloupe only widens
        // to 970 and 972.
        assert_eq!("basse-terre", neighbours[9].location.id);
        assert_eq!(vec!["pointe-a-pitre"], ids(&neighbours[9].nearby));

        // Corsica's key isn't numeric.
        assert_eq!("ajaccio", neighbours[11].location.id);
        assert!(neighbours[11].nearby.is_empty());
        Ok(())
    }

    #[test]
    fn test_parallel_matches_sequential() -> Result<()> {
        assert_eq!(generate(&config(1, None))?, generate(&config(4, None))?);
        Ok(())
    }

    #[test]
    fn test_more_workers_than_locations() -> Result<()> {
        let scheme = Scheme::french();
        let locations = vec![
            Location::new("a", "A", "75001"),
            Location::new("b", "B", "75010"),
        ];
        let index = GroupIndex::new(&scheme, &locations);
        let nearby = match_all(&index, &locations, 10, 8)?;
        assert_eq!(match_all(&index, &locations, 10, 1)?, nearby);
        assert_eq!("b", nearby[0][0].id);
        assert_eq!("a", nearby[1][0].id);
        Ok(())
    }

    #[test]
    fn test_match_all_empty() -> Result<()> {
        let scheme = Scheme::french();
        let index = GroupIndex::new(&scheme, &[]);
        assert!(match_all(&index, &[], 10, 1)?.is_empty());
        assert!(match_all(&index, &[], 10, 3)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_write_summary() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("nearby-summary-{}", std::process::id()));
        let path = dir.join("departements.json");
        generate(&config(1, Some(path.clone())))?;

        let contents = std::fs::read_to_string(&path).map_err(|err| Error::CreateSummary {
            path: path.clone(),
            err,
        })?;
        let _ = std::fs::remove_dir_all(&dir);

        let summaries: serde_json::Value =
            serde_json::from_str(&contents).map_err(|err| Error::WriteSummary {
                path: path.clone(),
                err,
            })?;
        let codes: Vec<&str> = summaries
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|s| s["code"].as_str())
            .collect();
        assert_eq!(vec!["01", "02", "2A", "74", "75", "76", "971"], codes);
        assert_eq!("Ain", summaries[0]["name"]);
        assert_eq!(2, summaries[0]["count"]);
        Ok(())
    }

    #[test]
    fn test_finnish_project() -> anyhow::Result<()> {
        let mut config = Config::from_directory(Path::new("./testdata/inline"), Some(1))?;
        config.summary = None;
        let neighbours = generate(&config)?;

        assert_eq!("helsinki", neighbours[0].location.id);
        assert_eq!(vec!["vantaa"], ids(&neighbours[0].nearby));
        assert_eq!("espoo", neighbours[1].location.id);
        assert_eq!(vec!["kauniainen", "vantaa"], ids(&neighbours[1].nearby));
        Ok(())
    }

    #[test]
    fn test_missing_dataset() {
        let mut config = config(1, None);
        config.dataset = PathBuf::from("./testdata/missing.json");
        match generate(&config) {
            Err(Error::Dataset(DatasetError::Open { .. })) => {}
            other => panic!("wanted Error::Dataset, got {:?}", other),
        }
    }
}
