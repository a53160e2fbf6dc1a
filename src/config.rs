//! Loads the project configuration from a `nearby.yaml` file, e.g.:
//!
//! ```yaml
//! dataset: villes.json
//! scheme: french
//! count: 10
//! summary: departements.json
//! ```
//!
//! `scheme` is either the name of a built-in [`Scheme`] (`french`, `finnish`)
//! or an inline scheme table. Paths are relative to the project file.

use crate::nearby::DEFAULT_COUNT;
use crate::scheme::Scheme;
use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "nearby.yaml";

#[derive(Deserialize)]
struct Count(usize);
impl Default for Count {
    fn default() -> Self {
        Count(DEFAULT_COUNT)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemeSource {
    Builtin(String),
    Inline(Scheme),
}

impl Default for SchemeSource {
    fn default() -> Self {
        SchemeSource::Builtin(String::from("french"))
    }
}

#[derive(Deserialize)]
struct Project {
    dataset: PathBuf,

    #[serde(default)]
    scheme: SchemeSource,

    #[serde(default)]
    count: Count,

    #[serde(default)]
    threads: Option<usize>,

    #[serde(default)]
    summary: Option<PathBuf>,
}

pub struct Config {
    /// The JSON file holding the locations.
    pub dataset: PathBuf,

    /// How postal codes are grouped and how groups are named.
    pub scheme: Scheme,

    /// The number of nearby locations to find for each location.
    pub count: usize,

    /// The number of worker threads used to match locations. Values below 2
    /// match on the calling thread.
    pub threads: usize,

    /// Where to write the group summary JSON, if anywhere.
    pub summary: Option<PathBuf>,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a [`PROJECT_FILE`]
    /// and loads the first one found. `threads` overrides the project file's
    /// setting.
    pub fn from_directory(dir: &Path, threads: Option<usize>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            match Config::from_project_file(&path, threads) {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {:?}", e)),
            }
        } else {
            match dir.parent() {
                Some(dir) => Config::from_directory(dir, threads),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, threads: Option<usize>) -> Result<Config> {
        let file = File::open(path)
            .map_err(|e| anyhow!("Opening project file `{}`: {}", path.display(), e))?;
        let project: Project = serde_yaml::from_reader(file)?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => Ok(Config {
                dataset: project_root.join(&project.dataset),
                scheme: match project.scheme {
                    SchemeSource::Inline(scheme) => scheme,
                    SchemeSource::Builtin(name) => Scheme::builtin(&name)
                        .ok_or_else(|| anyhow!("Unknown scheme `{}`", name))?,
                },
                count: project.count.0,
                threads: match threads.or(project.threads) {
                    None => num_cpus::get(),
                    Some(threads) => threads,
                },
                summary: project.summary.map(|summary| project_root.join(summary)),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_project_file() -> Result<()> {
        let config = Config::from_project_file(Path::new("./testdata/project/nearby.yaml"), None)?;
        assert_eq!(PathBuf::from("./testdata/project/villes.json"), config.dataset);
        assert_eq!(Scheme::french(), config.scheme);
        assert_eq!(3, config.count);
        assert_eq!(1, config.threads);
        assert_eq!(None, config.summary);
        Ok(())
    }

    #[test]
    fn test_threads_override() -> Result<()> {
        let config =
            Config::from_project_file(Path::new("./testdata/project/nearby.yaml"), Some(4))?;
        assert_eq!(4, config.threads);
        Ok(())
    }

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let config = Config::from_directory(Path::new("./testdata/project/nested/deeper"), None)?;
        assert_eq!(PathBuf::from("./testdata/project/villes.json"), config.dataset);
        Ok(())
    }

    #[test]
    fn test_inline_scheme() -> Result<()> {
        let config = Config::from_directory(Path::new("./testdata/inline"), None)?;
        assert_eq!(DEFAULT_COUNT, config.count);
        assert_eq!("Alue", config.scheme.fallback_label);
        assert_eq!(Some("Helsinki"), config.scheme.names.get("00").map(String::as_str));
        assert_eq!(
            Some(PathBuf::from("./testdata/inline/out/alueet.json")),
            config.summary
        );
        assert!(config.threads >= 1);
        Ok(())
    }

    #[test]
    fn test_misspelled_inline_scheme() {
        assert!(Config::from_directory(Path::new("./testdata/typo"), None).is_err());
    }

    #[test]
    fn test_unknown_scheme() {
        let err = Config::from_directory(Path::new("./testdata/bad"), None)
            .err()
            .map(|e| e.to_string());
        assert!(err.map_or(false, |e| e.contains("Unknown scheme `klingon`")));
    }
}
