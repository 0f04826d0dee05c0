//! Fixture files used by the template functions.
//!
//! A fixture named `cities` lives at `<dir>/cities.dat`. Line fixtures are
//! plain text, property fixtures are YAML mappings. Every call reads the file
//! again; there is no cache, so these are blocking operations.

use crate::value::Value;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

pub const FIXTURE_EXT: &str = "dat";

static FILE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn file_name_regex() -> &'static Regex {
    FILE_NAME_REGEX.get_or_init(|| Regex::new(r"^[\w-]+(\.?[\w-]+)+$").unwrap())
}

/// Fixture names are plain tokens; separators and `..` are rejected.
pub fn valid_file_name(name: &str) -> bool {
    file_name_regex().is_match(name)
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("invalid file-name '{0}'")]
    InvalidName(String),
    #[error("failed to read fixture '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse fixture '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("fixture '{0}' has no lines")]
    Empty(PathBuf),
}

#[derive(Debug, Clone)]
pub struct FixtureStore {
    dir: PathBuf,
}

impl Default for FixtureStore {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FixtureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf, FixtureError> {
        if !valid_file_name(name) {
            return Err(FixtureError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.{FIXTURE_EXT}")))
    }

    fn read(&self, name: &str) -> Result<(PathBuf, String), FixtureError> {
        let path = self.path_for(name)?;
        let contents = std::fs::read_to_string(&path).map_err(|source| FixtureError::Io {
            path: path.clone(),
            source,
        })?;
        Ok((path, contents))
    }

    /// Non-blank lines of the fixture, trimmed.
    pub fn lines(&self, name: &str) -> Result<Vec<String>, FixtureError> {
        self.read_lines(name).map(|(_, lines)| lines)
    }

    fn read_lines(&self, name: &str) -> Result<(PathBuf, Vec<String>), FixtureError> {
        let (path, contents) = self.read(name)?;
        let lines = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok((path, lines))
    }

    pub fn random_line<R: Rng>(&self, name: &str, rng: &mut R) -> Result<String, FixtureError> {
        let (path, lines) = self.read_lines(name)?;
        lines.choose(rng).cloned().ok_or(FixtureError::Empty(path))
    }

    /// Same line for the same seed; a zero seed picks at random.
    pub fn seeded_line(&self, name: &str, seed: u64) -> Result<String, FixtureError> {
        if seed == 0 {
            return self.random_line(name, &mut StdRng::from_entropy());
        }
        self.random_line(name, &mut StdRng::seed_from_u64(seed))
    }

    /// Top-level `key` of a YAML mapping fixture; a missing key is null.
    pub fn property(&self, name: &str, key: &str) -> Result<Value, FixtureError> {
        let (path, contents) = self.read(name)?;
        let doc: serde_yaml::Value =
            serde_yaml::from_str(&contents).map_err(|source| FixtureError::Yaml { path, source })?;
        Ok(Value::from(doc).get(key).unwrap_or_default())
    }
}
