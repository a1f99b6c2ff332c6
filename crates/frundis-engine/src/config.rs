//! Compilation settings.

use std::path::PathBuf;

/// Maximum nesting of user macro calls and file inclusions.
pub const DEFAULT_MAX_DEPTH: usize = 42;

/// Environment variable holding extra include directories, `:`-separated.
pub const INCLUDE_PATH_VAR: &str = "FRUNDISLIB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Allow `.#run` and shell filters of `.X ftag`.
    pub unrestricted: bool,
    /// Searched in order after the current directory by `.If`.
    pub include_dirs: Vec<PathBuf>,
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unrestricted: false,
            include_dirs: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Config {
    /// Default settings, with include directories taken from `FRUNDISLIB`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(INCLUDE_PATH_VAR) {
            config.include_dirs = split_include_dirs(&value);
        }
        config
    }

    pub fn unrestricted(mut self, yes: bool) -> Self {
        self.unrestricted = yes;
        self
    }

    pub fn include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }
}

fn split_include_dirs(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}
