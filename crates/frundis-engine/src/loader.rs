//! Source file lookup for the main document and `.If` inclusions.

use crate::config::Config;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where the engine gets source text from.
pub trait SourceLoader {
    /// Resolve a name as written by the author to a key usable with
    /// [`SourceLoader::read`], or `None` when nothing matches.
    fn resolve(&self, name: &str) -> Option<String>;

    fn read(&self, key: &str) -> io::Result<String>;
}

/// Filesystem loader: the name as given (relative to the working
/// directory), then each include directory in order.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    include_dirs: Vec<PathBuf>,
}

impl FsLoader {
    pub fn new(include_dirs: Vec<PathBuf>) -> Self {
        Self { include_dirs }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.include_dirs.clone())
    }
}

impl SourceLoader for FsLoader {
    fn resolve(&self, name: &str) -> Option<String> {
        let path = Path::new(name);
        if path.is_file() {
            return Some(name.to_string());
        }
        if path.is_absolute() {
            return None;
        }
        self.include_dirs
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.is_file())
            .map(|found| found.to_string_lossy().into_owned())
    }

    fn read(&self, key: &str) -> io::Result<String> {
        fs::read_to_string(key)
    }
}

/// In-memory loader keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: &str, content: &str) -> Self {
        self.insert(name, content);
        self
    }

    pub fn insert(&mut self, name: &str, content: &str) {
        self.files.insert(name.to_string(), content.to_string());
    }
}

impl SourceLoader for MemoryLoader {
    fn resolve(&self, name: &str) -> Option<String> {
        self.files.contains_key(name).then(|| name.to_string())
    }

    fn read(&self, key: &str) -> io::Result<String> {
        self.files
            .get(key)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fs_loader_searches_include_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib");
        fs::create_dir(&lib).unwrap();
        fs::write(lib.join("macros.frundis"), ".#dv x 1\n").unwrap();

        let loader = FsLoader::new(vec![dir.path().join("missing"), lib.clone()]);
        let key = loader.resolve("macros.frundis").unwrap();
        assert_eq!(PathBuf::from(&key), lib.join("macros.frundis"));
        assert_eq!(loader.read(&key).unwrap(), ".#dv x 1\n");
    }

    #[test]
    fn test_fs_loader_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.frundis");
        fs::write(&file, "text\n").unwrap();

        let loader = FsLoader::default();
        let name = file.to_string_lossy().into_owned();
        assert_eq!(loader.resolve(&name), Some(name.clone()));
        assert_eq!(loader.resolve(&format!("{name}.missing")), None);
    }

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with_file("a", "content");
        assert_eq!(loader.resolve("a"), Some("a".to_string()));
        assert_eq!(loader.resolve("b"), None);
        assert_eq!(loader.read("a").unwrap(), "content");
        assert_eq!(loader.read("b").unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
