//! Cached file text for one verification run.
//!
//! Paths are relative to the project root. Each file is read at most once per
//! run; later lookups return the cached text (or the cached failure).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use globset::Glob;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

/// Why a file could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("file unreadable: {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

impl LoadError {
    pub fn path(&self) -> &str {
        match self {
            LoadError::NotFound(p) => p,
            LoadError::Unreadable { path, .. } => path,
        }
    }
}

type Entry = Result<Arc<str>, LoadError>;

/// Counts of distinct files touched during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    pub files_inspected: usize,
    pub files_missing: usize,
}

/// Read-through cache of file contents under a root directory.
pub struct Corpus {
    root: PathBuf,
    cache: RwLock<HashMap<String, Entry>>,
}

impl Corpus {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a file's text, reading from disk only on first access.
    pub fn load(&self, rel_path: &str) -> Result<Arc<str>, LoadError> {
        if let Some(entry) = self.read_cache().get(rel_path) {
            return entry.clone();
        }

        let entry = self.read_from_disk(rel_path);
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        // Another thread may have raced us; keep the first entry.
        cache
            .entry(rel_path.to_string())
            .or_insert(entry)
            .clone()
    }

    /// True iff the path resolves to a non-empty file.
    pub fn exists(&self, rel_path: &str) -> bool {
        match self.load(rel_path) {
            Ok(text) => crate::matchers::exists(Some(&text)),
            Err(_) => false,
        }
    }

    /// Files under `dir` whose file name matches `glob`, as root-relative
    /// paths with forward slashes, sorted.
    ///
    /// Returns `NotFound` when `dir` does not exist and `Unreadable` when the
    /// walk hits an entry it cannot read.
    pub fn discover(&self, dir: &str, glob: &str) -> Result<Vec<String>, LoadError> {
        let base = self.root.join(dir);
        if !base.is_dir() {
            return Err(LoadError::NotFound(dir.to_string()));
        }

        let matcher = Glob::new(glob)
            .map_err(|e| LoadError::Unreadable {
                path: dir.to_string(),
                reason: format!("invalid glob {:?}: {}", glob, e),
            })?
            .compile_matcher();

        let mut found = Vec::new();
        for entry in WalkDir::new(&base).follow_links(true) {
            let entry = entry.map_err(|e| {
                tracing::warn!(dir, error = %e, "unreadable entry");
                LoadError::Unreadable {
                    path: e
                        .path()
                        .and_then(|p| p.strip_prefix(&self.root).ok())
                        .map(|p| p.to_string_lossy().replace('\\', "/"))
                        .unwrap_or_else(|| dir.to_string()),
                    reason: e.to_string(),
                }
            })?;
            if !entry.file_type().is_file() || !matcher.is_match(entry.file_name()) {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                found.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
        found.sort();
        Ok(found)
    }

    pub fn stats(&self) -> CorpusStats {
        let cache = self.read_cache();
        let missing = cache.values().filter(|e| e.is_err()).count();
        CorpusStats {
            files_inspected: cache.len() - missing,
            files_missing: missing,
        }
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.cache.read().unwrap_or_else(|e| e.into_inner())
    }

    fn read_from_disk(&self, rel_path: &str) -> Entry {
        let full = self.root.join(rel_path);
        match std::fs::read(&full) {
            Ok(bytes) => {
                tracing::trace!(path = rel_path, bytes = bytes.len(), "loaded");
                Ok(Arc::from(String::from_utf8_lossy(&bytes).as_ref()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound || full.is_dir() => {
                tracing::debug!(path = rel_path, "not found");
                Err(LoadError::NotFound(rel_path.to_string()))
            }
            Err(e) => Err(LoadError::Unreadable {
                path: rel_path.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_and_cache() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.h"), "void Foo();").unwrap();

        let corpus = Corpus::new(temp.path());
        assert_eq!(&*corpus.load("a.h").unwrap(), "void Foo();");

        // Cached text survives the file changing on disk.
        std::fs::write(temp.path().join("a.h"), "changed").unwrap();
        assert_eq!(&*corpus.load("a.h").unwrap(), "void Foo();");
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let corpus = Corpus::new(temp.path());
        assert_eq!(
            corpus.load("nope.cpp"),
            Err(LoadError::NotFound("nope.cpp".to_string()))
        );
        assert!(!corpus.exists("nope.cpp"));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        let corpus = Corpus::new(temp.path());
        assert!(matches!(corpus.load("sub"), Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_exists_requires_content() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("empty.txt"), "").unwrap();
        let corpus = Corpus::new(temp.path());
        assert!(!corpus.exists("empty.txt"));
    }

    #[test]
    fn test_lossy_decoding() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("bin.cpp"), [b'o', b'k', 0xff]).unwrap();
        let corpus = Corpus::new(temp.path());
        assert!(corpus.load("bin.cpp").unwrap().starts_with("ok"));
    }

    #[test]
    fn test_discover() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("test/integration/nested");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(temp.path().join("test/integration/b.cpp"), "x").unwrap();
        std::fs::write(dir.join("a.cpp"), "x").unwrap();
        std::fs::write(dir.join("a.h"), "x").unwrap();

        let corpus = Corpus::new(temp.path());
        let files = corpus.discover("test/integration", "*.cpp").unwrap();
        assert_eq!(
            files,
            vec![
                "test/integration/b.cpp".to_string(),
                "test/integration/nested/a.cpp".to_string(),
            ]
        );
        assert!(matches!(
            corpus.discover("test/missing", "*.cpp"),
            Err(LoadError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_broken_link_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("test/integration");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.cpp"), "x").unwrap();
        std::os::unix::fs::symlink(dir.join("missing-target.cpp"), dir.join("b.cpp")).unwrap();

        let corpus = Corpus::new(temp.path());
        match corpus.discover("test/integration", "*.cpp") {
            Err(LoadError::Unreadable { path, .. }) => assert_eq!(path, "test/integration/b.cpp"),
            other => panic!("unexpected discover result {:?}", other),
        }
    }

    #[test]
    fn test_stats() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.cpp"), "x").unwrap();
        let corpus = Corpus::new(temp.path());
        let _ = corpus.load("a.cpp");
        let _ = corpus.load("a.cpp");
        let _ = corpus.load("b.cpp");
        assert_eq!(
            corpus.stats(),
            CorpusStats {
                files_inspected: 1,
                files_missing: 1,
            }
        );
    }
}
