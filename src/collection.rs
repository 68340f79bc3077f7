//! The shared file collection and the per-invocation result set.
//!
//! A [`FileCollection`] maps `/`-separated relative paths to [`FileRecord`]s.
//! It is owned by the caller and borrowed by [`convert`](crate::convert) for
//! one invocation, during which every pass and every per-file task may read
//! and write it at the same time. Both types are backed by `dashmap`, so
//! writers lock a single shard briefly and never hold a lock across image
//! work.
//!
//! A [`ResultSet`] records the output paths created by the current
//! invocation. It lives for exactly one `convert` call: outputs of an earlier,
//! separate call are ordinary inputs to the next one.

use crate::imaging::Dimensions;
use dashmap::{DashMap, DashSet};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(String),
}

/// One file: raw bytes plus metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecord {
    pub contents: Vec<u8>,
    /// Set by conversion: on outputs from the encoded bytes, on inputs from
    /// the source bytes.
    pub image_size: Option<Dimensions>,
    /// Caller metadata, carried untouched.
    pub metadata: BTreeMap<String, String>,
}

impl FileRecord {
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: contents.into(),
            ..Default::default()
        }
    }
}

/// Concurrency-safe path → file map.
#[derive(Debug, Default)]
pub struct FileCollection {
    files: DashMap<String, FileRecord>,
}

impl FileCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<String>, record: FileRecord) -> Option<FileRecord> {
        self.files.insert(path.into(), record)
    }

    pub fn remove(&self, path: &str) -> Option<FileRecord> {
        self.files.remove(path).map(|(_, record)| record)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// A copy of the record at `path`.
    pub fn get(&self, path: &str) -> Option<FileRecord> {
        self.files.get(path).map(|r| r.value().clone())
    }

    /// A copy of just the bytes at `path`.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.files.get(path).map(|r| r.contents.clone())
    }

    /// Set `image_size` on an existing record. Returns `false` if the path is
    /// gone.
    pub fn set_image_size(&self, path: &str, size: Dimensions) -> bool {
        match self.files.get_mut(path) {
            Some(mut record) => {
                record.image_size = Some(size);
                true
            }
            None => false,
        }
    }

    /// Snapshot of the current keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.files.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Consume the collection into a path-ordered map.
    pub fn into_sorted(self) -> BTreeMap<String, FileRecord> {
        self.files.into_iter().collect()
    }

    /// Load every regular file under `root`, keyed by its `/`-separated path
    /// relative to `root`.
    pub fn from_dir(root: &Path) -> Result<Self, CollectionError> {
        let collection = Self::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let key = relative_key(root, entry.path())?;
            collection.insert(key, FileRecord::new(fs::read(entry.path())?));
        }
        Ok(collection)
    }

    /// Write every record to `root/<key>`, creating directories as needed.
    pub fn write_to_dir(&self, root: &Path) -> Result<usize, CollectionError> {
        let mut written = 0;
        for entry in self.files.iter() {
            let target = root.join(entry.key());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, &entry.contents)?;
            written += 1;
        }
        Ok(written)
    }
}

impl FromIterator<(String, FileRecord)> for FileCollection {
    fn from_iter<I: IntoIterator<Item = (String, FileRecord)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

fn relative_key(root: &Path, path: &Path) -> Result<String, CollectionError> {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    parts
        .map(|p| p.join("/"))
        .ok_or_else(|| CollectionError::NonUtf8Path(path.display().to_string()))
}

/// Output paths produced during one invocation.
#[derive(Debug, Default)]
pub struct ResultSet {
    produced: DashSet<String>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path`. Returns `false` if it was already recorded.
    pub fn mark(&self, path: impl Into<String>) -> bool {
        self.produced.insert(path.into())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.produced.contains(path)
    }

    pub fn len(&self) -> usize {
        self.produced.len()
    }

    pub fn is_empty(&self) -> bool {
        self.produced.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn insert_get_remove() {
        let files = FileCollection::new();
        files.insert("a/b.png", FileRecord::new(b"abc".to_vec()));
        assert!(files.contains("a/b.png"));
        assert_eq!(files.contents("a/b.png").unwrap(), b"abc");

        let removed = files.remove("a/b.png").unwrap();
        assert_eq!(removed.contents, b"abc");
        assert!(files.is_empty());
    }

    #[test]
    fn set_image_size_on_missing_path_is_noop() {
        let files = FileCollection::new();
        assert!(!files.set_image_size("nope.png", Dimensions::new(1, 1)));
    }

    #[test]
    fn keys_are_a_sorted_snapshot() {
        let files: FileCollection = [
            ("b.png".to_string(), FileRecord::default()),
            ("a.png".to_string(), FileRecord::default()),
        ]
        .into_iter()
        .collect();
        let keys = files.keys();
        files.insert("c.png", FileRecord::default());
        assert_eq!(keys, vec!["a.png", "b.png"]);
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn result_set_mark_reports_duplicates() {
        let results = ResultSet::new();
        assert!(results.mark("x.jpg"));
        assert!(!results.mark("x.jpg"));
        assert!(results.contains("x.jpg"));
        assert!(!results.contains("y.jpg"));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn dir_roundtrip_uses_slash_keys() {
        let src = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("nested/deeper")).unwrap();
        fs::write(src.path().join("top.png"), b"1").unwrap();
        fs::write(src.path().join("nested/deeper/inner.png"), b"2").unwrap();

        let files = FileCollection::from_dir(src.path()).unwrap();
        assert_eq!(files.keys(), vec!["nested/deeper/inner.png", "top.png"]);

        let dst = TempDir::new().unwrap();
        let written = files.write_to_dir(dst.path()).unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            fs::read(dst.path().join("nested/deeper/inner.png")).unwrap(),
            b"2"
        );
    }
}
