use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default data directory relative to the working directory.
const DEFAULT_DIR: &str = "data";

#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Resolve the data directory from, in order of priority:
    /// 1. An explicit path (from --data-dir)
    /// 2. The PASSFIND_DATA_DIR environment variable
    /// 3. The project-local `data/` directory
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let root = if let Some(path) = explicit {
            path.to_path_buf()
        } else if let Ok(val) = std::env::var("PASSFIND_DATA_DIR") {
            PathBuf::from(val)
        } else {
            PathBuf::from(DEFAULT_DIR)
        };

        std::fs::create_dir_all(&root)
            .map_err(|_| Error::DataDir(root.clone()))?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a source table, e.g. `table("book_df")` -> `data/book_df.csv`.
    pub fn table(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.csv"))
    }

    pub fn chunks_csv(&self) -> PathBuf {
        self.root.join("chunks.csv")
    }

    pub fn embeddings_file(&self) -> PathBuf {
        self.root.join("embeddings.bin")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_with_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = DataDir::resolve(Some(tmp.path())).unwrap();

        assert_eq!(dir.root(), tmp.path());
        assert_eq!(dir.table("book_df"), tmp.path().join("book_df.csv"));
        assert_eq!(dir.chunks_csv(), tmp.path().join("chunks.csv"));
        assert_eq!(dir.embeddings_file(), tmp.path().join("embeddings.bin"));
    }

    #[test]
    fn resolve_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        let dir = DataDir::resolve(Some(&nested)).unwrap();

        assert!(dir.root().exists());
        assert_eq!(dir.root(), nested);
    }
}
