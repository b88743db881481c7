//! Record import service
//!
//! Loads record files into a hierarchy store, one group per line.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::record::RecordParser;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::HierarchyStore;
use crate::infrastructure::traits::FileSystem;

/// Default extension of record files picked up from directories.
pub const DEFAULT_RECORD_EXTENSION: &str = "tol";

/// Service for filling a store from record files.
pub struct ImportService {
    fs: Arc<dyn FileSystem>,
    parser: RecordParser,
    extension: String,
}

impl ImportService {
    /// Create a new import service picking up `*.<extension>` files from directories.
    pub fn new(fs: Arc<dyn FileSystem>, extension: impl Into<String>) -> Self {
        Self {
            fs,
            parser: RecordParser::new(),
            extension: extension.into(),
        }
    }

    /// Import a file, or every record file below a directory.
    ///
    /// Returns the number of groups created.
    #[instrument(level = "debug", skip(self, store))]
    pub fn import_path(&self, path: &Path, store: &mut HierarchyStore) -> ApplicationResult<usize> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::InputNotFound(path.to_path_buf()));
        }
        if self.fs.is_dir(path) {
            self.import_dir(path, store)
        } else {
            self.import_file(path, store)
        }
    }

    /// Import every matching file below `dir`, in path order.
    #[instrument(level = "debug", skip(self, store))]
    pub fn import_dir(&self, dir: &Path, store: &mut HierarchyStore) -> ApplicationResult<usize> {
        let files = self.record_files(dir)?;
        debug!("import_dir: {} record files", files.len());
        let mut created = 0;
        for file in files {
            created += self.import_file(&file, store)?;
        }
        Ok(created)
    }

    /// Import one record file.
    #[instrument(level = "debug", skip(self, store))]
    pub fn import_file(&self, path: &Path, store: &mut HierarchyStore) -> ApplicationResult<usize> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read records", path)?;
        self.import_str(&content, path, store)
    }

    /// Import records from text; `origin` is only used in error messages.
    ///
    /// Stops at the first bad line. Groups created before it stay in the store.
    pub fn import_str(
        &self,
        content: &str,
        origin: &Path,
        store: &mut HierarchyStore,
    ) -> ApplicationResult<usize> {
        let mut created = 0;
        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let record = self
                .parser
                .parse_line(line)
                .map_err(|e| ApplicationError::InvalidRecord {
                    path: origin.to_path_buf(),
                    line: line_no,
                    message: e.message,
                })?;
            let Some(record) = record else {
                continue;
            };
            record
                .apply(store)
                .map_err(|source| ApplicationError::Import {
                    path: origin.to_path_buf(),
                    line: line_no,
                    source,
                })?;
            created += 1;
        }
        debug!("import: {} groups from {}", created, origin.display());
        Ok(created)
    }

    fn record_files(&self, dir: &Path) -> ApplicationResult<Vec<PathBuf>> {
        let files = self
            .fs
            .list_files(dir)
            .with_path_context("list record files", dir)?;
        Ok(files
            .into_iter()
            .filter(|p| p.extension() == Some(OsStr::new(&self.extension)))
            .collect())
    }
}
