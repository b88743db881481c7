//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::application::services::ImportService;
use crate::config::Settings;
use crate::domain::HierarchyStore;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraResult;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Record import
    pub import: ImportService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let import = ImportService::new(Arc::clone(&fs), settings.record_extension.clone());

        Self {
            settings,
            fs,
            import,
        }
    }

    /// Empty store labelled according to the settings.
    pub fn new_store(&self) -> HierarchyStore {
        HierarchyStore::with_root_label(&self.settings.root_label)
    }

    /// Fresh store filled from `inputs`, in order.
    pub fn load_store(&self, inputs: &[PathBuf]) -> InfraResult<HierarchyStore> {
        let mut store = self.new_store();
        for input in inputs {
            let created = self.import.import_path(input, &mut store)?;
            debug!("loaded {} groups from {}", created, input.display());
        }
        Ok(store)
    }
}
