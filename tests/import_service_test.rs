//! Tests for ImportService

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rstest::{fixture, rstest};
use tempfile::TempDir;

use taxotree::application::services::ImportService;
use taxotree::application::ApplicationError;
use taxotree::domain::{AttrValue, DomainError, GroupKey, HierarchyStore};
use taxotree::infrastructure::traits::{FileSystem, RealFileSystem};
use taxotree::util::testing;

const ANIMALS: &str = r#"# the canonical example
type="Life", name="Earth", extraAttr=(Habitat="Terrestrial")
type="Domain", name="Eukarya", superSet=("Life", "Earth"), info="cells with a nucleus"

type="Species", name="Lion", superSet=("Domain", "Eukarya"), age=10, weight=190, size=1.8, extraAttr=(Diet="Carnivore")
"#;

/// In-memory filesystem: files by path, directories implied by their files.
#[derive(Default)]
struct MemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    fn with_files(files: &[(&str, &str)]) -> Self {
        let fs = Self::default();
        for (path, content) in files {
            fs.write(Path::new(path), content).unwrap();
        }
        fs
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path) || self.is_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .lock()
            .unwrap()
            .keys()
            .any(|p| p.starts_with(path) && p != path)
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect())
    }
}

#[fixture]
fn store() -> HierarchyStore {
    testing::init_test_setup();
    HierarchyStore::new()
}

#[rstest]
fn given_record_file_when_importing_then_builds_hierarchy(mut store: HierarchyStore) {
    let fs = Arc::new(MemoryFileSystem::with_files(&[("/data/animals.tol", ANIMALS)]));
    let service = ImportService::new(fs, "tol");

    let created = service
        .import_path(Path::new("/data/animals.tol"), &mut store)
        .unwrap();

    assert_eq!(created, 3);
    let lion = store.get("Species", "Lion").unwrap();
    assert_eq!(lion.effective_attributes.get("Habitat"), Some(&AttrValue::from("Terrestrial")));
    assert_eq!(lion.effective_attributes.get("Age"), Some(&AttrValue::Number(10.0)));
    assert_eq!(
        store.get("Domain", "Eukarya").unwrap().description.as_deref(),
        Some("cells with a nucleus")
    );
}

#[rstest]
fn given_directory_when_importing_then_reads_matching_files_in_path_order(
    mut store: HierarchyStore,
) {
    let fs = Arc::new(MemoryFileSystem::with_files(&[
        ("/data/1-root.tol", r#"type="Life", name="Earth""#),
        (
            "/data/2-domains.tol",
            r#"type="Domain", name="Eukarya", superSet=("Life", "Earth")"#,
        ),
        ("/data/notes.txt", "not a record"),
    ]));
    let service = ImportService::new(fs, "tol");

    let created = service.import_path(Path::new("/data"), &mut store).unwrap();

    assert_eq!(created, 2);
    assert!(store.contains(&GroupKey::new("Domain", "Eukarya")));
}

#[rstest]
fn given_malformed_line_when_importing_then_reports_line_and_keeps_earlier_groups(
    mut store: HierarchyStore,
) {
    let content = "type=\"Life\", name=\"Earth\"\n\ntype=\"Domain\", name=\"Eukarya\"\n";
    let fs = Arc::new(MemoryFileSystem::with_files(&[("/data/bad.tol", content)]));
    let service = ImportService::new(fs, "tol");

    let err = service
        .import_path(Path::new("/data/bad.tol"), &mut store)
        .unwrap_err();

    match err {
        ApplicationError::InvalidRecord { path, line, .. } => {
            assert_eq!(path, PathBuf::from("/data/bad.tol"));
            assert_eq!(line, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.contains(&GroupKey::new("Life", "Earth")));
}

#[rstest]
fn given_duplicate_record_when_importing_then_domain_error_carries_line(
    mut store: HierarchyStore,
) {
    let content = "type=\"Life\", name=\"Earth\"\ntype=\"Life\", name=\"Earth\"\n";
    let service = ImportService::new(Arc::new(MemoryFileSystem::default()), "tol");

    let err = service
        .import_str(content, Path::new("dup.tol"), &mut store)
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Import {
            line: 2,
            source: DomainError::DuplicateEntity(_),
            ..
        }
    ));
    assert!(err.to_string().starts_with("dup.tol:2:"));
}

#[rstest]
fn given_missing_parent_record_when_importing_then_import_error(mut store: HierarchyStore) {
    let content = r#"type="Domain", name="Eukarya", superSet=("Life", "Earth")"#;
    let service = ImportService::new(Arc::new(MemoryFileSystem::default()), "tol");

    let err = service
        .import_str(content, Path::new("orphans.tol"), &mut store)
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Import {
            source: DomainError::MissingParent { .. },
            ..
        }
    ));
    assert!(store.is_empty());
}

#[rstest]
fn given_absent_path_when_importing_then_input_not_found(mut store: HierarchyStore) {
    let service = ImportService::new(Arc::new(MemoryFileSystem::default()), "tol");
    let err = service
        .import_path(Path::new("/nowhere.tol"), &mut store)
        .unwrap_err();
    assert!(matches!(err, ApplicationError::InputNotFound(_)));
}

#[rstest]
fn given_nested_directory_on_disk_when_importing_then_walks_recursively(
    mut store: HierarchyStore,
) {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("b-kingdoms");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(temp.path().join("a-root.tol"), ANIMALS).unwrap();
    std::fs::write(
        nested.join("animalia.tol"),
        r#"type="Kingdom", name="Animalia", superSet=("Domain", "Eukarya"), extraAttr=(Legs=4)"#,
    )
    .unwrap();
    std::fs::write(temp.path().join("README.md"), "ignored").unwrap();

    let service = ImportService::new(Arc::new(RealFileSystem), "tol");
    let created = service.import_path(temp.path(), &mut store).unwrap();

    assert_eq!(created, 4);
    let animalia = store.get("Kingdom", "Animalia").unwrap();
    assert_eq!(animalia.own_attributes.get("Legs"), Some(&AttrValue::Number(4.0)));
}
