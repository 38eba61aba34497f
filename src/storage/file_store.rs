//! One JSON file per project

use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{ProjectStore, StoreError};
use crate::core::model::Project;

const RECORD_EXTENSION: &str = "json";

/// Project store rooted at a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Map an id to a file stem; anything outside `[A-Za-z0-9_-]` becomes `~XX`
fn file_stem(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            stem.push(byte as char);
        } else {
            let _ = write!(stem, "~{byte:02X}");
        }
    }
    stem
}

impl JsonFileStore {
    /// Open a store, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| io_error(&root, e))?;
        tracing::info!("Project store at {}", root.display());
        Ok(Self { root })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", file_stem(id), RECORD_EXTENSION))
    }

    /// Record files currently in the store directory
    fn record_files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == RECORD_EXTENSION)
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    fn read_record(path: &Path) -> Option<Project> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Skipping unreadable record {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(project) => Some(project),
            Err(e) => {
                tracing::warn!("Skipping malformed record {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl ProjectStore for JsonFileStore {
    fn put(&self, project: &Project) -> Result<(), StoreError> {
        let content = serde_json::to_string(project).map_err(|source| StoreError::Encode {
            id: project.id.clone(),
            source,
        })?;

        // Write beside the record then rename over it so readers never see
        // a half-written file.
        let path = self.record_path(&project.id);
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, content).map_err(|e| io_error(&temp, e))?;
        fs::rename(&temp, &path).map_err(|e| io_error(&path, e))?;

        tracing::debug!("Stored project {} at {}", project.id, path.display());
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Project>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut projects: Vec<Project> = self
            .record_files()
            .iter()
            .filter_map(|path| Self::read_record(path))
            .collect();
        projects.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(projects)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        for path in self.record_files() {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(&path, e)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{FieldKind, Step, StepField};

    fn project(id: &str, name: &str) -> Project {
        Project {
            id: id.to_string(),
            name: name.to_string(),
            steps: vec![Step {
                id: format!("{id}-s"),
                fields: vec![StepField::with_id("f1", FieldKind::image("data:image/png;base64,AA"))],
            }],
        }
    }

    #[test]
    fn test_file_stem_is_safe() {
        assert_eq!(file_stem("1700000000000"), "1700000000000");
        assert_eq!(file_stem("../etc/passwd"), "~2E~2E~2Fetc~2Fpasswd");
        assert_eq!(file_stem("a b"), "a~20b");
    }

    #[test]
    fn test_put_get_all_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("projects");
        let store = JsonFileStore::open(&root).unwrap();

        store.put(&project("2", "Second")).unwrap();
        store.put(&project("1", "First")).unwrap();
        store.put(&project("2", "Second again")).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], project("1", "First"));
        assert_eq!(all[1].name, "Second again");
        assert!(!root.join("2.json.tmp").exists());
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.put(&project("1", "Good")).unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Good");
    }

    #[test]
    fn test_delete_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.put(&project("1", "One")).unwrap();
        store.put(&project("2", "Two")).unwrap();

        store.delete("1").unwrap();
        store.delete("1").unwrap();
        assert_eq!(store.get_all().unwrap().len(), 1);

        fs::write(dir.path().join("keep.txt"), "x").unwrap();
        store.clear().unwrap();
        assert!(store.get_all().unwrap().is_empty());
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn test_reopen_sees_records() {
        let dir = tempfile::tempdir().unwrap();
        JsonFileStore::open(dir.path())
            .unwrap()
            .put(&project("42", "Persisted"))
            .unwrap();

        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get_all().unwrap()[0].name, "Persisted");
    }
}
