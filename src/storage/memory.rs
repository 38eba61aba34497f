//! In-memory project store

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{ProjectStore, StoreError};
use crate::core::model::Project;

/// Store backed by a map; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, Project>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, BTreeMap<String, Project>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl ProjectStore for MemoryStore {
    fn put(&self, project: &Project) -> Result<(), StoreError> {
        self.records()?.insert(project.id.clone(), project.clone());
        Ok(())
    }

    fn get_all(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.records()?.values().cloned().collect())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.records()?.remove(id);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.records()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins_by_id() {
        let store = MemoryStore::new();
        let mut project = Project::new_blank();
        store.put(&project).unwrap();
        project.name = "Renamed".to_string();
        store.put(&project).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Renamed");
    }

    #[test]
    fn test_delete_and_clear() {
        let store = MemoryStore::new();
        let a = Project::new_blank();
        let b = Project::new_blank();
        store.put(&a).unwrap();
        store.put(&b).unwrap();

        store.delete(&a.id).unwrap();
        store.delete("missing").unwrap();
        assert_eq!(store.get_all().unwrap(), vec![b]);

        store.clear().unwrap();
        assert!(store.get_all().unwrap().is_empty());
    }
}
