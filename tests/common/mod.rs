#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use foldertree::config::HierarchyConfig;
use foldertree::store::{SqliteStore, Store};
use foldertree::types::{Folder, PathEdge};
use tempfile::TempDir;

pub struct TestContext {
    pub store: SqliteStore,
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(HierarchyConfig::default())
    }

    pub fn with_config(config: HierarchyConfig) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store =
            SqliteStore::with_config(temp_dir.path().join("test.db"), config).expect("open store");
        store.initialize().expect("initialize store");
        Self { store, temp_dir }
    }

    /// Builds the reference hierarchy:
    ///
    /// ```text
    /// Acme Adventures (1)
    /// ├── Outdoors (2)
    /// │   └── Rock Climbing (4)
    /// │       └── Helmets (6)
    /// └── Equipment (3)
    ///     └── Safety (5)
    /// ```
    pub fn seed(&self) -> Seed {
        let store = &self.store;
        let root = store.create_folder("Acme Adventures", None).unwrap();
        let outdoors = store.create_folder("Outdoors", Some(root.id)).unwrap();
        let equipment = store.create_folder("Equipment", Some(root.id)).unwrap();
        let rock_climbing = store
            .create_folder("Rock Climbing", Some(outdoors.id))
            .unwrap();
        let safety = store.create_folder("Safety", Some(equipment.id)).unwrap();
        let helmets = store
            .create_folder("Helmets", Some(rock_climbing.id))
            .unwrap();

        Seed {
            root,
            outdoors,
            equipment,
            rock_climbing,
            safety,
            helmets,
        }
    }

    pub fn paths(&self) -> Vec<(i64, i64, i64)> {
        self.store
            .list_paths()
            .unwrap()
            .into_iter()
            .map(|e| (e.ancestor_id, e.descendant_id, e.depth))
            .collect()
    }

    pub fn folder_count(&self) -> i64 {
        self.store
            .connection()
            .query_row("SELECT COUNT(*) FROM folders", [], |row| row.get(0))
            .unwrap()
    }
}

pub struct Seed {
    pub root: Folder,
    pub outdoors: Folder,
    pub equipment: Folder,
    pub rock_climbing: Folder,
    pub safety: Folder,
    pub helmets: Folder,
}

pub fn names(folders: &[Folder]) -> Vec<&str> {
    folders.iter().map(|f| f.name.as_str()).collect()
}

/// Recomputes the closure of the stored parent pointers and checks the
/// `paths` table holds exactly that set, with no duplicate pairs.
pub fn assert_closure_consistent(store: &SqliteStore) {
    let parents: HashMap<i64, Option<i64>> = {
        let conn = store.connection();
        let mut stmt = conn.prepare("SELECT id, parent_id FROM folders").unwrap();
        stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?))
        })
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
    };

    let mut expected = HashSet::new();
    for &id in parents.keys() {
        let mut current = Some(id);
        let mut depth = 0;
        while let Some(ancestor) = current {
            expected.insert(PathEdge::new(ancestor, id, depth));
            current = parents.get(&ancestor).copied().flatten();
            depth += 1;
        }
    }

    let actual = store.list_paths().unwrap();
    let actual_set: HashSet<PathEdge> = actual.iter().copied().collect();
    assert_eq!(actual.len(), actual_set.len(), "duplicate closure rows");
    assert_eq!(actual_set, expected);

    for &id in parents.keys() {
        let self_rows = actual
            .iter()
            .filter(|e| e.descendant_id == id && e.is_self())
            .count();
        assert_eq!(self_rows, 1, "folder {id} must have one self row");
    }
}
