//! File-backed locator store.
//!
//! `LocatorStore` keeps every cached [`AccessibleEntity`] in memory, grouped
//! into buckets by group key (`file_name`). Inside a bucket the `unique_id`
//! is unique, compared case-insensitively. Each bucket persists to its own
//! `<urlencoded-group-key>.locator` file under the storage root, named from
//! the normalized (trimmed, lowercased) key.
//!
//! Locking: buckets live in a sharded `DashMap`, so the shard guard is the
//! bucket lock. Operations on the same bucket are serialized and operations
//! on different shards run in parallel. The map itself sits behind an
//! `RwLock`: every operation holds the read side for its whole duration and
//! `load`/`clear` take the write side to swap the map, so no write can land
//! in a map that has already been replaced.

use crate::types::{group_key, ids_match, is_blank, AccessibleEntity, LocatorError, Result};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

/// Default extension for locator files.
pub const LOCATOR_EXTENSION: &str = "locator";

/// Entities stored under one group key.
#[derive(Debug, Default)]
struct Bucket {
    /// Spelling of the group key as first seen
    file_name: String,
    entities: Vec<AccessibleEntity>,
}

impl Bucket {
    fn new(file_name: &str) -> Self {
        Self {
            file_name: file_name.trim().to_string(),
            entities: Vec::new(),
        }
    }

    fn position(&self, unique_id: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.has_id(unique_id))
    }
}

type Index = DashMap<String, Bucket>;

/// Concurrent, file-backed index of located elements.
pub struct LocatorStore {
    root: Option<PathBuf>,
    extension: String,
    index: RwLock<Index>,
}

impl LocatorStore {
    /// Create a store persisting under `root`.
    ///
    /// Nothing is read from disk until [`load`](Self::load) is called.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            extension: LOCATOR_EXTENSION.to_string(),
            index: RwLock::new(DashMap::new()),
        }
    }

    /// Create an in-memory store with no storage root.
    ///
    /// `save` fails with `InvalidArgument`; `load` finds nothing.
    pub fn in_memory() -> Self {
        Self {
            root: None,
            extension: LOCATOR_EXTENSION.to_string(),
            index: RwLock::new(DashMap::new()),
        }
    }

    /// Use a different file extension (without the leading dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Path of the file a group key persists to.
    ///
    /// Spellings that differ only in case map to the same file.
    pub fn locator_path(&self, file_name: &str) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        let key = group_key(file_name);
        Some(root.join(format!("{}.{}", urlencoding::encode(&key), self.extension)))
    }

    fn index(&self) -> RwLockReadGuard<'_, Index> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace_index(&self, index: Index) {
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = index;
    }

    /// Group key selected by an optional file name; `None` or blank selects all.
    fn scope(file_name: Option<&str>) -> Option<String> {
        file_name.filter(|name| !is_blank(name)).map(group_key)
    }

    fn validate(entity: &AccessibleEntity) -> Result<()> {
        if is_blank(&entity.file_name) {
            return Err(LocatorError::InvalidArgument(
                "entity file_name is empty".to_string(),
            ));
        }
        if is_blank(&entity.unique_id) {
            return Err(LocatorError::InvalidArgument(
                "entity unique_id is empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_id(unique_id: &str) -> Result<()> {
        if is_blank(unique_id) {
            return Err(LocatorError::InvalidArgument("unique_id is empty".to_string()));
        }
        Ok(())
    }

    /// Add an entity unless its id is already present in its bucket.
    ///
    /// Returns `false` when an entity with the same `unique_id` already exists
    /// in the bucket; the stored entity is left untouched.
    pub fn add(&self, entity: AccessibleEntity) -> Result<bool> {
        Self::validate(&entity)?;
        let index = self.index();
        let mut bucket = index.entry(group_key(&entity.file_name)).or_insert_with(|| {
            log::debug!("[STORE] Creating bucket {}", entity.file_name.trim());
            Bucket::new(&entity.file_name)
        });
        if bucket.position(&entity.unique_id).is_some() {
            log::debug!(
                "[STORE] {} already present in {}, skipping",
                entity.unique_id,
                bucket.file_name
            );
            return Ok(false);
        }
        bucket.entities.push(entity);
        Ok(true)
    }

    /// Insert or replace an entity by `unique_id` within its bucket.
    pub fn set(&self, entity: AccessibleEntity) -> Result<bool> {
        Self::validate(&entity)?;
        let index = self.index();
        let mut bucket = index.entry(group_key(&entity.file_name)).or_insert_with(|| {
            log::debug!("[STORE] Creating bucket {}", entity.file_name.trim());
            Bucket::new(&entity.file_name)
        });
        if let Some(pos) = bucket.position(&entity.unique_id) {
            bucket.entities.remove(pos);
        }
        bucket.entities.push(entity);
        Ok(true)
    }

    /// Remove an entity by id.
    ///
    /// With `file_name`, only that bucket is searched. Without it every bucket
    /// is searched and the first match wins; the order buckets are visited in
    /// is unspecified. Buckets are never deleted, even when emptied.
    pub fn remove(
        &self,
        unique_id: &str,
        file_name: Option<&str>,
    ) -> Result<Option<AccessibleEntity>> {
        Self::validate_id(unique_id)?;
        let index = self.index();
        let take = |bucket: &mut Bucket| -> Option<AccessibleEntity> {
            let pos = bucket.position(unique_id)?;
            log::debug!("[STORE] Removed {} from {}", unique_id, bucket.file_name);
            Some(bucket.entities.remove(pos))
        };
        let removed = match Self::scope(file_name) {
            Some(key) => index.get_mut(&key).and_then(|mut bucket| take(&mut *bucket)),
            None => index.iter_mut().find_map(|mut bucket| take(&mut *bucket)),
        };
        Ok(removed)
    }

    /// Check whether an id is present, scoped the same way as `remove`.
    pub fn contains(&self, unique_id: &str, file_name: Option<&str>) -> Result<bool> {
        Self::validate_id(unique_id)?;
        let index = self.index();
        let found = match Self::scope(file_name) {
            Some(key) => index
                .get(&key)
                .is_some_and(|bucket| bucket.position(unique_id).is_some()),
            None => index.iter().any(|bucket| bucket.position(unique_id).is_some()),
        };
        Ok(found)
    }

    /// Clone of the entity with `unique_id` in bucket `file_name`.
    pub fn get(&self, unique_id: &str, file_name: &str) -> Option<AccessibleEntity> {
        let index = self.index();
        let bucket = index.get(&group_key(file_name))?;
        bucket.entities.iter().find(|e| e.has_id(unique_id)).cloned()
    }

    /// Number of entities in one bucket, or in all buckets.
    pub fn count(&self, file_name: Option<&str>) -> usize {
        let index = self.index();
        match Self::scope(file_name) {
            Some(key) => index.get(&key).map_or(0, |bucket| bucket.entities.len()),
            None => index.iter().map(|bucket| bucket.entities.len()).sum(),
        }
    }

    /// Group keys of all buckets, in their first-seen spelling, sorted.
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .index()
            .iter()
            .map(|bucket| bucket.file_name.clone())
            .collect();
        names.sort();
        names
    }

    /// Clone of one bucket's entities in insertion order.
    pub fn entities(&self, file_name: &str) -> Vec<AccessibleEntity> {
        let index = self.index();
        let entities = index
            .get(&group_key(file_name))
            .map(|bucket| bucket.entities.clone())
            .unwrap_or_default();
        entities
    }

    /// Drop every bucket from memory. Files on disk are not touched.
    ///
    /// Waits for in-flight operations to finish.
    pub fn clear(&self) {
        self.replace_index(DashMap::new());
    }

    fn locator_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            let matches = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(self.extension.as_str()));
            if matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_locator_file(path: &Path) -> Result<Vec<AccessibleEntity>> {
        let content = fs::read_to_string(path)?;
        let content = content.trim_start_matches('\u{feff}');
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let entities: Option<Vec<AccessibleEntity>> = serde_json::from_str(content)?;
        Ok(entities.unwrap_or_default())
    }

    /// Rebuild the index from the locator files under the storage root.
    ///
    /// The new index is built aside and swapped in as a whole. A missing root
    /// directory is an empty dataset: the index is left as is and `true` is
    /// returned. If one group key is supplied by more than one file the
    /// dataset is treated as duplicated: nothing is swapped and `false` is
    /// returned. I/O and parse failures are returned as errors, also without
    /// touching the index.
    pub fn load(&self) -> Result<bool> {
        let root = match self.root.as_deref() {
            Some(root) if root.is_dir() => root,
            _ => {
                log::debug!("[STORE] No locator directory, nothing to load");
                return Ok(true);
            }
        };

        let mut rebuilt: HashMap<String, Bucket> = HashMap::new();
        let mut owners: HashMap<String, PathBuf> = HashMap::new();
        let mut dropped = 0usize;

        for path in self.locator_files(root)? {
            let entities = Self::read_locator_file(&path)?;
            let mut seen_in_file = HashSet::new();
            for entity in entities {
                if !entity.is_valid() {
                    dropped += 1;
                    continue;
                }
                let key = group_key(&entity.file_name);
                if seen_in_file.insert(key.clone()) {
                    if let Some(owner) = owners.get(&key) {
                        log::warn!(
                            "[STORE] Group {} found in both {} and {}, keeping current index",
                            entity.file_name,
                            owner.display(),
                            path.display()
                        );
                        return Ok(false);
                    }
                    owners.insert(key.clone(), path.clone());
                }
                let bucket = rebuilt
                    .entry(key)
                    .or_insert_with(|| Bucket::new(&entity.file_name));
                if bucket.entities.iter().any(|e| ids_match(&e.unique_id, &entity.unique_id)) {
                    log::warn!(
                        "[STORE] Duplicate id {} in {}, keeping the first",
                        entity.unique_id,
                        bucket.file_name
                    );
                    continue;
                }
                bucket.entities.push(entity);
            }
        }

        if dropped > 0 {
            log::debug!("[STORE] Dropped {} entities without file name or id", dropped);
        }

        let total: usize = rebuilt.values().map(|b| b.entities.len()).sum();
        let buckets = rebuilt.len();
        self.replace_index(rebuilt.into_iter().collect());

        log::info!(
            "[STORE] Loaded {} entities in {} groups from {}",
            total,
            buckets,
            root.display()
        );
        Ok(true)
    }

    fn require_root(&self) -> Result<&Path> {
        match self.root.as_deref() {
            Some(root) if !root.as_os_str().is_empty() => Ok(root),
            _ => Err(LocatorError::InvalidArgument(
                "storage root is not set".to_string(),
            )),
        }
    }

    /// Write every bucket to its locator file.
    ///
    /// Each file is written to a temporary sibling and renamed into place, so
    /// a single file is never left half written. The operation as a whole is
    /// not atomic: a failure part way leaves earlier files updated.
    pub fn save(&self) -> Result<()> {
        let root = self.require_root()?;
        fs::create_dir_all(root)?;

        let contents = self
            .index()
            .iter()
            .map(|bucket| {
                serde_json::to_string_pretty(&bucket.entities)
                    .map(|content| (bucket.key().clone(), content))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut written = 0usize;
        for (key, content) in contents {
            let Some(path) = self.locator_path(&key) else {
                continue;
            };
            let temp_path = path.with_extension(format!("{}.tmp", self.extension));
            fs::write(&temp_path, content)?;
            fs::rename(&temp_path, &path)?;
            written += 1;
        }

        log::info!("[STORE] Saved {} locator files to {}", written, root.display());
        Ok(())
    }

    /// Delete locator files whose group is no longer in memory.
    ///
    /// Returns the number of files deleted.
    pub fn prune_stale_files(&self) -> Result<usize> {
        let root = self.require_root()?;
        if !root.is_dir() {
            return Ok(0);
        }

        let live: HashSet<String> = self
            .index()
            .iter()
            .map(|bucket| bucket.key().clone())
            .collect();

        let mut pruned = 0usize;
        for path in self.locator_files(root)? {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let file_name = urlencoding::decode(stem)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| stem.to_string());
            if !live.contains(&group_key(&file_name)) {
                fs::remove_file(&path)?;
                log::debug!("[STORE] Pruned {}", path.display());
                pruned += 1;
            }
        }
        Ok(pruned)
    }
}

impl Default for LocatorStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ControlType, Rect};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn entity(file: &str, id: &str) -> AccessibleEntity {
        AccessibleEntity::new(file, id)
    }

    #[test]
    fn test_add_creates_bucket() {
        let store = LocatorStore::in_memory();
        assert!(store.add(entity("notepad", "save")).unwrap());
        assert_eq!(store.count(Some("notepad")), 1);
        assert_eq!(store.file_names(), vec!["notepad".to_string()]);
    }

    #[test]
    fn test_add_duplicate_id_keeps_first() {
        let store = LocatorStore::in_memory();
        let first = entity("notepad", "Save").with_name("first");
        let second = entity("notepad", "save").with_name("second");

        assert!(store.add(first).unwrap());
        assert!(!store.add(second).unwrap());

        let entities = store.entities("notepad");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "first");
    }

    #[test]
    fn test_same_id_in_different_buckets() {
        let store = LocatorStore::in_memory();
        assert!(store.add(entity("a", "ok")).unwrap());
        assert!(store.add(entity("b", "ok")).unwrap());
        assert_eq!(store.count(None), 2);
    }

    #[test]
    fn test_group_key_is_case_insensitive() {
        let store = LocatorStore::in_memory();
        store.add(entity("Notepad", "one")).unwrap();
        store.add(entity("NOTEPAD", "two")).unwrap();
        assert_eq!(store.count(Some("notepad")), 2);
        assert_eq!(store.file_names(), vec!["Notepad".to_string()]);
    }

    #[test]
    fn test_add_rejects_blank_identity() {
        let store = LocatorStore::in_memory();
        assert!(matches!(
            store.add(entity("", "id")),
            Err(LocatorError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.add(entity("file", "  ")),
            Err(LocatorError::InvalidArgument(_))
        ));
        assert_eq!(store.count(None), 0);
    }

    #[test]
    fn test_set_replaces_by_id() {
        let store = LocatorStore::in_memory();
        store.set(entity("chat", "send").with_name("v1")).unwrap();
        store.set(entity("chat", "SEND").with_name("v2")).unwrap();
        assert!(store.set(entity("chat", "send").with_name("v3")).unwrap());

        let entities = store.entities("chat");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "v3");
    }

    #[test]
    fn test_remove_scoped_to_bucket() {
        let store = LocatorStore::in_memory();
        store.add(entity("a", "x")).unwrap();
        store.add(entity("b", "x")).unwrap();

        let removed = store.remove("X", Some("b")).unwrap();
        assert_eq!(removed.map(|e| e.file_name), Some("b".to_string()));
        assert!(!store.contains("x", Some("b")).unwrap());
        assert!(store.contains("x", Some("a")).unwrap());
        assert_eq!(store.file_names().len(), 2);
    }

    #[test]
    fn test_remove_without_bucket_searches_all() {
        let store = LocatorStore::in_memory();
        store.add(entity("a", "one")).unwrap();
        store.add(entity("b", "two")).unwrap();

        let removed = store.remove("two", None).unwrap().unwrap();
        assert_eq!(removed.file_name, "b");
        assert_eq!(store.count(None), 1);
        assert!(!store.contains("two", None).unwrap());
    }

    #[test]
    fn test_remove_missing_returns_none() {
        let store = LocatorStore::in_memory();
        store.add(entity("a", "one")).unwrap();
        assert_eq!(store.remove("nope", Some("a")).unwrap(), None);
        assert_eq!(store.remove("one", Some("missing")).unwrap(), None);
        assert_eq!(store.count(None), 1);
    }

    #[test]
    fn test_blank_id_is_invalid() {
        let store = LocatorStore::in_memory();
        assert!(matches!(
            store.remove("", None),
            Err(LocatorError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.contains(" ", Some("a")),
            Err(LocatorError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_count_unknown_bucket_is_zero() {
        let store = LocatorStore::in_memory();
        store.add(entity("a", "one")).unwrap();
        assert_eq!(store.count(Some("b")), 0);
        assert_eq!(store.count(Some("  ")), 1);
    }

    #[test]
    fn test_get_returns_clone() {
        let store = LocatorStore::in_memory();
        store.add(entity("a", "one").with_name("Ok")).unwrap();
        assert_eq!(store.get("ONE", "A").map(|e| e.name), Some("Ok".to_string()));
        assert_eq!(store.get("two", "a"), None);
    }

    #[test]
    fn test_save_requires_root() {
        let store = LocatorStore::in_memory();
        store.add(entity("a", "one")).unwrap();
        assert!(matches!(store.save(), Err(LocatorError::InvalidArgument(_))));

        let store = LocatorStore::new("");
        assert!(matches!(store.save(), Err(LocatorError::InvalidArgument(_))));
    }

    #[test]
    fn test_save_writes_one_file_per_bucket() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("locators");
        let store = LocatorStore::new(&root);
        store.add(entity("notepad", "one")).unwrap();
        store.add(entity("notepad", "two")).unwrap();
        store.add(entity("Chat / Main", "send")).unwrap();
        store.save().unwrap();

        assert!(root.join("notepad.locator").is_file());
        assert!(root.join("chat%20%2F%20main.locator").is_file());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 2);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = LocatorStore::new(dir.path());
        let button = entity("notepad", "save")
            .with_name("Save")
            .with_control_type(ControlType::Button)
            .with_bounding_rectangle(Rect::new(10, 20, 30, 40));
        store.add(button.clone()).unwrap();
        store.add(entity("chat", "send")).unwrap();
        store.save().unwrap();

        store.clear();
        assert_eq!(store.count(None), 0);

        assert!(store.load().unwrap());
        assert_eq!(store.count(None), 2);
        assert_eq!(store.get("save", "notepad"), Some(button));
        assert!(store.contains("send", Some("chat")).unwrap());
    }

    #[test]
    fn test_load_missing_directory_keeps_index() {
        let dir = TempDir::new().unwrap();
        let store = LocatorStore::new(dir.path().join("absent"));
        store.add(entity("a", "one")).unwrap();
        assert!(store.load().unwrap());
        assert_eq!(store.count(None), 1);
    }

    #[test]
    fn test_load_drops_invalid_entities() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("chat.locator"),
            r#"[{"FileName":"chat","UniqueId":"ok"},{"FileName":"","UniqueId":"x"},{"FileName":"chat","UniqueId":" "}]"#,
        )
        .unwrap();
        let store = LocatorStore::new(dir.path());
        assert!(store.load().unwrap());
        assert_eq!(store.count(None), 1);
        assert!(store.contains("ok", Some("chat")).unwrap());
    }

    #[test]
    fn test_load_tolerates_bom_and_null() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("chat.locator"),
            "\u{feff}[{\"FileName\":\"chat\",\"UniqueId\":\"ok\"}]",
        )
        .unwrap();
        fs::write(dir.path().join("empty.locator"), "null").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a locator").unwrap();

        let store = LocatorStore::new(dir.path());
        assert!(store.load().unwrap());
        assert_eq!(store.count(None), 1);
    }

    #[test]
    fn test_load_regroups_by_file_name() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("mixed.locator"),
            r#"[{"FileName":"a","UniqueId":"1"},{"FileName":"b","UniqueId":"1"},{"FileName":"A","UniqueId":"2"}]"#,
        )
        .unwrap();
        let store = LocatorStore::new(dir.path());
        assert!(store.load().unwrap());
        assert_eq!(store.count(Some("a")), 2);
        assert_eq!(store.count(Some("b")), 1);
    }

    #[test]
    fn test_load_keeps_first_duplicate_id() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.locator"),
            r#"[{"FileName":"a","UniqueId":"x","Name":"first"},{"FileName":"a","UniqueId":"X","Name":"second"}]"#,
        )
        .unwrap();
        let store = LocatorStore::new(dir.path());
        assert!(store.load().unwrap());
        assert_eq!(store.get("x", "a").map(|e| e.name), Some("first".to_string()));
    }

    #[test]
    fn test_load_collision_keeps_current_index() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("one.locator"),
            r#"[{"FileName":"chat","UniqueId":"a"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("two.locator"),
            r#"[{"FileName":"Chat","UniqueId":"b"}]"#,
        )
        .unwrap();

        let store = LocatorStore::new(dir.path());
        store.add(entity("existing", "keep")).unwrap();
        assert!(!store.load().unwrap());
        assert_eq!(store.file_names(), vec!["existing".to_string()]);
    }

    #[test]
    fn test_respelled_group_saves_to_same_file() {
        let dir = TempDir::new().unwrap();
        let store = LocatorStore::new(dir.path());
        store.add(entity("Chat", "a")).unwrap();
        store.save().unwrap();

        store.clear();
        store.add(entity("chat", "b")).unwrap();
        store.save().unwrap();
        assert_eq!(store.prune_stale_files().unwrap(), 0);

        let files: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["chat.locator".to_string()]);

        let reloaded = LocatorStore::new(dir.path());
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.count(None), 1);
        assert!(reloaded.contains("b", Some("CHAT")).unwrap());
        assert_eq!(reloaded.file_names(), vec!["chat".to_string()]);
    }

    #[test]
    fn test_locator_path_ignores_case() {
        let store = LocatorStore::new("/data");
        assert_eq!(store.locator_path(" WeChat "), store.locator_path("wechat"));
        assert_eq!(LocatorStore::in_memory().locator_path("a"), None);
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.locator"), "{not json").unwrap();
        let store = LocatorStore::new(dir.path());
        store.add(entity("existing", "keep")).unwrap();
        assert!(matches!(store.load(), Err(LocatorError::Serialization(_))));
        assert_eq!(store.count(None), 1);
    }

    #[test]
    fn test_prune_removes_files_without_bucket() {
        let dir = TempDir::new().unwrap();
        let store = LocatorStore::new(dir.path());
        store.add(entity("keep me", "1")).unwrap();
        store.add(entity("drop", "1")).unwrap();
        store.save().unwrap();

        store.clear();
        store.add(entity("Keep Me", "2")).unwrap();
        assert_eq!(store.prune_stale_files().unwrap(), 1);
        assert!(dir.path().join("keep%20me.locator").is_file());
        assert!(!dir.path().join("drop.locator").exists());
    }

    #[test]
    fn test_custom_extension() {
        let dir = TempDir::new().unwrap();
        let store = LocatorStore::new(dir.path()).with_extension("json");
        store.add(entity("a", "1")).unwrap();
        store.save().unwrap();
        assert!(dir.path().join("a.json").is_file());

        let reloaded = LocatorStore::new(dir.path()).with_extension("json");
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.count(None), 1);
    }

    #[test]
    fn test_concurrent_writers() {
        let store = LocatorStore::in_memory();
        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..50 {
                        store
                            .add(entity(&format!("bucket-{}", worker % 4), &format!("id-{}", i)))
                            .unwrap();
                        store.set(entity("shared", &format!("id-{}", i))).unwrap();
                    }
                });
            }
        });
        // Two workers per bucket add the same ids: only one copy survives.
        assert_eq!(store.count(Some("bucket-0")), 50);
        assert_eq!(store.count(Some("shared")), 50);
        assert_eq!(store.count(None), 4 * 50 + 50);
    }

    #[test]
    fn test_set_during_load_is_never_lost() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let dir = TempDir::new().unwrap();
        let seed = LocatorStore::new(dir.path());
        seed.add(entity("seed", "one")).unwrap();
        seed.save().unwrap();

        let store = LocatorStore::new(dir.path());
        // Odd while a load is running; bumped before and after each load.
        let generation = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..50 {
                    generation.fetch_add(1, Ordering::SeqCst);
                    assert!(store.load().unwrap());
                    generation.fetch_add(1, Ordering::SeqCst);
                }
            });
            for worker in 0..2 {
                let (store, generation) = (&store, &generation);
                scope.spawn(move || {
                    for i in 0..200 {
                        let id = format!("w{}-{}", worker, i);
                        let before = generation.load(Ordering::SeqCst);
                        assert!(store.set(entity("live", &id)).unwrap());
                        let present = store.contains(&id, Some("live")).unwrap();
                        let after = generation.load(Ordering::SeqCst);
                        if before == after && before % 2 == 0 {
                            assert!(present, "{} vanished without a load", id);
                        }
                    }
                });
            }
        });

        assert!(store.contains("one", Some("seed")).unwrap());
        store.set(entity("live", "last")).unwrap();
        assert!(store.contains("last", Some("live")).unwrap());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(u8, u8),
        Set(u8, u8),
        Remove(u8, Option<u8>),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..4, 0u8..8).prop_map(|(f, i)| Op::Add(f, i)),
            (0u8..4, 0u8..8).prop_map(|(f, i)| Op::Set(f, i)),
            (0u8..8, proptest::option::of(0u8..4)).prop_map(|(i, f)| Op::Remove(i, f)),
        ]
    }

    proptest! {
        #[test]
        fn prop_total_count_matches_bucket_sum(ops in proptest::collection::vec(op_strategy(), 0..64)) {
            let store = LocatorStore::in_memory();
            for op in ops {
                match op {
                    Op::Add(f, i) => { store.add(entity(&format!("f{}", f), &format!("id{}", i))).unwrap(); }
                    Op::Set(f, i) => { store.set(entity(&format!("F{}", f), &format!("ID{}", i))).unwrap(); }
                    Op::Remove(i, f) => {
                        let file = f.map(|f| format!("f{}", f));
                        store.remove(&format!("id{}", i), file.as_deref()).unwrap();
                    }
                }
            }
            let sum: usize = store.file_names().iter().map(|f| store.count(Some(f))).sum();
            prop_assert_eq!(store.count(None), sum);

            for file in store.file_names() {
                let entities = store.entities(&file);
                for (idx, e) in entities.iter().enumerate() {
                    prop_assert!(entities[idx + 1..].iter().all(|other| !other.has_id(&e.unique_id)));
                }
            }
        }

        #[test]
        fn prop_remove_then_contains_is_false(file in "[a-z]{1,8}", id in "[a-zA-Z0-9]{1,12}") {
            let store = LocatorStore::in_memory();
            store.add(entity(&file, &id)).unwrap();
            let removed = store.remove(&id.to_uppercase(), Some(&file)).unwrap();
            prop_assert!(removed.is_some());
            prop_assert!(!store.contains(&id, Some(&file)).unwrap());
        }
    }
}
