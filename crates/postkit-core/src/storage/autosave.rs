//! Auto-save and explicit save of layer collections.
//!
//! The autosave slot is best effort: write failures are logged and the
//! collection stays dirty so the next tick retries. Explicit saves write a
//! new uniquely keyed artifact and report failures to the caller.

use crate::canvas::CanvasDocument;
use crate::layers::Layer;
use crate::storage::{Storage, StorageError, StorageResult};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 5;

/// Rotating slot holding the most recent autosave.
pub const AUTOSAVE_KEY: &str = "premium_editor_autosave";

/// Prefix shared by every explicitly saved artifact.
pub const ARTIFACT_PREFIX: &str = "template_";

/// Key for an artifact saved at `timestamp_millis`.
pub fn artifact_key(template_id: Option<&str>, timestamp_millis: u64) -> String {
    format!(
        "{}{}_{}",
        ARTIFACT_PREFIX,
        template_id.unwrap_or("new"),
        timestamp_millis
    )
}

fn serialize_layers(layers: &[Layer]) -> StorageResult<String> {
    serde_json::to_string(layers).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Parse and validate a stored collection, renumbering z in stored order.
fn parse_layers(json: &str) -> StorageResult<Vec<Layer>> {
    let layers: Vec<Layer> =
        serde_json::from_str(json).map_err(|e| StorageError::Serialization(e.to_string()))?;
    CanvasDocument::from_layers(layers)
        .map(|doc| doc.snapshot())
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Manages automatic and explicit persistence of the layer collection.
pub struct AutoSaveManager<S: Storage + ?Sized> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
}

impl<S: Storage + ?Sized> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the interval clock without writing, e.g. when the editor opens.
    pub fn start(&mut self, now: Instant) {
        self.last_save = Some(now);
    }

    /// Mark the collection as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Dirty and the interval has elapsed since the last write.
    pub fn should_save(&self, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Write the autosave slot if due. Returns true if a write happened.
    /// Failures are logged and leave the collection dirty.
    pub fn maybe_save(&mut self, now: Instant, layers: &[Layer]) -> bool {
        if !self.should_save(now) {
            return false;
        }
        match self.save(now, layers) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Autosave failed: {}", e);
                false
            }
        }
    }

    /// Write the autosave slot immediately.
    pub fn save(&mut self, now: Instant, layers: &[Layer]) -> StorageResult<()> {
        let json = serialize_layers(layers)?;
        self.storage.put(AUTOSAVE_KEY, &json)?;
        self.last_save = Some(now);
        self.dirty = false;
        log::debug!("Autosaved {} layers", layers.len());
        Ok(())
    }

    /// Read back the autosave slot. Missing, unparsable and structurally
    /// invalid payloads are all treated as absent.
    pub fn restore(&self) -> Option<Vec<Layer>> {
        let json = match self.storage.get(AUTOSAVE_KEY) {
            Ok(json) => json,
            Err(StorageError::NotFound(_)) => {
                log::debug!("No autosave to restore");
                return None;
            }
            Err(e) => {
                log::warn!("Failed to read autosave: {}", e);
                return None;
            }
        };
        match parse_layers(&json) {
            Ok(layers) => Some(layers),
            Err(e) => {
                log::warn!("Ignoring corrupt autosave: {}", e);
                None
            }
        }
    }

    /// Save the collection as a new artifact and return its key. A numeric
    /// suffix keeps keys unique when two saves land on the same millisecond.
    pub fn save_artifact(
        &self,
        template_id: Option<&str>,
        layers: &[Layer],
        timestamp_millis: u64,
    ) -> StorageResult<String> {
        let json = serialize_layers(layers)?;
        let base = artifact_key(template_id, timestamp_millis);
        let mut key = base.clone();
        let mut suffix = 1u32;
        while self.storage.exists(&key)? {
            key = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.storage.put(&key, &json)?;
        log::info!("Saved artifact {}", key);
        Ok(key)
    }

    /// Load and validate a saved artifact.
    pub fn load_artifact(&self, key: &str) -> StorageResult<Vec<Layer>> {
        parse_layers(&self.storage.get(key)?)
    }

    /// All saved artifact keys, sorted. The autosave slot is not included.
    pub fn list_artifacts(&self) -> StorageResult<Vec<String>> {
        let mut keys = self.storage.list()?;
        keys.retain(|k| k != AUTOSAVE_KEY && k.starts_with(ARTIFACT_PREFIX));
        keys.sort();
        Ok(keys)
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::default_layers;
    use crate::storage::{FileStorage, MemoryStorage};
    use tempfile::tempdir;

    fn manager() -> AutoSaveManager<MemoryStorage> {
        AutoSaveManager::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_autosave_dirty_gating() {
        let mut manager = manager();
        let now = Instant::now();
        manager.start(now);
        assert!(!manager.should_save(now + Duration::from_secs(60)));

        manager.mark_dirty();
        assert!(!manager.should_save(now + Duration::from_secs(1)));
        assert!(manager.should_save(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_maybe_save_clears_dirty() {
        let mut manager = manager();
        let now = Instant::now();
        manager.mark_dirty();
        assert!(manager.maybe_save(now, &default_layers()));
        assert!(!manager.is_dirty());
        assert!(!manager.maybe_save(now + Duration::from_secs(10), &default_layers()));
    }

    #[test]
    fn test_restore_roundtrip() {
        let mut manager = manager();
        let layers = default_layers();
        manager.save(Instant::now(), &layers).unwrap();
        assert_eq!(manager.restore().unwrap(), layers);
    }

    #[test]
    fn test_restore_missing_or_corrupt() {
        let manager = manager();
        assert!(manager.restore().is_none());

        manager.storage().put(AUTOSAVE_KEY, "{not json").unwrap();
        assert!(manager.restore().is_none());

        manager.storage().put(AUTOSAVE_KEY, "[]").unwrap();
        assert!(manager.restore().is_none());
    }

    #[test]
    fn test_restore_rejects_missing_background() {
        let manager = manager();
        let layers: Vec<Layer> = default_layers().into_iter().skip(1).collect();
        let json = serde_json::to_string(&layers).unwrap();
        manager.storage().put(AUTOSAVE_KEY, &json).unwrap();
        assert!(manager.restore().is_none());
    }

    #[test]
    fn test_restore_renumbers_z() {
        let manager = manager();
        let mut layers = default_layers();
        layers[1].z = 7;
        layers[2].z = 3;
        let json = serde_json::to_string(&layers).unwrap();
        manager.storage().put(AUTOSAVE_KEY, &json).unwrap();

        let restored = manager.restore().unwrap();
        let zs: Vec<u32> = restored.iter().map(|l| l.z).collect();
        assert_eq!(zs, vec![0, 1, 2]);
    }

    #[test]
    fn test_artifact_keys_unique() {
        let manager = manager();
        let layers = default_layers();
        let a = manager.save_artifact(Some("42"), &layers, 1000).unwrap();
        let b = manager.save_artifact(Some("42"), &layers, 1000).unwrap();
        let c = manager.save_artifact(None, &layers, 1000).unwrap();
        assert_eq!(a, "template_42_1000");
        assert_eq!(b, "template_42_1000_1");
        assert_eq!(c, "template_new_1000");
        assert_eq!(manager.load_artifact(&a).unwrap(), layers);
    }

    #[test]
    fn test_list_excludes_autosave_slot() {
        let mut manager = manager();
        let layers = default_layers();
        manager.save(Instant::now(), &layers).unwrap();
        manager.save_artifact(None, &layers, 1).unwrap();

        let list = manager.list_artifacts().unwrap();
        assert_eq!(list, vec!["template_new_1".to_string()]);
    }

    #[test]
    fn test_autosave_to_files() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path().to_path_buf()).unwrap());
        let mut manager = AutoSaveManager::new(storage.clone());
        manager.mark_dirty();
        assert!(manager.maybe_save(Instant::now(), &default_layers()));

        let reopened = AutoSaveManager::new(storage);
        assert_eq!(reopened.restore().unwrap().len(), 3);
    }

    #[test]
    fn test_dyn_storage() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let manager = AutoSaveManager::new(storage);
        assert!(manager.list_artifacts().unwrap().is_empty());
    }
}
