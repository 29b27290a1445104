use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::traits::KeyValueStorage;

const DEFAULT_DIR_NAME: &str = ".taskboard";
const SLOT_EXTENSION: &str = "json";

/// Stores each slot as `<base_dir>/<key>.json`.
#[derive(Clone, Debug)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// Opens (and creates if needed) the data directory.
    /// Without an explicit directory, `~/.taskboard` is used.
    pub fn new(base_dir: Option<PathBuf>) -> Result<Self> {
        let base_dir = match base_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        fs::create_dir_all(&base_dir)?;
        debug!(dir = %base_dir.display(), "opened file storage");
        Ok(FileStorage { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.{}", key, SLOT_EXTENSION))
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or(Error::HomeDirUnavailable)?;
    Ok(home_dir.join(DEFAULT_DIR_NAME))
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // Write to a sibling temp file, then rename over the slot.
        let path = self.slot_path(key);
        let tmp = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage() -> (FileStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(Some(temp_dir.path().join("data"))).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_creates_base_dir() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.base_dir().is_dir());
    }

    #[test]
    fn test_missing_slot_is_none() {
        let (storage, _temp) = create_test_storage();
        assert_eq!(storage.get("users").unwrap(), None);
    }

    #[test]
    fn test_slot_maps_to_json_file() {
        let (storage, _temp) = create_test_storage();
        storage.set("users", "[\"alice\"]").unwrap();

        let on_disk = fs::read_to_string(storage.base_dir().join("users.json")).unwrap();
        assert_eq!(on_disk, "[\"alice\"]");
        assert!(!storage.base_dir().join("users.json.tmp").exists());
        assert_eq!(storage.get("users").unwrap(), Some("[\"alice\"]".to_string()));
    }

    #[test]
    fn test_overwrite_and_remove() {
        let (storage, _temp) = create_test_storage();
        storage.set("tasks", "[1]").unwrap();
        storage.set("tasks", "[2]").unwrap();
        assert_eq!(storage.get("tasks").unwrap(), Some("[2]".to_string()));

        storage.remove("tasks").unwrap();
        assert_eq!(storage.get("tasks").unwrap(), None);
        storage.remove("tasks").unwrap();
    }

    #[test]
    fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();

        {
            let storage = FileStorage::new(Some(dir.clone())).unwrap();
            storage.set("users", "[\"zoe\"]").unwrap();
        }

        let storage = FileStorage::new(Some(dir)).unwrap();
        assert_eq!(storage.get("users").unwrap(), Some("[\"zoe\"]".to_string()));
    }
}
