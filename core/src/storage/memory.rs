use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::Result;
use crate::storage::traits::KeyValueStorage;

/// Process-local storage. Nothing survives the value being dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.slots.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("tasks").unwrap(), None);

        storage.set("tasks", "[]").unwrap();
        assert_eq!(storage.get("tasks").unwrap(), Some("[]".to_string()));

        storage.remove("tasks").unwrap();
        assert_eq!(storage.get("tasks").unwrap(), None);

        // Removing twice is fine
        storage.remove("tasks").unwrap();
    }
}
