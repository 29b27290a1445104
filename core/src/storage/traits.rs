use crate::error::Result;

/// Named string slots, the persistence surface the task store writes through.
pub trait KeyValueStorage {
    /// Returns `None` when the slot has never been written or was removed.
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removing an absent slot is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
