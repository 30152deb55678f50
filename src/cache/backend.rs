//! Hash storage behind the song cache.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use super::error::CacheError;

/// Field/value pairs written into one hash.
pub type HashFields = [(&'static str, String)];

#[async_trait]
pub trait HashBackend: Send + Sync {
    /// Drop whatever `key` held and store exactly `fields`.
    async fn replace(&self, key: &str, fields: &HashFields) -> Result<(), CacheError>;

    /// Write `fields` into `key`, keeping every other field.
    async fn merge(&self, key: &str, fields: &HashFields) -> Result<(), CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    async fn field(&self, key: &str, field: &str) -> Result<Option<String>, CacheError>;

    /// All fields of `key`; empty when the key does not exist.
    async fn fields(&self, key: &str) -> Result<HashMap<String, String>, CacheError>;
}

/// Process-local backend used when no Redis URL is configured.
#[derive(Debug, Default)]
pub struct MemoryHashBackend {
    entries: DashMap<String, HashMap<String, String>>,
}

impl MemoryHashBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached hashes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn owned(fields: &HashFields) -> impl Iterator<Item = (String, String)> + '_ {
    fields
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
}

#[async_trait]
impl HashBackend for MemoryHashBackend {
    async fn replace(&self, key: &str, fields: &HashFields) -> Result<(), CacheError> {
        if fields.is_empty() {
            self.entries.remove(key);
        } else {
            self.entries.insert(key.to_string(), owned(fields).collect());
        }
        Ok(())
    }

    async fn merge(&self, key: &str, fields: &HashFields) -> Result<(), CacheError> {
        if fields.is_empty() {
            return Ok(());
        }
        self.entries
            .entry(key.to_string())
            .or_default()
            .extend(owned(fields));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn field(&self, key: &str, field: &str) -> Result<Option<String>, CacheError> {
        Ok(self
            .entries
            .get(key)
            .and_then(|entry| entry.get(field).cloned()))
    }

    async fn fields(&self, key: &str) -> Result<HashMap<String, String>, CacheError> {
        Ok(self
            .entries
            .get(key)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn merge_keeps_untouched_fields_and_replace_drops_them() {
        let backend = MemoryHashBackend::new();
        backend
            .replace("1", &[("a", "1".into()), ("b", "2".into())])
            .await
            .expect("replace");
        backend.merge("1", &[("b", "3".into())]).await.expect("merge");

        let fields = backend.fields("1").await.expect("fields");
        assert_eq!(fields.get("a").map(String::as_str), Some("1"));
        assert_eq!(fields.get("b").map(String::as_str), Some("3"));

        backend.replace("1", &[("c", "4".into())]).await.expect("replace");
        let fields = backend.fields("1").await.expect("fields");
        assert_eq!(fields.len(), 1);
        assert_eq!(backend.field("1", "a").await.expect("field"), None);
    }

    #[tokio::test]
    async fn remove_drops_the_whole_hash() {
        let backend = MemoryHashBackend::new();
        backend.merge("7", &[("a", "1".into())]).await.expect("merge");
        assert_eq!(backend.len(), 1);

        backend.remove("7").await.expect("remove");
        assert!(backend.is_empty());
        assert!(backend.fields("7").await.expect("fields").is_empty());
    }
}
