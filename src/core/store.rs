//! Verifier persistence: one record per domain
//!
//! The doorman only needs load/save/remove by domain. `FileStore` keeps one
//! pretty-printed JSON file per domain in a directory.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::core::crypto::sha256;
use crate::error::Result;
use crate::types::Verifier;

/// Key-value contract for verifier records
pub trait VerifierStore: Send {
    fn load(&self, domain: &str) -> Result<Option<Verifier>>;
    fn save(&mut self, verifier: &Verifier) -> Result<()>;
    /// Returns whether a record existed
    fn remove(&mut self, domain: &str) -> Result<bool>;
}

/// In-process store (tests, ephemeral sessions)
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<String, Verifier>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VerifierStore for MemoryStore {
    fn load(&self, domain: &str) -> Result<Option<Verifier>> {
        Ok(self.records.get(domain).cloned())
    }

    fn save(&mut self, verifier: &Verifier) -> Result<()> {
        self.records.insert(verifier.domain.clone(), verifier.clone());
        Ok(())
    }

    fn remove(&mut self, domain: &str) -> Result<bool> {
        Ok(self.records.remove(domain).is_some())
    }
}

/// Directory of JSON records
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Record path for a domain (domain names are hashed, never used raw)
    pub fn path_for(&self, domain: &str) -> PathBuf {
        let digest = hex::encode(sha256(domain.as_bytes()));
        self.dir.join(format!("verifier_{}.json", &digest[..16]))
    }
}

impl VerifierStore for FileStore {
    fn load(&self, domain: &str) -> Result<Option<Verifier>> {
        let path = self.path_for(domain);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&path)?;
        let verifier: Verifier = serde_json::from_str(&json)?;
        // A file whose record names another domain is not ours
        if verifier.domain != domain {
            debug!(path = %path.display(), "verifier record domain mismatch, ignoring");
            return Ok(None);
        }
        Ok(Some(verifier))
    }

    fn save(&mut self, verifier: &Verifier) -> Result<()> {
        let json = serde_json::to_string_pretty(verifier)?;
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&verifier.domain);
        std::fs::write(&path, json)?;
        info!(path = %path.display(), "verifier saved");
        Ok(())
    }

    fn remove(&mut self, domain: &str) -> Result<bool> {
        let path = self.path_for(domain);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)?;
        info!(path = %path.display(), "verifier removed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(domain: &str) -> Verifier {
        Verifier {
            hash: "aa".repeat(32),
            salt: "bb".repeat(16),
            domain: domain.to_string(),
            created_at: 1,
            version: 1,
        }
    }

    #[test]
    fn test_memory_store_one_record_per_domain() {
        let mut store = MemoryStore::new();
        store.save(&record("a")).unwrap();
        let mut newer = record("a");
        newer.created_at = 2;
        store.save(&newer).unwrap();

        assert_eq!(store.load("a").unwrap(), Some(newer));
        assert_eq!(store.load("b").unwrap(), None);
        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("verifiers"));

        assert_eq!(store.load("speakeasy.local").unwrap(), None);
        store.save(&record("speakeasy.local")).unwrap();

        let reopened = FileStore::new(dir.path().join("verifiers"));
        assert_eq!(
            reopened.load("speakeasy.local").unwrap(),
            Some(record("speakeasy.local"))
        );
        assert_eq!(reopened.load("other").unwrap(), None);

        assert!(store.remove("speakeasy.local").unwrap());
        assert_eq!(store.load("speakeasy.local").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        std::fs::write(store.path_for("d"), "{ not json").unwrap();
        assert!(store.load("d").is_err());
    }
}
