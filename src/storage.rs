//! # Storage Management Module
//!
//! ## Purpose
//! Optional persistent tier for the keyed stores, backed by an embedded sled
//! database with one tree per entity type and bincode-encoded values. When no
//! database path is configured the stores run purely in memory and this
//! module is never instantiated.
//!
//! ## Key Features
//! - One tree per entity type (colleges, users, preferences, ...)
//! - Typed put/get/scan helpers over bincode values
//! - Health check via a write/read/delete probe
//! - Per-tree record counts for the admin health endpoint

use crate::errors::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Main storage manager holding one tree per entity type.
pub struct Storage {
    db: sled::Db,
    pub colleges: Tree,
    pub users: Tree,
    pub preferences: Tree,
    pub reviews: Tree,
    pub notifications: Tree,
    pub saved: Tree,
    pub applications: Tree,
    pub leads: Tree,
    pub contact: Tree,
}

/// A typed wrapper over one sled tree.
#[derive(Clone)]
pub struct Tree {
    inner: sled::Tree,
    name: &'static str,
}

/// Record counts per entity type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageStats {
    pub colleges: usize,
    pub users: usize,
    pub preferences: usize,
    pub reviews: usize,
    pub notifications: usize,
    pub saved: usize,
    pub applications: usize,
    pub leads: usize,
    pub contact: usize,
    pub size_on_disk_bytes: u64,
}

impl Storage {
    /// Open the database and all entity trees.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = sled::open(path)?;

        let storage = Self {
            colleges: Tree::open(&db, "colleges")?,
            users: Tree::open(&db, "users")?,
            preferences: Tree::open(&db, "user_preferences")?,
            reviews: Tree::open(&db, "reviews")?,
            notifications: Tree::open(&db, "notifications")?,
            saved: Tree::open(&db, "saved_colleges")?,
            applications: Tree::open(&db, "applications")?,
            leads: Tree::open(&db, "leads")?,
            contact: Tree::open(&db, "contact_messages")?,
            db,
        };

        tracing::info!("Storage opened at {:?}", path);
        Ok(Arc::new(storage))
    }

    /// Flush pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Health check: probe a write, read, and delete on a scratch key.
    pub fn health_check(&self) -> Result<()> {
        let key = b"__health_check__";
        self.colleges.inner.insert(key, b"ok")?;
        let read = self.colleges.inner.get(key)?;
        if read.is_none() {
            return Err(crate::ChaloError::Storage {
                message: "Health-check value not found after write".to_string(),
            });
        }
        self.colleges.inner.remove(key)?;
        Ok(())
    }

    /// Record counts for the admin health endpoint.
    pub fn stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            colleges: self.colleges.len(),
            users: self.users.len(),
            preferences: self.preferences.len(),
            reviews: self.reviews.len(),
            notifications: self.notifications.len(),
            saved: self.saved.len(),
            applications: self.applications.len(),
            leads: self.leads.len(),
            contact: self.contact.len(),
            size_on_disk_bytes: self.db.size_on_disk()?,
        })
    }
}

impl Tree {
    fn open(db: &sled::Db, name: &'static str) -> Result<Self> {
        let inner = db.open_tree(name)?;
        Ok(Self { inner, name })
    }

    /// Number of records in this tree.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Store a value under a string key.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = bincode::serialize(value)?;
        self.inner.insert(key.as_bytes(), bytes)?;
        tracing::debug!(tree = self.name, key, "stored record");
        Ok(())
    }

    /// Retrieve a value by key.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.inner.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Remove a record. Returns whether anything was removed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.inner.remove(key.as_bytes())?.is_some())
    }

    /// Whether a key exists.
    pub fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.inner.contains_key(key.as_bytes())?)
    }

    /// Decode every value in the tree. Undecodable entries are skipped with
    /// a warning rather than failing the whole scan.
    pub fn all<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for item in self.inner.iter() {
            let (_, bytes) = item?;
            match bincode::deserialize(&bytes) {
                Ok(value) => out.push(value),
                Err(e) => tracing::warn!(tree = self.name, "skipping undecodable record: {}", e),
            }
        }
        Ok(out)
    }

    /// Decode every value whose key starts with the given prefix.
    pub fn scan_prefix<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for item in self.inner.scan_prefix(prefix.as_bytes()) {
            let (_, bytes) = item?;
            match bincode::deserialize(&bytes) {
                Ok(value) => out.push(value),
                Err(e) => tracing::warn!(tree = self.name, "skipping undecodable record: {}", e),
            }
        }
        Ok(out)
    }
}
