//! The unit's persistent key-value store
//!
//! Values survive between hook invocations of the same unit. Hooks run strictly one at a time
//! per unit, so reads and writes need no locking.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ex::fs::{read, write};
use serde_yaml::{from_slice, to_vec};

use crate::error::CharmError;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), CharmError>;

    fn unset(&mut self, key: &str) -> Result<(), CharmError>;

    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// Store backed by a YAML file, written through on every change
#[derive(Debug, Clone)]
pub struct UnitState {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl UnitState {
    /// Load the store, starting empty if the file doesn't exist yet
    pub fn load<P: Into<PathBuf>>(path: P) -> Result<Self, CharmError> {
        let path = path.into();
        let values = if path.exists() {
            from_slice(&read(&path)?)?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    fn save(&self) -> Result<(), CharmError> {
        write(&self.path, to_vec(&self.values)?)?;
        Ok(())
    }
}

impl KeyValueStore for UnitState {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CharmError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn unset(&mut self, key: &str) -> Result<(), CharmError> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

/// Store that only lives as long as the process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    pub values: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CharmError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn unset(&mut self, key: &str) -> Result<(), CharmError> {
        self.values.remove(key);
        Ok(())
    }
}
