//! The charm's own declarations, as shipped next to the hook binary

pub mod actions;
pub mod config;
pub mod metadata;
pub mod relation;

pub use actions::{ActionSpec, Actions};
pub use config::{Config, ConfigOption};
pub use metadata::Metadata;
pub use relation::{RelationEndpoint, RelationScope};

use std::path::PathBuf;

use ex::fs::read;
use serde_yaml::from_slice;

use crate::error::CharmError;

/// A charm, as represented by its directory
///
/// Only `metadata.yaml` is read up front. `config.yaml` and `actions.yaml` are optional and
/// parsed on request.
#[derive(Debug, Clone, PartialEq)]
pub struct CharmSource {
    /// The path to the charm directory
    pub source: PathBuf,

    /// The charm's metadata.yaml file
    pub metadata: Metadata,
}

impl CharmSource {
    /// Load a charm from its directory
    pub fn load<P: Into<PathBuf>>(source: P) -> Result<Self, CharmError> {
        let source = source.into();
        let metadata = from_slice(&read(source.join("metadata.yaml"))?)?;

        Ok(Self { source, metadata })
    }

    /// The charm's config.yaml file, if it has one
    pub fn config(&self) -> Result<Option<Config>, CharmError> {
        match read(self.source.join("config.yaml")) {
            Ok(bytes) => Ok(Some(from_slice(&bytes)?)),
            Err(_) => Ok(None),
        }
    }

    /// The charm's actions.yaml file, empty if it has none
    pub fn actions(&self) -> Result<Actions, CharmError> {
        match read(self.source.join("actions.yaml")) {
            Ok(bytes) => Ok(from_slice(&bytes)?),
            Err(_) => Ok(Actions::new()),
        }
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.source.join("templates")
    }
}
