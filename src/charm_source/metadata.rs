use std::collections::BTreeMap;

use serde_derive::{Deserialize, Serialize};

use super::relation::RelationEndpoint;

/// A charm's metadata.yaml file
///
/// Only the parts a machine charm reads at runtime are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Metadata {
    pub name: String,

    /// A short, one-line description of the charm
    pub summary: String,

    pub description: String,

    /// A list of maintainers in the format "First Last <email>"
    #[serde(default)]
    pub maintainers: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub series: Vec<String>,

    #[serde(default)]
    pub subordinate: bool,

    /// Map of relations provided by this charm
    ///
    /// Each key represents the name of the relation as known by this charm
    #[serde(default)]
    pub provides: BTreeMap<String, RelationEndpoint>,

    /// Map of relations required by this charm
    #[serde(default)]
    pub requires: BTreeMap<String, RelationEndpoint>,

    /// Mutual relations between units of this charm
    #[serde(default)]
    pub peers: BTreeMap<String, RelationEndpoint>,

    /// Extra bindings for the charm
    ///
    /// Key only map, value must be blank.
    #[serde(default)]
    pub extra_bindings: BTreeMap<String, ()>,
}

impl Metadata {
    /// Names of every relation endpoint the charm declares
    pub fn endpoints(&self) -> Vec<String> {
        self.requires
            .keys()
            .chain(self.provides.keys())
            .chain(self.peers.keys())
            .cloned()
            .collect()
    }
}
