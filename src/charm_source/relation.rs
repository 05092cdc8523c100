use serde_derive::{Deserialize, Serialize};

/// Scope of a given relation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub enum RelationScope {
    Global,
    Container,
}

impl Default for RelationScope {
    fn default() -> Self {
        Self::Global
    }
}

/// Relation endpoint declared in metadata.yaml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RelationEndpoint {
    /// The interface this endpoint speaks, e.g. `mysql-shared`
    pub interface: String,

    /// Maximum number of supported connections to this relation endpoint
    pub limit: Option<u32>,

    /// Informational only. Which relations the charm waits for is decided by the charm itself.
    #[serde(default)]
    pub optional: bool,

    /// The scope of the relation. Defaults to "global"
    pub scope: Option<RelationScope>,
}
