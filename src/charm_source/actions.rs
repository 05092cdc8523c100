use std::collections::BTreeMap;

use serde_derive::{Deserialize, Serialize};
use serde_yaml::Value;

/// One action as declared in actions.yaml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ActionSpec {
    pub description: String,

    /// JSON schema of the action's parameters
    #[serde(default)]
    pub params: BTreeMap<String, Value>,

    #[serde(default)]
    pub required: Vec<String>,
}

/// A charm's actions.yaml file, keyed by action name
pub type Actions = BTreeMap<String, ActionSpec>;
