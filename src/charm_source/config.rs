use std::collections::BTreeMap;

use serde_derive::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CharmError;
use crate::options::CharmOptions;

/// Config option as defined in config.yaml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, tag = "type", rename_all = "kebab-case")]
pub enum ConfigOption {
    /// String config option
    #[serde(rename_all = "kebab-case")]
    String {
        default: Option<String>,
        description: String,
    },

    /// Integer config option
    #[serde(rename = "int", rename_all = "kebab-case")]
    Integer { default: i64, description: String },

    /// Boolean config option
    #[serde(rename_all = "kebab-case")]
    Boolean { default: bool, description: String },

    #[serde(rename_all = "kebab-case")]
    Float { default: f64, description: String },
}

impl ConfigOption {
    fn default_value(&self) -> Value {
        match self {
            ConfigOption::String { default, .. } => {
                default.clone().map(Value::String).unwrap_or(Value::Null)
            }
            ConfigOption::Integer { default, .. } => Value::from(*default),
            ConfigOption::Boolean { default, .. } => Value::from(*default),
            ConfigOption::Float { default, .. } => Value::from(*default),
        }
    }
}

/// A charm's config.yaml file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    pub options: BTreeMap<String, ConfigOption>,
}

impl Config {
    /// The options a freshly deployed unit sees, before the operator sets anything
    ///
    /// String options without a default are left out, as `config-get` would leave them unset.
    pub fn defaults(&self) -> Result<CharmOptions, CharmError> {
        let values: Map<String, Value> = self
            .options
            .iter()
            .map(|(name, option)| (name.clone(), option.default_value()))
            .filter(|(_, value)| !value.is_null())
            .collect();

        Ok(serde_json::from_value(Value::Object(values))?)
    }
}
