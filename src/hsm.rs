//! Generating key material inside a hardware security module
//!
//! Key generation is delegated to `barbican-manage`, which is run once and waited for. There is
//! no retry and no timeout, and nothing checks whether a key with the same label already exists.

use log::{error, info};
use serde_json::Value;

use crate::cmd::Runner;
use crate::error::CharmError;
use crate::options::CharmOptions;
use crate::relation::Relation;

pub const BARBICAN_MANAGE: &str = "barbican-manage";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Master key encryption key
    Mkek,
    Hmac,
}

impl KeyKind {
    fn operation(self) -> &'static str {
        match self {
            KeyKind::Mkek => "gen_mkek",
            KeyKind::Hmac => "gen_hmac",
        }
    }

    fn key_length(self, options: &CharmOptions) -> u32 {
        match self {
            KeyKind::Mkek => options.mkek_key_length,
            KeyKind::Hmac => options.hmac_key_length,
        }
    }

    fn label(self, options: &CharmOptions) -> &str {
        match self {
            KeyKind::Mkek => &options.label_mkek,
            KeyKind::Hmac => &options.label_hmac,
        }
    }
}

/// Connection details for the HSM, as published by the HSM plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HsmParams {
    pub library_path: String,
    pub login: String,
    pub slot_id: String,
}

impl HsmParams {
    /// Read the params out of an HSM relation's `plugin_data`
    ///
    /// Returns `None` unless all three values are present.
    pub fn from_relation(relation: &Relation) -> Option<Self> {
        let data = relation.json_object("plugin_data")?;
        let field = |key: &str| -> Option<String> {
            match data.get(key)? {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };

        Some(Self {
            library_path: field("library_path")?,
            login: field("login")?,
            slot_id: field("slot_id")?,
        })
    }
}

/// Arguments passed to `barbican-manage` to generate a key
pub fn key_generation_args(
    kind: KeyKind,
    params: &HsmParams,
    options: &CharmOptions,
) -> Vec<String> {
    vec![
        "hsm".into(),
        kind.operation().into(),
        "--library-path".into(),
        params.library_path.clone(),
        "--passphrase".into(),
        params.login.clone(),
        "--slot-id".into(),
        params.slot_id.clone(),
        "--length".into(),
        kind.key_length(options).to_string(),
        "--label".into(),
        kind.label(options).to_string(),
    ]
}

/// Generate a key of the given kind on the HSM
pub fn generate_key(
    kind: KeyKind,
    params: &HsmParams,
    options: &CharmOptions,
    runner: &dyn Runner,
) -> Result<(), CharmError> {
    let args = key_generation_args(kind, params, options);

    match runner.run(BARBICAN_MANAGE, &args) {
        Ok(()) => {
            info!("{} hsm {} succeeded", BARBICAN_MANAGE, kind.operation());
            Ok(())
        }
        Err(err) => {
            let message = format!("{} hsm {} failed.", BARBICAN_MANAGE, kind.operation());
            error!("{} {}", message, err);
            Err(CharmError::KeyGeneration(message))
        }
    }
}
