//! The operator-facing charm options and the validated view of them used in templates

use std::str::FromStr;

use serde_derive::{Deserialize, Serialize};

use crate::charm::{BarbicanCharm, EndpointType};
use crate::error::CharmError;

/// Values of the options declared in `config.yaml`
///
/// Missing keys take the same defaults as `config.yaml` declares.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct CharmOptions {
    pub openstack_origin: String,
    pub debug: bool,
    pub verbose: bool,
    pub rabbit_user: String,
    pub rabbit_vhost: String,
    pub database: String,
    pub database_user: String,
    pub region: String,
    pub keystone_api_version: String,
    pub require_hsm_plugin: bool,
    pub mkek_key_length: u32,
    pub label_mkek: String,
    pub hmac_key_length: u32,
    pub label_hmac: String,
}

impl Default for CharmOptions {
    fn default() -> Self {
        Self {
            openstack_origin: "distro".into(),
            debug: false,
            verbose: false,
            rabbit_user: "barbican".into(),
            rabbit_vhost: "openstack".into(),
            database: "barbican".into(),
            database_user: "barbican".into(),
            region: "RegionOne".into(),
            keystone_api_version: "3".into(),
            require_hsm_plugin: false,
            mkek_key_length: 32,
            label_mkek: "primarymkek".into(),
            hmac_key_length: 32,
            label_hmac: "primaryhmac".into(),
        }
    }
}

/// Accepted values of `keystone-api-version`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystoneApiVersion {
    V2,
    V3,
    Unauthenticated,
}

impl KeystoneApiVersion {
    pub const ACCEPTED: &'static [&'static str] = &["2", "3", "none"];
}

impl FromStr for KeystoneApiVersion {
    type Err = CharmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2" => Ok(KeystoneApiVersion::V2),
            "3" => Ok(KeystoneApiVersion::V3),
            "none" => Ok(KeystoneApiVersion::Unauthenticated),
            other => Err(CharmError::invalid_option(
                "keystone-api-version",
                other,
                Self::ACCEPTED,
            )),
        }
    }
}

pub fn validate_keystone_api_version(
    options: &CharmOptions,
) -> Result<KeystoneApiVersion, CharmError> {
    options.keystone_api_version.parse()
}

/// Paste pipeline serving `/v1`, honouring unauthenticated mode
pub fn barbican_api_pipeline(version: KeystoneApiVersion) -> &'static str {
    match version {
        KeystoneApiVersion::V2 => "cors http_proxy_to_wsgi keystone_authtoken context apiapp",
        KeystoneApiVersion::V3 => "cors http_proxy_to_wsgi keystone_v3_authtoken context apiapp",
        KeystoneApiVersion::Unauthenticated => {
            "cors http_proxy_to_wsgi unauthenticated-context apiapp"
        }
    }
}

/// Paste pipeline that always authenticates against keystone
pub fn barbican_api_keystone_pipeline(version: KeystoneApiVersion) -> &'static str {
    match version {
        KeystoneApiVersion::V2 => "cors http_proxy_to_wsgi keystone_authtoken context apiapp",
        _ => "cors http_proxy_to_wsgi keystone_v3_authtoken context apiapp",
    }
}

pub fn barbican_api_keystone_audit_pipeline(version: KeystoneApiVersion) -> &'static str {
    match version {
        KeystoneApiVersion::V2 => "http_proxy_to_wsgi keystone_authtoken context audit apiapp",
        _ => "http_proxy_to_wsgi keystone_v3_authtoken context audit apiapp",
    }
}

/// Charm options and charm configuration, validated together
///
/// Constructing one is the point where enumerated options are checked, so a view built from it
/// can never carry an unsupported value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationAdapter {
    pub options: CharmOptions,
    pub charm: BarbicanCharm,
    pub keystone_api_version: KeystoneApiVersion,
}

impl ConfigurationAdapter {
    pub fn new(options: &CharmOptions, charm: &BarbicanCharm) -> Result<Self, CharmError> {
        let keystone_api_version = validate_keystone_api_version(options)?;

        Ok(Self {
            options: options.clone(),
            charm: charm.clone(),
            keystone_api_version,
        })
    }

    /// Port of the charm's default service for an endpoint type
    pub fn port(&self, endpoint_type: EndpointType) -> Option<u16> {
        self.charm.api_port(&self.charm.default_service, endpoint_type)
    }
}
