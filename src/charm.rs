//! The per-release configuration of the barbican charm

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::CharmError;
use crate::options::CharmOptions;
use crate::paths::{BARBICAN_API_PASTE_CONF, BARBICAN_CONF, BARBICAN_WSGI_CONF};
use crate::release::Release;

const PACKAGES: &[&str] = &[
    "barbican-common",
    "barbican-api",
    "barbican-worker",
    "python3-barbican",
    "libapache2-mod-wsgi-py3",
    // hacluster subordinate needs apt bindings
    "python-apt",
];

const PACKAGES_VICTORIA: &[&str] = &[
    "barbican-common",
    "barbican-api",
    "barbican-worker",
    "python3-barbican",
    "libapache2-mod-wsgi-py3",
    "python3-apt",
];

const PURGE_PACKAGES: &[&str] = &["python-barbican", "python-mysqldb"];

const SERVICES: &[&str] = &["apache2", "barbican-worker"];

/// The HSM relation is only required if `require-hsm-plugin` is set
const REQUIRED_RELATIONS: &[&str] = &["shared-db", "amqp", "identity-service"];

/// Keystone endpoint type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EndpointType {
    Public,
    Admin,
    Internal,
}

/// Ports a service listens on, per endpoint type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiPorts {
    pub public: u16,
    pub admin: u16,
    pub internal: u16,
}

impl ApiPorts {
    pub fn get(&self, endpoint_type: EndpointType) -> u16 {
        match endpoint_type {
            EndpointType::Public => self.public,
            EndpointType::Admin => self.admin,
            EndpointType::Internal => self.internal,
        }
    }
}

/// Everything about the charm that depends only on the release
#[derive(Debug, Clone, PartialEq)]
pub struct BarbicanCharm {
    pub name: String,
    pub release: Release,
    pub packages: Vec<String>,
    pub purge_packages: Vec<String>,
    pub api_ports: BTreeMap<String, ApiPorts>,
    pub service_type: String,
    pub default_service: String,
    pub services: Vec<String>,
    pub required_relations: Vec<String>,

    /// Services to restart when a rendered file changes
    pub restart_map: BTreeMap<PathBuf, Vec<String>>,
    pub group: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl BarbicanCharm {
    pub fn for_release(release: Release) -> Result<Self, CharmError> {
        let release = release.ensure_supported()?;
        let packages = if release >= Release::Victoria {
            PACKAGES_VICTORIA
        } else {
            PACKAGES
        };

        let mut api_ports = BTreeMap::new();
        api_ports.insert(
            "barbican-worker".to_string(),
            ApiPorts {
                public: 9311,
                admin: 9312,
                internal: 9311,
            },
        );

        let restart_map = [BARBICAN_CONF, BARBICAN_API_PASTE_CONF, BARBICAN_WSGI_CONF]
            .iter()
            .map(|path| (PathBuf::from(*path), strings(SERVICES)))
            .collect();

        Ok(Self {
            name: "barbican".into(),
            release,
            packages: strings(packages),
            purge_packages: strings(PURGE_PACKAGES),
            api_ports,
            service_type: "barbican".into(),
            default_service: "barbican-worker".into(),
            services: strings(SERVICES),
            required_relations: strings(REQUIRED_RELATIONS),
            restart_map,
            group: "barbican".into(),
        })
    }

    pub fn api_port(&self, service: &str, endpoint_type: EndpointType) -> Option<u16> {
        self.api_ports.get(service).map(|p| p.get(endpoint_type))
    }

    /// URL the default service is reachable at for an endpoint type
    pub fn endpoint_url(&self, address: &str, endpoint_type: EndpointType) -> Option<String> {
        let port = self.api_port(&self.default_service, endpoint_type)?;

        if address.contains(':') {
            Some(format!("http://[{}]:{}", address, port))
        } else {
            Some(format!("http://{}:{}", address, port))
        }
    }

    /// Relations that must be present before the unit is ready
    pub fn relations_to_check(&self, options: &CharmOptions) -> Vec<String> {
        let mut required = self.required_relations.clone();
        if options.require_hsm_plugin {
            required.push("hsm".into());
        }
        required
    }
}
