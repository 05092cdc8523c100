//! Relation data as handed over by the unit agent

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{from_str, Map, Value};

/// Flat key/value data of one relation. Every value is a string.
pub type RelationData = BTreeMap<String, String>;

/// One established relation to a peer service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// The endpoint name from `metadata.yaml`, e.g. `shared-db`
    pub name: String,

    /// The agent's relation id, e.g. `shared-db:4`
    pub id: String,

    pub data: RelationData,
}

/// Keys the remote side must have published before a relation counts as available
fn required_keys(name: &str) -> &'static [&'static str] {
    match name {
        "shared-db" => &["db_host", "password"],
        "amqp" => &["hostname", "password"],
        "identity-service" => &[
            "service_host",
            "service_port",
            "auth_host",
            "auth_port",
            "service_tenant",
            "service_username",
            "service_password",
        ],
        "hsm" => &["plugin_data"],
        "secrets" => &["name"],
        _ => &[],
    }
}

impl Relation {
    pub fn new<N: Into<String>, I: Into<String>>(name: N, id: I, data: RelationData) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            data,
        }
    }

    /// Value of a key, or the empty string if it hasn't been set
    pub fn get(&self, key: &str) -> &str {
        self.data.get(key).map(String::as_str).unwrap_or("")
    }

    /// Parse a value that carries a JSON object
    ///
    /// Missing keys and malformed JSON both give `None`.
    pub fn json_object(&self, key: &str) -> Option<Map<String, Value>> {
        self.data
            .get(key)
            .and_then(|raw| from_str::<Map<String, Value>>(raw).ok())
    }

    /// The remote side has published some data
    pub fn is_connected(&self) -> bool {
        !self.data.is_empty()
    }

    /// The remote side has published everything this charm needs from it
    pub fn is_available(&self) -> bool {
        self.is_connected()
            && required_keys(&self.name)
                .iter()
                .all(|k| !self.get(k).is_empty())
    }
}

/// All relations with the given name, in the order they were given
pub fn named<'a>(relations: &'a [Relation], name: &'a str) -> impl Iterator<Item = &'a Relation> {
    relations.iter().filter(move |r| r.name == name)
}

/// The first relation with the given name that is available
pub fn first_available<'a>(relations: &'a [Relation], name: &str) -> Option<&'a Relation> {
    relations.iter().find(|r| r.name == name && r.is_available())
}

/// Flags describing relation state, e.g. `amqp.connected` and `amqp.available`
pub fn relation_flags(relations: &[Relation]) -> BTreeSet<String> {
    let mut flags = BTreeSet::new();
    for relation in relations {
        if relation.is_connected() {
            flags.insert(format!("{}.connected", relation.name));
        }
        if relation.is_available() {
            flags.insert(format!("{}.available", relation.name));
        }
    }
    flags
}
