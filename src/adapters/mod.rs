//! Builds the read-only view that configuration templates are rendered from
//!
//! Every property in the view is produced by a named pure function, either of the validated
//! charm configuration or of the relations sharing one name. Property names are
//! `<namespace>.<property>`, where the namespace is `options` for configuration and the relation
//! name with dashes turned into underscores for relations, e.g. `identity_service.auth_url`.

pub mod properties;

use std::collections::BTreeMap;

use log::trace;
use serde_json::{to_value, Map, Value};

use crate::error::CharmError;
use crate::options::ConfigurationAdapter;
use crate::relation::Relation;

/// Namespace configuration properties live under
pub const OPTIONS_NAMESPACE: &str = "options";

/// Computes a property from every relation that shares a name. The slice may be empty.
pub type RelationProperty = fn(&[Relation]) -> Value;

/// Computes a property from the validated configuration
pub type OptionProperty = fn(&ConfigurationAdapter) -> Value;

#[derive(Clone)]
struct RelationAdapter {
    relation: String,
    properties: Vec<(String, RelationProperty)>,
}

/// Registered property functions, kept in registration order
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    options: Vec<(String, OptionProperty)>,
    relations: Vec<RelationAdapter>,
}

/// Template-friendly namespace for a relation name
pub fn namespace(relation_name: &str) -> String {
    relation_name.replace('-', "_")
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a computed configuration property
    pub fn register_option(
        &mut self,
        name: &str,
        property: OptionProperty,
    ) -> Result<(), CharmError> {
        if self.options.iter().any(|(n, _)| n == name) {
            return Err(CharmError::DuplicateProperty(format!(
                "{}.{}",
                OPTIONS_NAMESPACE, name
            )));
        }

        self.options.push((name.to_string(), property));
        Ok(())
    }

    /// Register a property of the relation called `relation`
    pub fn register(
        &mut self,
        relation: &str,
        name: &str,
        property: RelationProperty,
    ) -> Result<(), CharmError> {
        let index = match self.relations.iter().position(|a| a.relation == relation) {
            Some(i) => i,
            None => {
                self.relations.push(RelationAdapter {
                    relation: relation.to_string(),
                    properties: vec![],
                });
                self.relations.len() - 1
            }
        };
        let adapter = &mut self.relations[index];

        if adapter.properties.iter().any(|(n, _)| n == name) {
            return Err(CharmError::DuplicateProperty(format!(
                "{}.{}",
                namespace(relation),
                name
            )));
        }

        adapter.properties.push((name.to_string(), property));
        Ok(())
    }

    pub fn is_registered(&self, relation: &str) -> bool {
        self.relations.iter().any(|a| a.relation == relation)
    }
}

/// The merged, read-only set of values configuration templates are rendered from
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterView {
    properties: BTreeMap<String, Value>,
}

impl AdapterView {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// A property as a string, if it is one
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Nest the flat names into one object per namespace, for the template engine
    pub fn to_context(&self) -> Value {
        let mut context = Map::new();
        for (name, value) in &self.properties {
            let mut split = name.splitn(2, '.');
            let (ns, prop) = match (split.next(), split.next()) {
                (Some(ns), Some(prop)) => (ns, prop),
                _ => continue,
            };

            if let Value::Object(section) = context
                .entry(ns.to_string())
                .or_insert_with(|| Value::Object(Map::new()))
            {
                section.insert(prop.to_string(), value.clone());
            }
        }
        Value::Object(context)
    }
}

/// Accumulates properties, keeping whichever came first for a name
struct Merger {
    properties: BTreeMap<String, Value>,
}

impl Merger {
    fn add(&mut self, namespace: &str, name: &str, value: Value) {
        let full_name = format!("{}.{}", namespace, name);
        if self.properties.contains_key(&full_name) {
            trace!("Ignoring shadowed property {}", full_name);
            return;
        }
        self.properties.insert(full_name, value);
    }
}

/// Raw option values under their snake_case names
fn raw_options(config: &ConfigurationAdapter) -> Vec<(String, Value)> {
    match to_value(&config.options) {
        Ok(Value::Object(map)) => map
            .into_iter()
            .map(|(k, v)| (namespace(&k), v))
            .collect(),
        _ => vec![],
    }
}

/// Pass-through properties for a relation nothing is registered for
///
/// Exposes the raw keys of every relation in the group, the first relation holding a key wins.
fn raw_relation(relations: &[&Relation]) -> Vec<(String, Value)> {
    let mut seen = BTreeMap::new();
    for relation in relations {
        for (k, v) in &relation.data {
            seen.entry(namespace(k))
                .or_insert_with(|| Value::String(v.clone()));
        }
    }
    seen.into_iter().collect()
}

/// Merge configuration and relation adapters into one view
///
/// Configuration properties are merged first, so the computed names under `options` can't be
/// shadowed. Registered relation adapters follow in registration order, each over the relations
/// of its name (possibly none). Relations without a registered adapter come last, in the order
/// their names first appear in `relations`. When two sources produce the same name the earlier
/// one wins.
pub fn build_adapter_view(
    registry: &AdapterRegistry,
    relations: &[Relation],
    config: &ConfigurationAdapter,
) -> AdapterView {
    let mut merger = Merger {
        properties: BTreeMap::new(),
    };

    for (name, property) in &registry.options {
        merger.add(OPTIONS_NAMESPACE, name, property(config));
    }
    for (name, value) in raw_options(config) {
        merger.add(OPTIONS_NAMESPACE, &name, value);
    }

    for adapter in &registry.relations {
        let group: Vec<Relation> = relations
            .iter()
            .filter(|r| r.name == adapter.relation)
            .cloned()
            .collect();
        let ns = namespace(&adapter.relation);

        for (name, property) in &adapter.properties {
            merger.add(&ns, name, property(&group));
        }
    }

    let mut unregistered: Vec<&str> = vec![];
    for relation in relations {
        let name = relation.name.as_str();
        if !registry.is_registered(name) && !unregistered.contains(&name) {
            unregistered.push(name);
        }
    }

    for name in unregistered {
        let group: Vec<&Relation> = relations.iter().filter(|r| r.name == name).collect();
        let ns = namespace(name);

        for (key, value) in raw_relation(&group) {
            merger.add(&ns, &key, value);
        }
    }

    AdapterView {
        properties: merger.properties,
    }
}
