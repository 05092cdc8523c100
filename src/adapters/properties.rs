//! Properties the barbican templates are rendered with
//!
//! Relation properties never fail: data that isn't there yet renders as an empty string.

use serde_json::{json, Map, Value};

use super::AdapterRegistry;
use crate::charm::EndpointType;
use crate::error::CharmError;
use crate::options::{
    barbican_api_keystone_audit_pipeline, barbican_api_keystone_pipeline, barbican_api_pipeline,
    ConfigurationAdapter,
};
use crate::relation::Relation;

const DEFAULT_AMQP_PORT: &str = "5672";

/// First non-empty value of `key` across a group of relations
fn first(relations: &[Relation], key: &str) -> String {
    relations
        .iter()
        .map(|r| r.get(key))
        .find(|v| !v.is_empty())
        .unwrap_or("")
        .to_string()
}

fn first_or(relations: &[Relation], key: &str, default: &str) -> String {
    let value = first(relations, key);
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// Render a JSON value the way a template would expect to see it
fn json_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        v => v.to_string(),
    }
}

/// The `plugin_data` object published over the HSM relation
fn plugin_data(relations: &[Relation]) -> Map<String, Value> {
    relations
        .iter()
        .find_map(|r| r.json_object("plugin_data"))
        .unwrap_or_default()
}

fn plugin_value(relations: &[Relation], key: &str) -> Value {
    Value::String(
        plugin_data(relations)
            .get(key)
            .map(json_to_string)
            .unwrap_or_default(),
    )
}

// hsm

pub fn library_path(hsm: &[Relation]) -> Value {
    plugin_value(hsm, "library_path")
}

pub fn login(hsm: &[Relation]) -> Value {
    plugin_value(hsm, "login")
}

pub fn slot_id(hsm: &[Relation]) -> Value {
    plugin_value(hsm, "slot_id")
}

// secrets

/// One `{name, data}` object per related secrets plugin
pub fn plugins(secrets: &[Relation]) -> Value {
    Value::Array(
        secrets
            .iter()
            .filter(|r| !r.get("name").is_empty())
            .map(|r| {
                json!({
                    "name": r.get("name"),
                    "data": r.json_object("data").unwrap_or_default(),
                })
            })
            .collect(),
    )
}

pub fn plugins_string(secrets: &[Relation]) -> Value {
    Value::String(
        secrets
            .iter()
            .map(|r| r.get("name"))
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(","),
    )
}

// shared-db

pub fn db_host(db: &[Relation]) -> Value {
    Value::String(first(db, "db_host"))
}

pub fn db_password(db: &[Relation]) -> Value {
    Value::String(first(db, "password"))
}

pub fn db_username(db: &[Relation]) -> Value {
    Value::String(first(db, "username"))
}

pub fn db_database(db: &[Relation]) -> Value {
    Value::String(first(db, "database"))
}

/// SQLAlchemy connection string
pub fn db_uri(db: &[Relation]) -> Value {
    let host = first(db, "db_host");
    if host.is_empty() {
        return Value::String(String::new());
    }

    Value::String(format!(
        "mysql+pymysql://{}:{}@{}/{}",
        first(db, "username"),
        first(db, "password"),
        host,
        first(db, "database"),
    ))
}

// amqp

pub fn amqp_hostname(amqp: &[Relation]) -> Value {
    Value::String(first(amqp, "hostname"))
}

pub fn amqp_password(amqp: &[Relation]) -> Value {
    Value::String(first(amqp, "password"))
}

pub fn amqp_username(amqp: &[Relation]) -> Value {
    Value::String(first(amqp, "username"))
}

pub fn amqp_vhost(amqp: &[Relation]) -> Value {
    Value::String(first(amqp, "vhost"))
}

pub fn amqp_port(amqp: &[Relation]) -> Value {
    Value::String(first_or(amqp, "port", DEFAULT_AMQP_PORT))
}

/// oslo.messaging transport URL
pub fn amqp_transport_url(amqp: &[Relation]) -> Value {
    let host = first(amqp, "hostname");
    if host.is_empty() {
        return Value::String(String::new());
    }

    Value::String(format!(
        "rabbit://{}:{}@{}:{}/{}",
        first(amqp, "username"),
        first(amqp, "password"),
        host,
        first_or(amqp, "port", DEFAULT_AMQP_PORT),
        first(amqp, "vhost"),
    ))
}

// identity-service

pub fn service_host(ks: &[Relation]) -> Value {
    Value::String(first(ks, "service_host"))
}

pub fn service_port(ks: &[Relation]) -> Value {
    Value::String(first(ks, "service_port"))
}

pub fn service_protocol(ks: &[Relation]) -> Value {
    Value::String(first_or(ks, "service_protocol", "http"))
}

pub fn auth_host(ks: &[Relation]) -> Value {
    Value::String(first(ks, "auth_host"))
}

pub fn auth_port(ks: &[Relation]) -> Value {
    Value::String(first(ks, "auth_port"))
}

pub fn auth_protocol(ks: &[Relation]) -> Value {
    Value::String(first_or(ks, "auth_protocol", "http"))
}

pub fn service_tenant(ks: &[Relation]) -> Value {
    Value::String(first(ks, "service_tenant"))
}

pub fn service_username(ks: &[Relation]) -> Value {
    Value::String(first(ks, "service_username"))
}

pub fn service_password(ks: &[Relation]) -> Value {
    Value::String(first(ks, "service_password"))
}

pub fn api_version(ks: &[Relation]) -> Value {
    Value::String(first_or(ks, "api_version", "2.0"))
}

fn url(protocol: String, host: String, port: String) -> Value {
    if host.is_empty() {
        return Value::String(String::new());
    }
    Value::String(format!("{}://{}:{}", protocol, host, port))
}

pub fn auth_uri(ks: &[Relation]) -> Value {
    url(
        first_or(ks, "service_protocol", "http"),
        first(ks, "service_host"),
        first(ks, "service_port"),
    )
}

pub fn auth_url(ks: &[Relation]) -> Value {
    url(
        first_or(ks, "auth_protocol", "http"),
        first(ks, "auth_host"),
        first(ks, "auth_port"),
    )
}

// options

pub fn api_pipeline(config: &ConfigurationAdapter) -> Value {
    barbican_api_pipeline(config.keystone_api_version).into()
}

pub fn api_keystone_pipeline(config: &ConfigurationAdapter) -> Value {
    barbican_api_keystone_pipeline(config.keystone_api_version).into()
}

pub fn api_keystone_audit_pipeline(config: &ConfigurationAdapter) -> Value {
    barbican_api_keystone_audit_pipeline(config.keystone_api_version).into()
}

fn port(config: &ConfigurationAdapter, endpoint_type: EndpointType) -> Value {
    config
        .port(endpoint_type)
        .map(Value::from)
        .unwrap_or(Value::Null)
}

pub fn public_port(config: &ConfigurationAdapter) -> Value {
    port(config, EndpointType::Public)
}

pub fn admin_port(config: &ConfigurationAdapter) -> Value {
    port(config, EndpointType::Admin)
}

pub fn internal_port(config: &ConfigurationAdapter) -> Value {
    port(config, EndpointType::Internal)
}

pub fn service_type(config: &ConfigurationAdapter) -> Value {
    config.charm.service_type.as_str().into()
}

pub fn group(config: &ConfigurationAdapter) -> Value {
    config.charm.group.as_str().into()
}

pub fn release(config: &ConfigurationAdapter) -> Value {
    config.charm.release.to_string().into()
}

impl AdapterRegistry {
    /// The properties barbican's templates use
    pub fn barbican() -> Result<Self, CharmError> {
        let mut registry = Self::new();

        registry.register_option("barbican_api_pipeline", api_pipeline)?;
        registry.register_option("barbican_api_keystone_pipeline", api_keystone_pipeline)?;
        registry.register_option(
            "barbican_api_keystone_audit_pipeline",
            api_keystone_audit_pipeline,
        )?;
        registry.register_option("public_port", public_port)?;
        registry.register_option("admin_port", admin_port)?;
        registry.register_option("internal_port", internal_port)?;
        registry.register_option("service_type", service_type)?;
        registry.register_option("group", group)?;
        registry.register_option("release", release)?;

        registry.register("shared-db", "host", db_host)?;
        registry.register("shared-db", "password", db_password)?;
        registry.register("shared-db", "username", db_username)?;
        registry.register("shared-db", "database", db_database)?;
        registry.register("shared-db", "uri", db_uri)?;

        registry.register("amqp", "hostname", amqp_hostname)?;
        registry.register("amqp", "password", amqp_password)?;
        registry.register("amqp", "username", amqp_username)?;
        registry.register("amqp", "vhost", amqp_vhost)?;
        registry.register("amqp", "port", amqp_port)?;
        registry.register("amqp", "transport_url", amqp_transport_url)?;

        registry.register("identity-service", "service_host", service_host)?;
        registry.register("identity-service", "service_port", service_port)?;
        registry.register("identity-service", "service_protocol", service_protocol)?;
        registry.register("identity-service", "auth_host", auth_host)?;
        registry.register("identity-service", "auth_port", auth_port)?;
        registry.register("identity-service", "auth_protocol", auth_protocol)?;
        registry.register("identity-service", "service_tenant", service_tenant)?;
        registry.register("identity-service", "service_username", service_username)?;
        registry.register("identity-service", "service_password", service_password)?;
        registry.register("identity-service", "api_version", api_version)?;
        registry.register("identity-service", "auth_uri", auth_uri)?;
        registry.register("identity-service", "auth_url", auth_url)?;

        registry.register("hsm", "library_path", library_path)?;
        registry.register("hsm", "login", login)?;
        registry.register("hsm", "slot_id", slot_id)?;

        registry.register("secrets", "plugins", plugins)?;
        registry.register("secrets", "plugins_string", plugins_string)?;

        Ok(registry)
    }
}
