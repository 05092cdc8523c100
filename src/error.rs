//! Errors for the barbican charm

use ex::io::Error as ExIOError;
use failure::Fail;
use serde_json::Error as JsonError;
use serde_yaml::Error as YamlError;

#[derive(Debug, Fail)]
pub enum CharmError {
    #[fail(display = "I/O error: {}", _0)]
    ExIOError(#[fail(cause)] ExIOError),

    #[fail(display = "YAML Error: {}", _0)]
    YamlError(#[fail(cause)] YamlError),

    #[fail(display = "JSON Error: {}", _0)]
    JsonError(#[fail(cause)] JsonError),

    #[fail(display = "Could not resolve OpenStack release: {}", _0)]
    ReleaseResolution(String),

    #[fail(
        display = "Unsupported {} ({}). Should be one of: {}",
        field, value, accepted
    )]
    ConfigValidation {
        field: String,
        value: String,
        accepted: String,
    },

    #[fail(display = "{}", _0)]
    KeyGeneration(String),

    #[fail(display = "Adapter property `{}` is already registered", _0)]
    DuplicateProperty(String),

    #[fail(display = "Couldn't load template `{}`: {}", _0, _1)]
    TemplateRegister(String, String),

    #[fail(display = "Configuration file `{}` failed to render: {}", _0, _1)]
    TemplateRender(String, String),

    #[fail(display = "{}", _0)]
    RelationNotAvailable(String),

    #[fail(display = "Unknown hook or action `{}`", _0)]
    UnknownEvent(String),

    #[fail(display = "Error running subcommand `{}`: `{}`", _0, _1)]
    SubcommandError(String, String),
}

impl CharmError {
    /// Builds a validation error for an enumerated option
    pub fn invalid_option(field: &str, value: &str, accepted: &[&str]) -> Self {
        CharmError::ConfigValidation {
            field: field.to_string(),
            value: value.to_string(),
            accepted: accepted.join(", "),
        }
    }
}

impl From<ExIOError> for CharmError {
    fn from(err: ExIOError) -> Self {
        CharmError::ExIOError(err)
    }
}

impl From<YamlError> for CharmError {
    fn from(err: YamlError) -> Self {
        CharmError::YamlError(err)
    }
}

impl From<JsonError> for CharmError {
    fn from(err: JsonError) -> Self {
        CharmError::JsonError(err)
    }
}
