//! Operator-invoked actions

use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::cmd::Runner;
use crate::error::CharmError;
use crate::hookenv::HookTools;
use crate::hsm::{generate_key, HsmParams, KeyKind};
use crate::options::CharmOptions;
use crate::relation::{first_available, Relation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GenerateMkek,
    GenerateHmac,
}

impl Action {
    pub const ALL: &'static [Action] = &[Action::GenerateMkek, Action::GenerateHmac];

    fn key_kind(self) -> KeyKind {
        match self {
            Action::GenerateMkek => KeyKind::Mkek,
            Action::GenerateHmac => KeyKind::Hmac,
        }
    }

    fn key_name(self) -> &'static str {
        match self {
            Action::GenerateMkek => "MKEK",
            Action::GenerateHmac => "HMAC",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Action::GenerateMkek => "generate-mkek",
            Action::GenerateHmac => "generate-hmac",
        })
    }
}

impl FromStr for Action {
    type Err = CharmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.to_string() == s)
            .ok_or_else(|| CharmError::UnknownEvent(format!("Action {} undefined", s)))
    }
}

fn perform(
    action: Action,
    options: &CharmOptions,
    relations: &[Relation],
    runner: &dyn Runner,
) -> Result<(), CharmError> {
    let params = first_available(relations, "hsm")
        .and_then(HsmParams::from_relation)
        .ok_or_else(|| {
            CharmError::RelationNotAvailable(format!(
                "Can't generate an {} in associated HSM because HSM is not available.",
                action.key_name()
            ))
        })?;

    generate_key(action.key_kind(), &params, options, runner)
}

/// Run an action, reporting any failure back to the operator
///
/// A failure is passed to `action-fail` and also returned, so the caller can log it.
pub fn run_action(
    action: Action,
    options: &CharmOptions,
    relations: &[Relation],
    runner: &dyn Runner,
    tools: &dyn HookTools,
) -> Result<(), CharmError> {
    match perform(action, options, relations, runner) {
        Ok(()) => Ok(()),
        Err(err) => {
            warn!("Action {} failed: {}", action, err);
            tools.action_fail(&err.to_string())?;
            Err(err)
        }
    }
}
