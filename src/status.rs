//! Working out the workload status reported to the operator

use std::fmt;

use crate::charm::BarbicanCharm;
use crate::options::{validate_keystone_api_version, CharmOptions};
use crate::relation::Relation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadState {
    Maintenance,
    Blocked,
    Waiting,
    Active,
}

impl fmt::Display for WorkloadState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            WorkloadState::Maintenance => "maintenance",
            WorkloadState::Blocked => "blocked",
            WorkloadState::Waiting => "waiting",
            WorkloadState::Active => "active",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadStatus {
    pub state: WorkloadState,
    pub message: String,
}

impl WorkloadStatus {
    pub fn new<S: Into<String>>(state: WorkloadState, message: S) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

/// Required relations with no relation of that name connected
pub fn missing_relations(required: &[String], relations: &[Relation]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !relations.iter().any(|r| &r.name == *name && r.is_connected()))
        .cloned()
        .collect()
}

/// Required relations that are connected but haven't sent everything yet
pub fn incomplete_relations(required: &[String], relations: &[Relation]) -> Vec<String> {
    required
        .iter()
        .filter(|name| {
            relations.iter().any(|r| &r.name == *name && r.is_connected())
                && !relations.iter().any(|r| &r.name == *name && r.is_available())
        })
        .cloned()
        .collect()
}

/// Status of the unit, given its configuration and the relations it currently has
pub fn assess_status(
    charm: &BarbicanCharm,
    options: &CharmOptions,
    relations: &[Relation],
) -> WorkloadStatus {
    if let Err(err) = validate_keystone_api_version(options) {
        return WorkloadStatus::new(WorkloadState::Blocked, err.to_string());
    }

    let required = charm.relations_to_check(options);

    let missing = missing_relations(&required, relations);
    if !missing.is_empty() {
        return WorkloadStatus::new(
            WorkloadState::Blocked,
            format!("Missing relations: {}", missing.join(", ")),
        );
    }

    let incomplete = incomplete_relations(&required, relations);
    if !incomplete.is_empty() {
        return WorkloadStatus::new(
            WorkloadState::Waiting,
            format!("Incomplete relations: {}", incomplete.join(", ")),
        );
    }

    WorkloadStatus::new(WorkloadState::Active, "Unit is ready")
}
