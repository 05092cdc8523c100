//! Talking to the unit agent through the hook tools it puts on `PATH`

use std::collections::BTreeMap;

use log::{debug, info};
use serde_json::from_slice;

use crate::cmd::{args, Runner};
use crate::error::CharmError;
use crate::options::CharmOptions;
use crate::relation::{Relation, RelationData};
use crate::status::WorkloadStatus;

/// The subset of the unit agent's hook tools that the charm uses
pub trait HookTools {
    fn config(&self) -> Result<CharmOptions, CharmError>;

    /// Every established relation on the given endpoints
    ///
    /// Relation data is the merged settings of all remote units. When two units disagree on a
    /// key, the unit listed first wins.
    fn relations(&self, endpoints: &[String]) -> Result<Vec<Relation>, CharmError>;

    /// Publish settings on the local unit's side of a relation
    fn relation_set(&self, relation_id: &str, settings: &[(&str, String)])
        -> Result<(), CharmError>;

    fn status_set(&self, status: &WorkloadStatus) -> Result<(), CharmError>;

    fn action_fail(&self, message: &str) -> Result<(), CharmError>;

    fn private_address(&self) -> Result<String, CharmError>;
}

/// Hook tools run as subprocesses
pub struct JujuHookTools<'a> {
    runner: &'a dyn Runner,
}

impl<'a> JujuHookTools<'a> {
    pub fn new(runner: &'a dyn Runner) -> Self {
        Self { runner }
    }

    fn relation_ids(&self, endpoint: &str) -> Result<Vec<String>, CharmError> {
        let output = self
            .runner
            .get_output("relation-ids", &args(&["--format=json", endpoint]))?;
        Ok(from_slice::<Option<Vec<String>>>(&output)?.unwrap_or_default())
    }

    fn relation_units(&self, relation_id: &str) -> Result<Vec<String>, CharmError> {
        let output = self
            .runner
            .get_output("relation-list", &args(&["--format=json", "-r", relation_id]))?;
        Ok(from_slice::<Option<Vec<String>>>(&output)?.unwrap_or_default())
    }

    fn relation_get(&self, relation_id: &str, unit: &str) -> Result<RelationData, CharmError> {
        let output = self.runner.get_output(
            "relation-get",
            &args(&["--format=json", "-r", relation_id, "-", unit]),
        )?;
        Ok(from_slice::<Option<RelationData>>(&output)?.unwrap_or_default())
    }
}

impl<'a> HookTools for JujuHookTools<'a> {
    fn config(&self) -> Result<CharmOptions, CharmError> {
        let output = self.runner.get_output("config-get", &args(&["--format=json"]))?;
        Ok(from_slice(&output)?)
    }

    fn relations(&self, endpoints: &[String]) -> Result<Vec<Relation>, CharmError> {
        let mut relations = vec![];

        for endpoint in endpoints {
            for id in self.relation_ids(endpoint)? {
                let mut data = BTreeMap::new();
                for unit in self.relation_units(&id)? {
                    for (key, value) in self.relation_get(&id, &unit)? {
                        data.entry(key).or_insert(value);
                    }
                }

                debug!("Relation {} has {} settings", id, data.len());
                relations.push(Relation::new(endpoint.as_str(), id, data));
            }
        }

        Ok(relations)
    }

    fn relation_set(
        &self,
        relation_id: &str,
        settings: &[(&str, String)],
    ) -> Result<(), CharmError> {
        let mut arguments = args(&["-r", relation_id]);
        arguments.extend(settings.iter().map(|(k, v)| format!("{}={}", k, v)));

        self.runner.run("relation-set", &arguments)
    }

    fn status_set(&self, status: &WorkloadStatus) -> Result<(), CharmError> {
        info!("Setting status to {}: {}", status.state, status.message);
        self.runner.run(
            "status-set",
            &[status.state.to_string(), status.message.clone()],
        )
    }

    fn action_fail(&self, message: &str) -> Result<(), CharmError> {
        self.runner.run("action-fail", &args(&[message]))
    }

    fn private_address(&self) -> Result<String, CharmError> {
        let output = self.runner.get_output("unit-get", &args(&["private-address"]))?;
        Ok(String::from_utf8_lossy(&output).trim().to_string())
    }
}
