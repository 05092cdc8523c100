//! Fakes of the charm's collaborators, shared by the integration tests
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use maplit::{btreemap, convert_args};

use barbican::charm::BarbicanCharm;
use barbican::cmd::{command_line, Runner};
use barbican::error::CharmError;
use barbican::hookenv::HookTools;
use barbican::options::{CharmOptions, ConfigurationAdapter};
use barbican::relation::Relation;
use barbican::release::{Host, Release};
use barbican::status::WorkloadStatus;

/// Records every command instead of running it
#[derive(Default)]
pub struct FakeRunner {
    pub calls: RefCell<Vec<(String, Vec<String>)>>,

    /// Commands that exit non-zero
    pub failing: BTreeSet<String>,

    /// Stdout handed back per command
    pub outputs: BTreeMap<String, Vec<u8>>,
}

impl FakeRunner {
    pub fn failing(cmd: &str) -> Self {
        let mut runner = Self::default();
        runner.failing.insert(cmd.to_string());
        runner
    }

    pub fn with_output(mut self, cmd: &str, output: &str) -> Self {
        self.outputs.insert(cmd.to_string(), output.as_bytes().to_vec());
        self
    }

    /// Calls as they would be typed, e.g. `systemctl restart apache2`
    pub fn command_lines(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|(cmd, args)| {
                let mut line = vec![cmd.clone()];
                line.extend(args.iter().cloned());
                line.join(" ")
            })
            .collect()
    }

    pub fn calls_to(&self, cmd: &str) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter(|(c, _)| c == cmd)
            .map(|(_, args)| args.clone())
            .collect()
    }

    fn record(&self, cmd: &str, args: &[String]) -> Result<(), CharmError> {
        self.calls
            .borrow_mut()
            .push((cmd.to_string(), args.to_vec()));

        if self.failing.contains(cmd) {
            Err(CharmError::SubcommandError(
                command_line(cmd, args),
                "exit status: 1".into(),
            ))
        } else {
            Ok(())
        }
    }
}

impl Runner for FakeRunner {
    fn run(&self, cmd: &str, args: &[String]) -> Result<(), CharmError> {
        self.record(cmd, args)
    }

    fn get_output(&self, cmd: &str, args: &[String]) -> Result<Vec<u8>, CharmError> {
        self.record(cmd, args)?;
        Ok(self.outputs.get(cmd).cloned().unwrap_or_default())
    }
}

/// A machine with a fixed set of installed packages
pub struct FakeHost {
    pub installed: RefCell<BTreeMap<String, String>>,
    pub series: String,
    pub queries: Cell<usize>,
}

impl FakeHost {
    pub fn new(series: &str) -> Self {
        Self {
            installed: RefCell::new(BTreeMap::new()),
            series: series.to_string(),
            queries: Cell::new(0),
        }
    }

    pub fn with_package(self, package: &str, version: &str) -> Self {
        self.install(package, version);
        self
    }

    pub fn install(&self, package: &str, version: &str) {
        self.installed
            .borrow_mut()
            .insert(package.to_string(), version.to_string());
    }
}

impl Host for FakeHost {
    fn installed_version(&self, package: &str) -> Result<Option<String>, CharmError> {
        self.queries.set(self.queries.get() + 1);
        Ok(self.installed.borrow().get(package).cloned())
    }

    fn series(&self) -> Result<String, CharmError> {
        Ok(self.series.clone())
    }
}

/// Unit agent that answers from memory and records what the charm tells it
pub struct FakeHookTools {
    pub options: CharmOptions,
    pub relations: Vec<Relation>,
    pub address: String,
    pub statuses: RefCell<Vec<WorkloadStatus>>,
    pub relation_sets: RefCell<Vec<(String, Vec<(String, String)>)>>,
    pub action_failures: RefCell<Vec<String>>,
}

impl FakeHookTools {
    pub fn new(options: CharmOptions, relations: Vec<Relation>) -> Self {
        Self {
            options,
            relations,
            address: "10.5.0.20".into(),
            statuses: RefCell::new(vec![]),
            relation_sets: RefCell::new(vec![]),
            action_failures: RefCell::new(vec![]),
        }
    }

    pub fn last_status(&self) -> Option<WorkloadStatus> {
        self.statuses.borrow().last().cloned()
    }

    /// Settings published on one relation, merged over every `relation-set` call
    pub fn published(&self, relation_id: &str) -> BTreeMap<String, String> {
        self.relation_sets
            .borrow()
            .iter()
            .filter(|(id, _)| id == relation_id)
            .flat_map(|(_, settings)| settings.clone())
            .collect()
    }
}

impl HookTools for FakeHookTools {
    fn config(&self) -> Result<CharmOptions, CharmError> {
        Ok(self.options.clone())
    }

    fn relations(&self, endpoints: &[String]) -> Result<Vec<Relation>, CharmError> {
        Ok(self
            .relations
            .iter()
            .filter(|r| endpoints.contains(&r.name))
            .cloned()
            .collect())
    }

    fn relation_set(
        &self,
        relation_id: &str,
        settings: &[(&str, String)],
    ) -> Result<(), CharmError> {
        self.relation_sets.borrow_mut().push((
            relation_id.to_string(),
            settings
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        ));
        Ok(())
    }

    fn status_set(&self, status: &WorkloadStatus) -> Result<(), CharmError> {
        self.statuses.borrow_mut().push(status.clone());
        Ok(())
    }

    fn action_fail(&self, message: &str) -> Result<(), CharmError> {
        self.action_failures.borrow_mut().push(message.to_string());
        Ok(())
    }

    fn private_address(&self) -> Result<String, CharmError> {
        Ok(self.address.clone())
    }
}

pub fn shared_db() -> Relation {
    Relation::new(
        "shared-db",
        "shared-db:4",
        convert_args!(btreemap!(
            "db_host" => "10.5.0.10",
            "password" => "dbsecret",
            "username" => "barbican",
            "database" => "barbican",
        )),
    )
}

pub fn amqp() -> Relation {
    Relation::new(
        "amqp",
        "amqp:5",
        convert_args!(btreemap!(
            "hostname" => "10.5.0.11",
            "password" => "rabbitsecret",
            "username" => "barbican",
            "vhost" => "openstack",
        )),
    )
}

pub fn identity_service() -> Relation {
    Relation::new(
        "identity-service",
        "identity-service:6",
        convert_args!(btreemap!(
            "service_host" => "10.5.0.12",
            "service_port" => "5000",
            "auth_host" => "10.5.0.12",
            "auth_port" => "35357",
            "service_tenant" => "services",
            "service_username" => "barbican",
            "service_password" => "kssecret",
        )),
    )
}

pub fn hsm() -> Relation {
    Relation::new(
        "hsm",
        "hsm:7",
        convert_args!(btreemap!(
            "plugin_data" => r#"{"library_path": "path1", "login": "1234", "slot_id": "slot1"}"#,
        )),
    )
}

/// The relations barbican needs before it can render anything
pub fn required_relations() -> Vec<Relation> {
    vec![shared_db(), amqp(), identity_service()]
}

pub fn config_adapter(options: &CharmOptions) -> ConfigurationAdapter {
    let charm = BarbicanCharm::for_release(Release::Train).unwrap();
    ConfigurationAdapter::new(options, &charm).unwrap()
}
