//! Reacting to the event the unit agent invoked the charm for
//!
//! Each hook recomputes a set of flags from the unit's state (relations, configuration, the
//! persistent store) and runs every handler whose flags match, in declaration order. Flags are
//! recomputed before each handler, so a handler sees what earlier ones changed.

use std::collections::BTreeSet;
use std::path::PathBuf;

use log::{debug, info, warn};
use serde_json::to_string;

use crate::adapters::{build_adapter_view, AdapterRegistry};
use crate::charm::{BarbicanCharm, EndpointType};
use crate::cmd::{args, Runner};
use crate::error::CharmError;
use crate::hookenv::HookTools;
use crate::options::{CharmOptions, ConfigurationAdapter};
use crate::relation::{named, relation_flags, Relation};
use crate::release::{reset_release, select_release, Host};
use crate::status::{assess_status, WorkloadState, WorkloadStatus};
use crate::templating::{render_and_restart, rooted, TemplateLoader};
use crate::unitdata::KeyValueStore;

pub const INSTALLED_FLAG: &str = "charm.installed";
pub const CONFIG_CHANGED_FLAG: &str = "config.changed";

/// Store key holding the configuration seen by the last hook
pub const CONFIG_SNAPSHOT_KEY: &str = "barbican-charm.config";

const UNIT_HOOKS: &[&str] = &[
    "install",
    "config-changed",
    "start",
    "stop",
    "remove",
    "update-status",
    "upgrade-charm",
    "leader-elected",
    "leader-settings-changed",
    "pre-series-upgrade",
    "post-series-upgrade",
];

const RELATION_HOOK_SUFFIXES: &[&str] = &["created", "joined", "changed", "departed", "broken"];

/// Whether the unit agent could invoke a hook called `name` on a charm with these endpoints
pub fn is_known_hook(name: &str, endpoints: &[String]) -> bool {
    UNIT_HOOKS.contains(&name)
        || endpoints.iter().any(|endpoint| {
            RELATION_HOOK_SUFFIXES
                .iter()
                .any(|suffix| name == format!("{}-relation-{}", endpoint, suffix))
        })
}

/// Relations that are only rendered once everything they carry has arrived
const RENDER_WHEN_AVAILABLE: &[&str] = &["shared-db", "amqp", "identity-service", "hsm"];

/// Everything a handler may read or act upon during one hook
pub struct HookContext<'a> {
    pub hook: String,
    pub charm: BarbicanCharm,
    pub options: CharmOptions,
    pub relations: Vec<Relation>,
    pub store: &'a mut dyn KeyValueStore,
    pub runner: &'a dyn Runner,
    pub host: &'a dyn Host,
    pub tools: &'a dyn HookTools,

    /// Directory holding the charm's templates
    pub templates: PathBuf,

    /// Rendered files are written relative to this directory, normally `/`
    pub root: PathBuf,
}

impl<'a> HookContext<'a> {
    /// Gather configuration, release and relations for the running hook
    #[allow(clippy::too_many_arguments)]
    pub fn load(
        hook: &str,
        endpoints: &[String],
        store: &'a mut dyn KeyValueStore,
        runner: &'a dyn Runner,
        host: &'a dyn Host,
        tools: &'a dyn HookTools,
        templates: PathBuf,
        root: PathBuf,
    ) -> Result<Self, CharmError> {
        let options = tools.config()?;
        let release = select_release(store, host, &options.openstack_origin)?;
        let charm = BarbicanCharm::for_release(release)?;
        let relations = tools.relations(endpoints)?;

        Ok(Self {
            hook: hook.to_string(),
            charm,
            options,
            relations,
            store,
            runner,
            host,
            tools,
            templates,
            root,
        })
    }

    fn config_snapshot(&self) -> Result<String, CharmError> {
        Ok(to_string(&self.options)?)
    }
}

/// Flags describing the unit's current state
pub fn flags(ctx: &HookContext) -> Result<BTreeSet<String>, CharmError> {
    let mut flags = relation_flags(&ctx.relations);

    if ctx.store.get(INSTALLED_FLAG).is_some() {
        flags.insert(INSTALLED_FLAG.to_string());
    }

    if ctx.store.get(CONFIG_SNAPSHOT_KEY) != Some(ctx.config_snapshot()?) {
        flags.insert(CONFIG_CHANGED_FLAG.to_string());
    }

    flags.insert(format!("hook.{}", ctx.hook));

    Ok(flags)
}

pub type HandlerFn = fn(&mut HookContext) -> Result<(), CharmError>;

pub struct Handler {
    pub name: &'static str,

    /// Runs only if every one of these flags is set
    pub when: &'static [&'static str],

    /// Runs only if none of these flags is set
    pub when_not: &'static [&'static str],

    pub run: HandlerFn,
}

impl Handler {
    pub fn matches(&self, flags: &BTreeSet<String>) -> bool {
        self.when.iter().all(|f| flags.contains(*f))
            && !self.when_not.iter().any(|f| flags.contains(*f))
    }
}

pub const HANDLERS: &[Handler] = &[
    Handler {
        name: "install_packages",
        when: &[],
        when_not: &[INSTALLED_FLAG],
        run: install_packages,
    },
    Handler {
        name: "setup_amqp_req",
        when: &["amqp.connected"],
        when_not: &[],
        run: setup_amqp_req,
    },
    Handler {
        name: "setup_database",
        when: &["shared-db.connected"],
        when_not: &[],
        run: setup_database,
    },
    Handler {
        name: "setup_endpoint",
        when: &["identity-service.connected"],
        when_not: &[],
        run: setup_endpoint,
    },
    Handler {
        name: "render_stuff",
        when: &[
            "shared-db.available",
            "identity-service.available",
            "amqp.available",
        ],
        when_not: &[],
        run: render_stuff,
    },
    Handler {
        name: "config_changed",
        when: &[CONFIG_CHANGED_FLAG],
        when_not: &[],
        run: config_changed,
    },
    Handler {
        name: "upgrade_charm",
        when: &["hook.upgrade-charm"],
        when_not: &[],
        run: upgrade_charm,
    },
];

/// Packages from `packages` that aren't installed yet
fn missing_packages(host: &dyn Host, packages: &[String]) -> Result<Vec<String>, CharmError> {
    let mut missing = vec![];
    for package in packages {
        if host.installed_version(package)?.is_none() {
            missing.push(package.clone());
        }
    }
    Ok(missing)
}

fn install_packages(ctx: &mut HookContext) -> Result<(), CharmError> {
    ctx.tools.status_set(&WorkloadStatus::new(
        WorkloadState::Maintenance,
        "Installing packages",
    ))?;

    let install = missing_packages(ctx.host, &ctx.charm.packages)?;
    if !install.is_empty() {
        info!("Installing {}", install.join(", "));
        let mut arguments = args(&[
            "install",
            "--yes",
            "--option=Dpkg::Options::=--force-confold",
        ]);
        arguments.extend(install);
        ctx.runner.run("apt-get", &arguments)?;
    }

    let mut purge = vec![];
    for package in &ctx.charm.purge_packages {
        if ctx.host.installed_version(package)?.is_some() {
            purge.push(package.clone());
        }
    }
    if !purge.is_empty() {
        info!("Purging {}", purge.join(", "));
        let mut arguments = args(&["purge", "--yes"]);
        arguments.extend(purge);
        ctx.runner.run("apt-get", &arguments)?;
    }

    ctx.store.set(INSTALLED_FLAG, "true")
}

fn setup_amqp_req(ctx: &mut HookContext) -> Result<(), CharmError> {
    for relation in named(&ctx.relations, "amqp") {
        debug!("Requesting amqp access on {}", relation.id);
        ctx.tools.relation_set(
            &relation.id,
            &[
                ("username", ctx.options.rabbit_user.clone()),
                ("vhost", ctx.options.rabbit_vhost.clone()),
            ],
        )?;
    }
    Ok(())
}

fn setup_database(ctx: &mut HookContext) -> Result<(), CharmError> {
    let address = ctx.tools.private_address()?;

    for relation in named(&ctx.relations, "shared-db") {
        debug!("Requesting database on {}", relation.id);
        ctx.tools.relation_set(
            &relation.id,
            &[
                ("database", ctx.options.database.clone()),
                ("username", ctx.options.database_user.clone()),
                ("hostname", address.clone()),
            ],
        )?;
    }
    Ok(())
}

fn setup_endpoint(ctx: &mut HookContext) -> Result<(), CharmError> {
    let address = ctx.tools.private_address()?;
    let url = |endpoint_type| {
        ctx.charm
            .endpoint_url(&address, endpoint_type)
            .unwrap_or_default()
    };
    let settings = [
        ("service", ctx.charm.service_type.clone()),
        ("region", ctx.options.region.clone()),
        ("public_url", url(EndpointType::Public)),
        ("internal_url", url(EndpointType::Internal)),
        ("admin_url", url(EndpointType::Admin)),
    ];

    for relation in named(&ctx.relations, "identity-service") {
        debug!("Registering endpoints on {}", relation.id);
        ctx.tools.relation_set(&relation.id, &settings)?;
    }
    Ok(())
}

/// Relations the configuration is rendered from
///
/// The interfaces barbican can't run without, and the optional HSM, are only used once
/// available. Anything else is used as soon as it has data.
fn rendered_relations(relations: &[Relation]) -> Vec<Relation> {
    relations
        .iter()
        .filter(|r| {
            if RENDER_WHEN_AVAILABLE.contains(&r.name.as_str()) {
                r.is_available()
            } else {
                r.is_connected()
            }
        })
        .cloned()
        .collect()
}

fn render_stuff(ctx: &mut HookContext) -> Result<(), CharmError> {
    let config = match ConfigurationAdapter::new(&ctx.options, &ctx.charm) {
        Ok(config) => config,
        Err(err) => {
            warn!("Not rendering configuration: {}", err);
            return Ok(());
        }
    };

    let registry = AdapterRegistry::barbican()?;
    let view = build_adapter_view(&registry, &rendered_relations(&ctx.relations), &config);

    let loader = TemplateLoader::new(&ctx.templates, ctx.charm.release);
    let restart_map = rooted(&ctx.charm.restart_map, &ctx.root);
    let restarted = render_and_restart(&loader, &view, &restart_map, ctx.runner)?;

    if restarted.is_empty() {
        debug!("Configuration unchanged");
    }
    Ok(())
}

fn config_changed(ctx: &mut HookContext) -> Result<(), CharmError> {
    info!("Configuration changed");
    let snapshot = ctx.config_snapshot()?;
    ctx.store.set(CONFIG_SNAPSHOT_KEY, &snapshot)
}

fn upgrade_charm(ctx: &mut HookContext) -> Result<(), CharmError> {
    info!("Charm upgraded, release will be detected again");
    reset_release(ctx.store)
}

/// Run every matching handler, then report the workload status
///
/// Returns the names of the handlers that ran. The first failing handler aborts the hook.
pub fn dispatch(ctx: &mut HookContext) -> Result<Vec<&'static str>, CharmError> {
    let mut ran = vec![];

    for handler in HANDLERS {
        if !handler.matches(&flags(ctx)?) {
            continue;
        }

        debug!("Running handler {}", handler.name);
        (handler.run)(ctx)?;
        ran.push(handler.name);
    }

    let status = assess_status(&ctx.charm, &ctx.options, &ctx.relations);
    ctx.tools.status_set(&status)?;

    Ok(ran)
}
