//! Entry point the unit agent runs for every hook and action of the barbican charm
//!
//! Hooks and actions are symlinks to this binary, so the event is normally taken from the name
//! it was invoked as. It can also be named explicitly, e.g. `barbican-hook hook config-changed`.

use std::env;
use std::path::{Path, PathBuf};

use env_logger::{Env, Target, WriteStyle};
use failure::Error;
use log::{info, LevelFilter};
use structopt::StructOpt;

use barbican::actions::{run_action, Action};
use barbican::charm_source::CharmSource;
use barbican::cmd::SystemRunner;
use barbican::error::CharmError;
use barbican::handlers::{dispatch, is_known_hook, HookContext};
use barbican::hookenv::{HookTools, JujuHookTools};
use barbican::paths;
use barbican::release::SystemHost;
use barbican::unitdata::UnitState;

/// Environment variable that sets the log filter, e.g. `BARBICAN_LOG=debug`
const LOG_LEVEL_ENV_VAR: &str = "BARBICAN_LOG";

#[derive(StructOpt, Debug)]
enum Event {
    /// Runs the handlers for a hook
    #[structopt(name = "hook")]
    Hook { name: String },

    /// Runs an action
    #[structopt(name = "action")]
    Action { name: String },
}

#[derive(StructOpt, Debug)]
#[structopt(name = "barbican-hook")]
struct Opts {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    #[structopt(help = "Log more. May be repeated")]
    verbose: u8,

    #[structopt(subcommand)]
    event: Option<Event>,
}

/// Work out the event from the name the binary was run as
fn invoked_event() -> Event {
    let name = env::args()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
        })
        .unwrap_or_default();

    match name.parse::<Action>() {
        Ok(_) => Event::Action { name },
        Err(_) => Event::Hook { name },
    }
}

fn setup_logging(verbose: u8) {
    let default_level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_env(
        Env::default().filter_or(LOG_LEVEL_ENV_VAR, default_level.to_string()),
    )
    .format_module_path(false)
    .target(Target::Stderr)
    .write_style(WriteStyle::Never)
    .init()
}

fn main() -> Result<(), Error> {
    let opts = Opts::from_args();
    setup_logging(opts.verbose);

    let event = opts.event.unwrap_or_else(invoked_event);

    let source = CharmSource::load(paths::charm_dir())?;
    let endpoints = source.metadata.endpoints();

    let runner = SystemRunner;
    let tools = JujuHookTools::new(&runner);
    let host = SystemHost::new(&runner);
    let mut store = UnitState::load(paths::unit_state_file())?;

    match event {
        Event::Hook { name } => {
            if !is_known_hook(&name, &endpoints) {
                return Err(CharmError::UnknownEvent(name).into());
            }

            info!("Running hook {}", name);
            let mut ctx = HookContext::load(
                &name,
                &endpoints,
                &mut store,
                &runner,
                &host,
                &tools,
                source.templates_dir(),
                PathBuf::from("/"),
            )?;
            let ran = dispatch(&mut ctx)?;
            info!("Ran handlers: {}", ran.join(", "));
        }
        Event::Action { name } => {
            info!("Running action {}", name);
            let action: Action = name.parse()?;
            let options = tools.config()?;
            let relations = tools.relations(&endpoints)?;
            run_action(action, &options, &relations, &runner, &tools)?;
        }
    }

    Ok(())
}
