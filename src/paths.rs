//! Presents functions related to locating charm and barbican files

use std::env;
use std::path::PathBuf;

pub const BARBICAN_CONF: &str = "/etc/barbican/barbican.conf";
pub const BARBICAN_API_PASTE_CONF: &str = "/etc/barbican/barbican-api-paste.ini";
pub const BARBICAN_WSGI_CONF: &str = "/etc/apache2/conf-available/barbican-api.conf";

/// Get a path from an env var, falling back to a fixed location
fn path_from_env(env_var: &str, fallback: PathBuf) -> PathBuf {
    env::var(env_var).map(PathBuf::from).unwrap_or(fallback)
}

/// The root of the deployed charm, as handed to us by the unit agent
pub fn charm_dir() -> PathBuf {
    path_from_env(
        "CHARM_DIR",
        env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    )
}

/// The file backing the unit's persistent key-value store
pub fn unit_state_file() -> PathBuf {
    path_from_env("BARBICAN_UNIT_STATE", charm_dir().join(".unit-state.yaml"))
}
