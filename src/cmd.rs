use std::process::Command;

use log::trace;

use crate::error::CharmError;

/// Runs external programs on behalf of handlers
///
/// Every subprocess the charm starts goes through this trait, so that hooks can be exercised
/// without touching the host.
pub trait Runner {
    /// Run a command to completion, failing on a non-zero exit status
    fn run(&self, cmd: &str, args: &[String]) -> Result<(), CharmError>;

    /// Run a command to completion and return its stdout
    fn get_output(&self, cmd: &str, args: &[String]) -> Result<Vec<u8>, CharmError>;
}

/// Runs commands on the local machine, blocking until they exit
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, cmd: &str, args: &[String]) -> Result<(), CharmError> {
        trace!("Running {}", command_line(cmd, args));
        let status = Command::new(cmd)
            .args(args)
            .spawn()
            .map_err(|err| CharmError::SubcommandError(cmd.to_string(), err.to_string()))?
            .wait()
            .map_err(|err| CharmError::SubcommandError(cmd.to_string(), err.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(CharmError::SubcommandError(
                command_line(cmd, args),
                status.to_string(),
            ))
        }
    }

    fn get_output(&self, cmd: &str, args: &[String]) -> Result<Vec<u8>, CharmError> {
        trace!("Running {}", command_line(cmd, args));
        let output = Command::new(cmd)
            .args(args)
            .output()
            .map_err(|err| CharmError::SubcommandError(cmd.to_string(), err.to_string()))?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(CharmError::SubcommandError(
                command_line(cmd, args),
                String::from_utf8_lossy(&output.stderr).to_string(),
            ))
        }
    }
}

/// Formats a command the way it would be typed, for error messages
pub fn command_line(cmd: &str, args: &[String]) -> String {
    format!("`{} {}`", cmd, args.join(" "))
}

/// Turns a list of string literals into owned arguments
pub fn args<S: AsRef<str>>(items: &[S]) -> Vec<String> {
    items.iter().map(|a| a.as_ref().to_string()).collect()
}
