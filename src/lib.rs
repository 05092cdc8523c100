pub mod actions;
pub mod adapters;
pub mod charm;
pub mod charm_source;
pub mod cmd;
pub mod error;
pub mod handlers;
pub mod hookenv;
pub mod hsm;
pub mod options;
pub mod paths;
pub mod relation;
pub mod release;
pub mod status;
pub mod templating;
pub mod unitdata;
