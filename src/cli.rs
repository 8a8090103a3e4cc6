//! Clap adapter for the settings store.
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//! [`ConfigArgs`] and [`ConfigSubcommand`] embed into an application's own
//! `#[derive(Parser)]` to give it `config list|show|get|set` subcommands.
//!
//! The only bridge to the core is [`ConfigArgs::into_action()`], which
//! converts clap-parsed arguments into a [`ConfigAction`](crate::ConfigAction)
//! for [`ConfigStore::handle()`](crate::ConfigStore::handle). Other CLI
//! parsers can build [`ConfigAction`](crate::ConfigAction) values directly.

use clap::{Args, Subcommand};

use crate::types::ConfigAction;

/// Clap-derived args for the `config` subcommand group.
///
/// ```ignore
/// #[derive(Subcommand)]
/// enum Commands {
///     Config(ConfigArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigSubcommand>,
}

/// Available config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show every setting as dotted key-value pairs.
    List,
    /// Print the settings file as it would be saved.
    Show,
    /// Show the value and description of a setting.
    Get {
        /// Dotted key path (e.g. "sys.http_port").
        key: String,
    },
    /// Check a value, store it and save the settings file.
    Set {
        /// Dotted key path (e.g. "sys.http_port").
        key: String,
        /// Value to set.
        value: String,
    },
}

impl ConfigArgs {
    /// Bare `config` (no subcommand) and explicit `config list` both map to
    /// `ConfigAction::List`.
    pub fn into_action(self) -> ConfigAction {
        match self.action {
            None | Some(ConfigSubcommand::List) => ConfigAction::List,
            Some(ConfigSubcommand::Show) => ConfigAction::Show,
            Some(ConfigSubcommand::Get { key }) => ConfigAction::Get { key },
            Some(ConfigSubcommand::Set { key, value }) => ConfigAction::Set { key, value },
        }
    }
}
