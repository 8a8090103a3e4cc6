//! Schema-driven, self-validating hierarchical settings.
//!
//! A [`RuleSet`] declares, for every key, a description, a checker and a
//! default. A [`ConfigDict`] built from it only accepts declared keys, checks
//! and coerces every write, and serializes itself to a sectioned text format
//! that reads back into the same tree.
//!
//! ```ignore
//! let rules = RuleSet::from_json_str(r#"{
//!     "sys":  ["Technical settings", false, {
//!         "http_port": ["Listening port", "int", 33411]
//!     }],
//!     "tags": ["Tags", {"name": ["Tag name", "slug", ""]}, []]
//! }"#)?;
//!
//! let mut config = ConfigDict::new("config", rules);
//! config.set_path("sys.http_port", "8080")?;
//! config.list_mut("tags")?.append(json!({"name": "inbox"}))?;
//!
//! let text = config.to_config_string();
//! let mut copy = ConfigDict::new("config", config.rules().clone());
//! assert!(copy.parse_config(&text, "memory", |w| eprintln!("{w}")));
//! ```
//!
//! # Rules as source of truth
//!
//! Each rule's checker decides what a write may store:
//!
//! - **a type tag** (`int`, `bool`, `hostname`, `path`, ...) coerces the raw
//!   value through [`Check`]; a failure is an [`InvalidValue`] naming the
//!   full slash path of the slot.
//! - **a value set** accepts only its members.
//! - **a nested rule set** turns a raw map into a checked [`ConfigDict`].
//! - **`true`** stores anything verbatim; **`false`** refuses every write.
//!
//! The default decides what exists before any write: a scalar default is
//! returned by `get` while the key is unset, and a section, `{}` (map) or
//! `[]` (list) default creates the child container up front. Those
//! containers are never replaced wholesale, only changed through their own
//! checked operations.
//!
//! A rule registered under [`WILDCARD`] (`_any`) governs every key not
//! listed explicitly. Lists always use it for their elements.
//!
//! # Containers
//!
//! [`ConfigDict`] and [`ConfigList`] share the [`RuledContainer`] trait,
//! which layers rule resolution, defaults and serialization over each
//! container's storage. Lists are addressed by base-36 position (`0`..`9`,
//! `a`..`z`, `10`, ...), and those addresses are also the section names of
//! their elements.
//!
//! Keys are never deleted from a dictionary; [`ConfigDict::reset`] clears
//! everything and rebuilds the declared containers.
//!
//! # Text format
//!
//! ```text
//! [config/sys: Technical settings]
//! http_port = 8080         ; Listening port
//!
//! [config/tags/0]
//! name = inbox             ; Tag name
//! ```
//!
//! Values are percent-escaped (see [`codec::escape`]), and so are keys and
//! section path segments (see [`codec::escape_key`]). Unset keys with a
//! default are written commented out so the file documents them. Loading is
//! tolerant: unknown sections and rejected values are reported through a
//! callback and logged with `tracing`, and loading carries on.
//!
//! # Store and CLI
//!
//! [`ConfigStore`] binds a root tree to a file chosen by [`StoreSettings`]
//! and handles framework-agnostic [`ConfigAction`]s. With the `clap` feature
//! (on by default), [`ConfigArgs`] adds `config list|show|get|set`
//! subcommands to an application.
//!
//! # Error handling
//!
//! All fallible operations return [`ConfigError`]. Enable the `rich-errors`
//! feature for `miette` diagnostics.
//!
//! [`InvalidValue`]: ConfigError::InvalidValue

pub mod b36;
pub mod check;
pub mod codec;
pub mod error;
pub mod types;

#[cfg(feature = "clap")]
mod cli;
mod dict;
mod engine;
mod list;
mod loader;
mod ops;
mod persist;
mod rules;
mod store;
mod value;

#[cfg(test)]
mod fixtures;

pub use check::Check;
#[cfg(feature = "clap")]
pub use cli::{ConfigArgs, ConfigSubcommand};
pub use dict::ConfigDict;
pub use engine::{Header, RuledContainer};
pub use error::ConfigError;
pub use list::{ConfigList, Keys};
pub use ops::ConfigResult;
pub use rules::{Checker, Rule, RuleDefault, RuleSet, WILDCARD};
pub use store::{ConfigStore, StoreSettings};
pub use types::ConfigAction;
pub use value::Value;
