//! A root settings tree bound to a file on disk.
//!
//! [`StoreSettings`] says where the file lives and what the root section is
//! called. It is an ordinary confique config struct, so the settings can come
//! from compiled defaults, a TOML snippet, or (only when asked for)
//! environment variables:
//!
//! ```ignore
//! let settings = StoreSettings::in_dir("/var/lib/myapp")?;
//! let mut store = ConfigStore::new(settings, rules);
//! store.load(|w| eprintln!("{w}"))?;
//! store.config_mut().set_path("sys.http_port", "8080")?;
//! store.save()?;
//! ```

use std::path::{Path, PathBuf};

use confique::Config;
use tracing::debug;

use crate::dict::ConfigDict;
use crate::engine::RuledContainer;
use crate::error::ConfigError;
use crate::ops::{self, ConfigResult};
use crate::persist;
use crate::rules::RuleSet;
use crate::types::ConfigAction;

#[derive(Config, Debug, Clone, PartialEq)]
pub struct StoreSettings {
    /// Directory holding the settings file. Defaults to the platform config
    /// directory for `app_name`.
    #[config(env = "RULED_CONFIG_HOME")]
    pub workdir: Option<PathBuf>,

    /// Application name used to find the platform config directory.
    #[config(default = "ruled-config")]
    pub app_name: String,

    /// Name of the settings file inside the working directory.
    #[config(default = "settings.cfg")]
    pub file_name: String,

    /// Name of the root section.
    #[config(default = "config")]
    pub root_name: String,
}

impl StoreSettings {
    /// Compiled defaults only.
    pub fn defaults() -> Result<Self, ConfigError> {
        Ok(Self::builder().load()?)
    }

    /// Defaults with an explicit working directory.
    pub fn in_dir(workdir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut settings = Self::defaults()?;
        settings.workdir = Some(workdir.into());
        Ok(settings)
    }

    /// Settings from a TOML snippet layered over the defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let layer: <Self as Config>::Layer =
            toml::from_str(text).map_err(|e| ConfigError::invalid_value("<settings>", text, e.to_string()))?;
        Ok(Self::builder().preloaded(layer).load()?)
    }

    /// Settings with `RULED_CONFIG_HOME` taken from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::builder().env().load()?)
    }

    /// A commented TOML template documenting every setting.
    pub fn template() -> String {
        confique::toml::template::<Self>(confique::toml::FormatOptions::default())
    }

    pub fn effective_workdir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.workdir {
            return Ok(dir.clone());
        }
        directories::ProjectDirs::from("", "", &self.app_name)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoWorkdir)
    }

    /// Full path of the settings file.
    pub fn conffile(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.effective_workdir()?.join(&self.file_name))
    }
}

/// Owns a root [`ConfigDict`] and loads/saves it.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    settings: StoreSettings,
    root: ConfigDict,
}

impl ConfigStore {
    pub fn new(settings: StoreSettings, rules: RuleSet) -> Self {
        let root = ConfigDict::new(settings.root_name.clone(), rules);
        ConfigStore { settings, root }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn config(&self) -> &ConfigDict {
        &self.root
    }

    pub fn config_mut(&mut self) -> &mut ConfigDict {
        &mut self.root
    }

    /// Reset the tree and load the settings file, if there is one.
    ///
    /// A missing file leaves the defaults in place. Problems inside the file
    /// are reported through `on_warning` and reflected in the returned flag;
    /// only I/O failures are errors.
    pub fn load(&mut self, on_warning: impl FnMut(&str)) -> Result<bool, ConfigError> {
        let path = self.settings.conffile()?;
        self.load_from(&path, on_warning)
    }

    /// Like [`load`](Self::load) for an explicit path. The tree is only
    /// reset once the file has been read, so an I/O error leaves it as it was.
    pub fn load_from(&mut self, path: &Path, on_warning: impl FnMut(&str)) -> Result<bool, ConfigError> {
        let content = persist::read_config_file(path)?;
        self.root.reset();
        debug!(path = %path.display(), found = content.is_some(), "loading settings");
        let source = path.display().to_string();
        Ok(self
            .root
            .parse_config(content.as_deref().unwrap_or_default(), &source, on_warning))
    }

    /// Write the tree to the settings file, returning its path.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = self.settings.conffile()?;
        persist::write_config_file(&path, &self.root.to_config_string())?;
        debug!(path = %path.display(), "saved settings");
        Ok(path)
    }

    /// Carry out a [`ConfigAction`]. `Set` saves immediately and undoes the
    /// change in memory if the save fails.
    pub fn handle(&mut self, action: &ConfigAction) -> Result<ConfigResult, ConfigError> {
        match action {
            ConfigAction::List => Ok(ops::list_values(&self.root)),
            ConfigAction::Show => Ok(ConfigResult::Text(self.root.to_config_string())),
            ConfigAction::Get { key } => ops::get_value(&self.root, key),
            ConfigAction::Set { key, value } => {
                let previous = self.root.clone();
                self.root.set_path(key, value.as_str())?;
                if let Err(e) = self.save() {
                    self.root = previous;
                    return Err(e);
                }
                let stored = self.root.get_path(key)?.to_string();
                Ok(ConfigResult::ValueSet {
                    key: key.clone(),
                    value: stored,
                })
            }
        }
    }
}
