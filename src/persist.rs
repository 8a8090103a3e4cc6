//! Settings file I/O: read the serialized text if present, write it back.
//! Creates parent directories as needed.

use std::path::Path;

use crate::error::ConfigError;

/// Read the settings file. A missing file is `Ok(None)`, not an error.
pub fn read_config_file(path: &Path) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Write `content` to `path`, creating parent directories if needed.
pub fn write_config_file(path: &Path, content: &str) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::write(path, content).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}
