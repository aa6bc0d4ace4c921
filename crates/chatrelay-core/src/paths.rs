//! Filesystem locations used by the relay.

use std::path::PathBuf;

use thiserror::Error;

/// Directory name under the platform data directory.
const APP_DIR_NAME: &str = "chatrelay";

/// File name of the persisted config.
const CONFIG_FILE_NAME: &str = "config.json";

/// Errors resolving relay paths.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Could not determine the platform data directory")]
    NoDataDir,
}

/// Root directory for relay data (e.g. `~/.local/share/chatrelay`).
pub fn data_root() -> Result<PathBuf, PathError> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or(PathError::NoDataDir)
}

/// Default location of the persisted config file.
pub fn default_config_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_lives_under_data_root() {
        if let (Ok(root), Ok(path)) = (data_root(), default_config_path()) {
            assert!(path.starts_with(&root));
            assert!(path.ends_with("chatrelay/config.json"));
        }
    }
}
