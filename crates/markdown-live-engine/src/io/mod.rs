use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What survives between sessions: the document as markup plus the last caret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub markup: String,
    pub caret: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid session state in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize session state: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Read saved session state. A missing file is not an error.
pub fn load_state(path: &Path) -> Result<Option<SessionState>, IoError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let state = toml::from_str(&content).map_err(|source| IoError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(state))
}

/// Write session state, creating parent directories as needed
pub fn save_state(path: &Path, state: &SessionState) -> Result<(), IoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string(state)?;
    fs::write(path, content)?;
    log::debug!("saved session state to {}", path.display());
    Ok(())
}
