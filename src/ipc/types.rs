use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Nothing but the selected workspace lives between requests: every handler
/// reloads the config and the table from disk, mutates, and writes back.
pub struct AppState {
    pub workspace: Option<PathBuf>,
}
