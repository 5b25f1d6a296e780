use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// University-wide settings document, persisted as pretty-printed JSON.
/// `max_students` is informational only and never enforced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UniversityConfig {
    pub university_name: String,
    pub max_students: i64,
    pub min_age: i64,
    pub max_age: i64,
    pub specialties: Vec<String>,
    pub version: String,
}

impl Default for UniversityConfig {
    fn default() -> Self {
        UniversityConfig {
            university_name: "Université Azure".to_string(),
            max_students: 1000,
            min_age: 16,
            max_age: 70,
            specialties: [
                "Informatique",
                "Mathématiques",
                "Physique",
                "Chimie",
                "Biologie",
                "Économie",
                "Droit",
                "Médecine",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            version: "1.0.0".to_string(),
        }
    }
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(workspace: &Path) -> Self {
        ConfigStore {
            path: workspace.join("config").join("config.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the configuration. A file that exists but does not parse falls
    /// back to the embedded defaults and is left untouched on disk; an absent
    /// file gets the defaults written out (best-effort) before returning
    /// them. No partial merge with defaults.
    pub fn load(&self) -> UniversityConfig {
        if self.path.exists() {
            std::fs::read_to_string(&self.path)
                .ok()
                .and_then(|text| serde_json::from_str(&text).ok())
                .unwrap_or_default()
        } else {
            let defaults = UniversityConfig::default();
            let _ = self.save(&defaults);
            defaults
        }
    }

    /// Whole-file overwrite with the full document, pretty-printed.
    pub fn save(&self, config: &UniversityConfig) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(config)?)?;
        Ok(())
    }
}
