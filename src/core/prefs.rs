use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const APP_DIR: &str = "hoist";
const PREFS_FILE: &str = "config.toml";

/// Saved defaults from the platform config directory, e.g.
/// `~/.config/hoist/config.toml` on Linux. Every field is optional so an
/// empty or missing file is a valid one. There is no field for the access
/// token itself, so a token can never be written out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    pub last_folder: Option<PathBuf>,
    pub last_repository: Option<String>,
    pub default_branch: Option<String>,
    pub default_remote: Option<String>,
    pub default_message: Option<String>,
    pub public_by_default: bool,
    /// Name of the environment variable that holds the access token.
    pub token_env: Option<String>,
}

impl Prefs {
    /// Where the preferences file lives, platform dependent.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(PREFS_FILE))
    }

    /// Load saved preferences. A missing or unreadable file means defaults;
    /// preferences are never a reason to refuse to run.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    fn load_from(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&content) {
            Ok(prefs) => prefs,
            Err(err) => {
                warn!(
                    "ignoring unparseable preferences at {}: {}",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::path().context("No configuration directory on this platform")?;
        self.save_to(&path)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!(
                    "Failed to create preferences directory: {}",
                    parent.display()
                )
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize preferences")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write preferences: {}", path.display()))?;
        debug!("preferences saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let prefs = Prefs::load_from(&dir.path().join("nope.toml"));
        assert_eq!(prefs, Prefs::default());
        assert!(!prefs.public_by_default);
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("deep").join("config.toml");

        let prefs = Prefs {
            last_folder: Some(PathBuf::from("/tmp/demo")),
            last_repository: Some("demo".to_string()),
            default_branch: Some("trunk".to_string()),
            default_remote: None,
            default_message: Some("First import".to_string()),
            public_by_default: true,
            token_env: Some("MY_TOKEN".to_string()),
        };
        prefs.save_to(&path).unwrap();

        let loaded = Prefs::load_from(&path);
        assert_eq!(loaded, prefs);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not [valid toml").unwrap();

        let prefs = Prefs::load_from(&path);
        assert_eq!(prefs, Prefs::default());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "last_repository = \"demo\"\n").unwrap();

        let prefs = Prefs::load_from(&path);
        assert_eq!(prefs.last_repository.as_deref(), Some("demo"));
        assert!(prefs.last_folder.is_none());
        assert!(!prefs.public_by_default);
    }

    #[test]
    fn test_token_values_have_nowhere_to_land() {
        // An old or hand-edited file carrying a secret must not survive a
        // load/save cycle: there is no field for it.
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "token = \"ghp_supersecret\"\nlast_repository = \"demo\"\n",
        )
        .unwrap();

        let prefs = Prefs::load_from(&path);
        assert_eq!(prefs.last_repository.as_deref(), Some("demo"));

        prefs.save_to(&path).unwrap();
        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(!rewritten.contains("supersecret"));
    }
}
