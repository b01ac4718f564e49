// src/config/mod.rs

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::flatten::{PlaceholderRule, PLACEHOLDER_PREFIX};
use crate::record::ExtractOptions;

/// Settings file picked up from the working directory when no `--config`
/// is given.
pub const DEFAULT_SETTINGS_FILE: &str = "stattables.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Folder scanned for pages when no inputs are given.
    pub html_dir: PathBuf,
    /// Root of the CSV export tree.
    pub out_dir: PathBuf,
    pub placeholder_prefixes: Vec<String>,
    pub strict_utf8: bool,
    pub parallel: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            html_dir: PathBuf::from("HTML"),
            out_dir: PathBuf::from("out"),
            placeholder_prefixes: vec![PLACEHOLDER_PREFIX.to_string()],
            strict_utf8: false,
            parallel: false,
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserialises to unit, not to a map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// `explicit` if given, else [`DEFAULT_SETTINGS_FILE`] if it exists in
    /// `cwd`, else defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => {
                info!(path = %path.display(), "loading settings");
                Self::from_file(path)
            }
            None => {
                let candidate = cwd.join(DEFAULT_SETTINGS_FILE);
                if candidate.is_file() {
                    info!(path = %candidate.display(), "loading settings");
                    Self::from_file(&candidate)
                } else {
                    debug!("no settings file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            placeholder: PlaceholderRule::new(self.placeholder_prefixes.iter().cloned()),
            strict_utf8: self.strict_utf8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let s = Settings::from_yaml("out_dir: exports\nparallel: true\n")?;
        assert_eq!(s.out_dir, PathBuf::from("exports"));
        assert!(s.parallel);
        assert_eq!(s.html_dir, PathBuf::from("HTML"));
        assert_eq!(s.placeholder_prefixes, vec!["Unnamed"]);
        Ok(())
    }

    #[test]
    fn empty_yaml_is_default() -> Result<()> {
        assert_eq!(Settings::from_yaml("  \n")?, Settings::default());
        Ok(())
    }

    #[test]
    fn unknown_key_is_rejected() {
        assert!(Settings::from_yaml("htmldir: x\n").is_err());
    }

    #[test]
    fn load_prefers_explicit_then_cwd_file() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(Settings::load(None, dir.path())?, Settings::default());

        fs::write(dir.path().join(DEFAULT_SETTINGS_FILE), "strict_utf8: true\n")?;
        assert!(Settings::load(None, dir.path())?.strict_utf8);

        let other = dir.path().join("other.yaml");
        fs::write(&other, "placeholder_prefixes: [Level]\n")?;
        let s = Settings::load(Some(other.as_path()), dir.path())?;
        assert!(!s.strict_utf8);
        assert!(s.extract_options().placeholder.is_placeholder("Level 0"));

        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            Settings::load(Some(missing.as_path()), dir.path()),
            Err(ConfigError::Read { .. })
        ));
        Ok(())
    }
}
