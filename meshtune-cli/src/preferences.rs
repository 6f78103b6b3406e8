use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

/// The persisted preference file; only the theme lives here
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
}

impl Preferences {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read preferences at {}", path.display()))?;
            let preferences: Self = toml::from_str(&contents)
                .with_context(|| format!("failed to parse preferences at {}", path.display()))?;
            Ok(preferences)
        } else {
            Ok(Self::default())
        }
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("preferences path has no parent: {}", path.display()))?;
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to prepare directory {}", dir.display()))?;
        let serialized =
            toml::to_string_pretty(self).context("failed to serialize preferences to TOML")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write preferences to {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_light_theme() {
        let dir = tempfile::tempdir().unwrap();
        let preferences = Preferences::load_or_default(&dir.path().join("preferences.toml")).unwrap();
        assert_eq!(preferences.theme, Theme::Light);
    }

    #[test]
    fn persist_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.toml");
        let preferences = Preferences { theme: Theme::Dark };

        preferences.persist(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "theme = \"dark\"");
        assert_eq!(Preferences::load_or_default(&path).unwrap(), preferences);
    }

    #[test]
    fn unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        fs::write(&path, "theme = \"sepia\"").unwrap();
        assert!(Preferences::load_or_default(&path).is_err());
    }

    #[test]
    fn toggle_flips() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
    }
}
