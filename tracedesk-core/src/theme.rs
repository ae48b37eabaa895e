//! Display theme preference
//!
//! Persisted as `"light"` / `"dark"` alongside the session in the local state
//! file and re-applied on the next start.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::storage::StateStorage;

/// Light or dark presentation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl Theme {
    /// Parse a theme name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    /// The other theme
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }
}

/// Read the persisted preference, falling back to light
pub fn load_theme(storage: &StateStorage) -> Result<Theme> {
    Ok(storage.load()?.theme.unwrap_or_default())
}

/// Persist an explicit preference
pub fn apply_theme(storage: &StateStorage, theme: Theme) -> Result<Theme> {
    storage.update(|state| state.theme = Some(theme))?;
    log::debug!("Theme set to {}", theme);
    Ok(theme)
}

/// Flip the persisted preference and return the new one
pub fn toggle_theme(storage: &StateStorage) -> Result<Theme> {
    let next = load_theme(storage)?.toggled();
    apply_theme(storage, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_light() {
        let dir = TempDir::new().unwrap();
        let storage = StateStorage::new(dir.path().join("state.yaml"));
        assert_eq!(load_theme(&storage).unwrap(), Theme::Light);
    }

    #[test]
    fn test_toggle_persists() {
        let dir = TempDir::new().unwrap();
        let storage = StateStorage::new(dir.path().join("state.yaml"));

        assert_eq!(toggle_theme(&storage).unwrap(), Theme::Dark);
        assert_eq!(load_theme(&storage).unwrap(), Theme::Dark);
        assert_eq!(toggle_theme(&storage).unwrap(), Theme::Light);
        assert_eq!(load_theme(&storage).unwrap(), Theme::Light);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Theme::parse("Dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse(" light "), Some(Theme::Light));
        assert_eq!(Theme::parse("sepia"), None);
    }

    #[test]
    fn test_serialized_form() {
        let yaml = serde_yaml::to_string(&Theme::Dark).unwrap();
        assert_eq!(yaml.trim(), "dark");
    }
}
