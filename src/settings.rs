//! Persisted dashboard preferences and the style variables they imply.
//!
//! Styling is a pure function of [`DashboardSettings`]; the presentation
//! layer calls [`style_variables`] on mount and whenever settings change.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSettings {
    pub notifications: bool,
    pub email_alerts: bool,
    pub dark_mode: bool,
    pub auto_refresh: bool,
    /// Seconds between dashboard refreshes.
    pub refresh_interval: u32,
    pub language: String,
    /// Days of history to keep, as shown in the settings form.
    pub data_retention: String,
    pub prediction_threshold: f64,
    pub show_confidence_scores: bool,
    pub enable_what_if: bool,
    pub compact_view: bool,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            notifications: true,
            email_alerts: true,
            dark_mode: true,
            auto_refresh: true,
            refresh_interval: 30,
            language: "en".to_string(),
            data_retention: "90".to_string(),
            prediction_threshold: 0.75,
            show_confidence_scores: true,
            enable_what_if: true,
            compact_view: false,
        }
    }
}

impl DashboardSettings {
    /// Missing keys take their defaults; an unreadable document yields the
    /// defaults outright.
    pub fn from_json(document: &str) -> Self {
        serde_json::from_str(document).unwrap_or_else(|err| {
            warn!(error = %err, "stored settings unreadable; using defaults");
            Self::default()
        })
    }

    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(document) => Self::from_json(&document),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn clear(path: &Path) -> Result<(), SettingsError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleVariables {
    pub dark_class: bool,
    pub properties: BTreeMap<&'static str, &'static str>,
}

const DARK_PALETTE: [(&str, &str); 15] = [
    ("--background", "222 47% 6%"),
    ("--foreground", "210 40% 98%"),
    ("--card", "222 47% 8%"),
    ("--card-foreground", "210 40% 98%"),
    ("--popover", "222 47% 8%"),
    ("--popover-foreground", "210 40% 98%"),
    ("--secondary", "222 47% 12%"),
    ("--secondary-foreground", "210 40% 98%"),
    ("--muted", "222 47% 14%"),
    ("--muted-foreground", "215 20% 55%"),
    ("--border", "222 47% 16%"),
    ("--input", "222 47% 16%"),
    ("--sidebar-background", "222 47% 5%"),
    ("--sidebar-accent", "222 47% 10%"),
    ("--sidebar-border", "222 47% 12%"),
];

const LIGHT_PALETTE: [(&str, &str); 15] = [
    ("--background", "0 0% 100%"),
    ("--foreground", "222 47% 11%"),
    ("--card", "0 0% 98%"),
    ("--card-foreground", "222 47% 11%"),
    ("--popover", "0 0% 100%"),
    ("--popover-foreground", "222 47% 11%"),
    ("--secondary", "220 14% 96%"),
    ("--secondary-foreground", "222 47% 11%"),
    ("--muted", "220 14% 96%"),
    ("--muted-foreground", "220 9% 46%"),
    ("--border", "220 13% 91%"),
    ("--input", "220 13% 91%"),
    ("--sidebar-background", "0 0% 98%"),
    ("--sidebar-accent", "220 14% 96%"),
    ("--sidebar-border", "220 13% 91%"),
];

pub fn style_variables(settings: &DashboardSettings) -> StyleVariables {
    let palette = if settings.dark_mode {
        &DARK_PALETTE
    } else {
        &LIGHT_PALETTE
    };
    StyleVariables {
        dark_class: settings.dark_mode,
        properties: palette.iter().copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn temp_path() -> std::path::PathBuf {
        let mut dir = std::env::temp_dir();
        let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
        dir.push(format!("workforce_pulse_settings_{}_{}", std::process::id(), id));
        dir.join("dashboard-settings.json")
    }

    #[test]
    fn partial_documents_merge_over_defaults() {
        let settings =
            DashboardSettings::from_json(r#"{"darkMode": false, "refreshInterval": 60}"#);
        assert!(!settings.dark_mode);
        assert_eq!(settings.refresh_interval, 60);
        assert_eq!(settings.language, "en");
        assert!(settings.enable_what_if);
    }

    #[test]
    fn unreadable_documents_fall_back_to_defaults() {
        assert_eq!(DashboardSettings::from_json("{not json"), DashboardSettings::default());
        assert_eq!(DashboardSettings::load(&temp_path()), DashboardSettings::default());
    }

    #[test]
    fn save_load_and_clear() {
        let path = temp_path();
        let settings = DashboardSettings {
            compact_view: true,
            ..DashboardSettings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(DashboardSettings::load(&path), settings);

        DashboardSettings::clear(&path).unwrap();
        assert!(!path.exists());
        DashboardSettings::clear(&path).unwrap();
    }

    #[test]
    fn style_follows_dark_mode() {
        let dark = style_variables(&DashboardSettings::default());
        assert!(dark.dark_class);
        assert_eq!(dark.properties["--background"], "222 47% 6%");
        assert_eq!(dark.properties.len(), 15);

        let light = style_variables(&DashboardSettings {
            dark_mode: false,
            ..DashboardSettings::default()
        });
        assert!(!light.dark_class);
        assert_eq!(light.properties["--background"], "0 0% 100%");
        assert_eq!(
            light.properties.keys().collect::<Vec<_>>(),
            dark.properties.keys().collect::<Vec<_>>()
        );
    }
}
