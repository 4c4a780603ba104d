//! Configuration handling for the demo

use crate::ctrl::{FormValues, ValidationEvent};
use crate::hooks::UseFormOptions;
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

/// Log filter used when neither `RUST_LOG` nor the config names one
pub const DEFAULT_LOG_FILTER: &str = "form_ctrl=info";

/// User configuration for the demo
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DemoConfig {
    /// When fields validate on their own
    pub validation_event: Option<ValidationEvent>,
    /// Keep the form registered after the screen closes
    pub keep_after_unmount: Option<bool>,
    /// tracing filter directive
    pub log_filter: Option<String>,
    /// Values the form starts with and resets to
    pub initial_values: Option<FormValues>,
}

impl DemoConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "form-ctrl", "form-ctrl-demo")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Acquisition options for the demo form. `values` is shared so that passing the same
    /// options on every pass never resets the form.
    pub fn use_form_options(&self) -> UseFormOptions {
        UseFormOptions {
            validation_event: self.validation_event,
            keep_after_unmount: self.keep_after_unmount.unwrap_or(false),
            values: self.initial_values.clone().map(Rc::new),
            ..Default::default()
        }
    }
}
