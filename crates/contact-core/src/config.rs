//! Contact modal configuration
//!
//! Stored as YAML. Every field has a default matching the blog's contact page,
//! so an empty or partial file is valid.
//! Default location: `<config dir>/contact-modal/config.yaml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Origin that relative opener links and the submit path resolve against
    pub base_url: String,
    /// Endpoint receiving the serialized form
    pub submit_path: String,
    /// Delay between the thank-you message and hiding the modal
    pub dismiss_delay_ms: u64,
    /// Per-request timeout for the HTTP agent (1-300 seconds)
    pub request_timeout_secs: u64,
    pub selectors: SelectorConfig,
    pub messages: MessageConfig,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://127.0.0.1:8000/"),
            submit_path: String::from("/blog/contact_us/"),
            dismiss_delay_ms: 2000,
            request_timeout_secs: 30,
            selectors: SelectorConfig::default(),
            messages: MessageConfig::default(),
        }
    }
}

impl ContactConfig {
    /// Clamp values into supported ranges
    pub fn validate(&mut self) {
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 300);
        if self.submit_path.trim().is_empty() {
            self.submit_path = Self::default().submit_path;
        }
    }

    pub fn dismiss_delay(&self) -> Duration {
        Duration::from_millis(self.dismiss_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Selectors binding the controller to the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Element the delegated handlers are bound to
    pub scope: String,
    /// Elements whose click loads the form (their `href` is fetched)
    pub opener: String,
    pub submit: String,
    pub form: String,
    pub modal: String,
    /// Content area inside the modal that receives fragments
    pub modal_content: String,
    pub dismiss: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            scope: String::from("body"),
            opener: String::from(".js-load-form"),
            submit: String::from("#submit-btn"),
            form: String::from("#contact-form"),
            modal: String::from("#contactModal"),
            modal_content: String::from(".modal-content"),
            dismiss: String::from("[data-dismiss=\"modal\"]"),
        }
    }
}

/// Markup and notices the controller shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Content shown after a valid submission
    pub thank_you: String,
    /// Content shown when the form cannot be loaded
    pub load_failed: String,
    /// Alert raised when a submission cannot be delivered
    pub submit_failed: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            thank_you: String::from("<p>Thank you for your message!</p>"),
            load_failed: String::from(
                "<p class=\"modal-error\">The contact form could not be loaded. Please try again later.</p>",
            ),
            submit_failed: String::from("Your message could not be sent. Please try again."),
        }
    }
}

/// Returns: `<config dir>/contact-modal/config.yaml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("contact-modal")
        .join("config.yaml")
}

/// Load configuration from a YAML file
///
/// A missing file yields defaults. An unreadable or invalid file logs a
/// warning and yields defaults.
pub fn load_config(path: &Path) -> ContactConfig {
    if !path.exists() {
        log::info!("load_config: {:?} not found, using defaults", path);
        return ContactConfig::default();
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_yaml::from_str::<ContactConfig>(&text).map_err(|e| e.to_string()));

    match parsed {
        Ok(mut config) => {
            config.validate();
            log::info!(
                "load_config: base {} submit {} dismiss {}ms",
                config.base_url,
                config.submit_path,
                config.dismiss_delay_ms
            );
            config
        }
        Err(e) => {
            log::warn!("load_config: Ignoring {:?}: {}", path, e);
            ContactConfig::default()
        }
    }
}

/// Save configuration as YAML, creating parent directories
pub fn save_config(config: &ContactConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    log::info!("save_config: Wrote {:?}", path);
    Ok(())
}
