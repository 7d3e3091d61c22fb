//! Configuration management for propflow.
//!
//! TOML-based configuration loaded from an explicit path, with
//! `#[serde(default)]` fallbacks and `PROPFLOW_*` environment overrides.
//! Credentials never live in the TOML file; they are read from the
//! environment at run start.

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Credentials, FieldSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the login user name.
pub const USERNAME_VAR: &str = "PROPFLOW_USERNAME";
/// Environment variable holding the login password.
pub const PASSWORD_VAR: &str = "PROPFLOW_PASSWORD";

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Session establishment settings
    pub session: SessionConfig,
    /// Run scope and pacing settings
    pub run: RunConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Output and diagnostics paths
    pub output: OutputConfig,
    /// Canonical field names to extract
    pub fields: FieldsConfig,
    /// Application CSS selectors
    pub selectors: Selectors,
}

impl AppConfig {
    /// Load configuration from the given path, falling back to defaults if
    /// the file does not exist.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports:
    /// - `PROPFLOW_HEADLESS`: override browser headless mode (true/false)
    /// - `PROPFLOW_MAX_ROWS`: override the per-search row cap
    pub fn load_with_env(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::load(path)?;

        if let Ok(val) = std::env::var("PROPFLOW_HEADLESS") {
            if let Ok(headless) = val.parse() {
                config.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("PROPFLOW_MAX_ROWS") {
            if let Ok(cap) = val.parse() {
                config.run.max_rows = Some(cap);
                tracing::debug!("Override run.max_rows from env: {}", cap);
            }
        }

        Ok(config)
    }

    /// Read login credentials from the environment.
    pub fn credentials(&self) -> ConfigResult<Credentials> {
        let username =
            std::env::var(USERNAME_VAR).map_err(|_| ConfigError::MissingCredential {
                var: USERNAME_VAR,
            })?;
        let password =
            std::env::var(PASSWORD_VAR).map_err(|_| ConfigError::MissingCredential {
                var: PASSWORD_VAR,
            })?;
        Ok(Credentials::new(username, password))
    }

    /// Validate run-scoped settings before starting a session.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.run.saved_searches.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "run.saved_searches".to_string(),
                reason: "at least one saved search name is required".to_string(),
            });
        }
        if self.fields.names.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "fields.names".to_string(),
                reason: "the extraction field set must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The configured extraction field set.
    #[must_use]
    pub fn field_set(&self) -> FieldSet {
        self.fields.names.clone()
    }
}

/// Session establishment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Login page URL
    pub login_url: String,
    /// Application base URL, used to absolutise row links
    pub base_url: String,
    /// URL fragment that marks the post-login landing state
    pub landing_fragment: String,
    /// Bound on login completion, in seconds
    pub login_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_url: "https://login.propstream.com/".to_string(),
            base_url: "https://app.propstream.com".to_string(),
            landing_fragment: "/search".to_string(),
            login_timeout_secs: 60,
        }
    }
}

/// Run scope and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Saved search names, run in this order
    pub saved_searches: Vec<String>,
    /// Optional cap on rows scraped per search
    pub max_rows: Option<usize>,
    /// Settle pause between records, in milliseconds
    pub record_settle_ms: u64,
    /// Whether to also read the MLS Details tab for each record
    pub extract_mls_details: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            saved_searches: Vec::new(),
            max_rows: None,
            record_settle_ms: 500,
            extract_mls_details: false,
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

/// Output and diagnostics paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the persisted JSON result document
    pub results_path: PathBuf,
    /// Directory for best-effort failure screenshots
    pub diagnostics_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: PathBuf::from("properties.json"),
            diagnostics_dir: PathBuf::from("diagnostics"),
        }
    }
}

/// Canonical field names to extract from detail surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    /// Ordered field names
    pub names: FieldSet,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            names: FieldSet::default(),
        }
    }
}

/// Application CSS selectors.
///
/// The listing front-end uses hashed CSS-module class names, so every
/// selector the pipeline touches lives here. A front-end rebuild is a
/// config edit, not a code change. Defaults match the currently observed
/// application classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// Login user name input
    pub username_input: String,
    /// Login password input
    pub password_input: String,
    /// Login submit button
    pub submit_button: String,
    /// Clickable elements searched for the filter toggle text
    pub filter_toggle: String,
    /// Visible text of the filter toggle
    pub filter_toggle_text: String,
    /// Saved-searches dropdown opener
    pub saved_search_menu: String,
    /// Saved-search entries, matched by contained text
    pub saved_search_entry: String,
    /// Buttons searched for the view-results text
    pub view_results_button: String,
    /// Visible text of the view-results button
    pub view_results_text: String,
    /// Result row name anchors, re-resolved by index before every click
    pub row_name: String,
    /// Primary and secondary detail panel container
    pub detail_panel: String,
    /// Detail panel title
    pub title: String,
    /// One label/value item on a detail surface
    pub field_item: String,
    /// Label node within a field item
    pub field_label: String,
    /// Value node within a field item
    pub field_value: String,
    /// Tab elements searched for the linked-properties text
    pub linked_tab: String,
    /// Visible text of the linked-properties tab
    pub linked_tab_text: String,
    /// Linked-properties grid container
    pub linked_container: String,
    /// Linked-entry anchors within the grid
    pub linked_links: String,
    /// Tab elements searched for the MLS details text
    pub mls_tab: String,
    /// Visible text of the MLS details tab
    pub mls_tab_text: String,
    /// Label nodes scanned by the MLS adjacent-value read
    pub mls_label: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            username_input: r#"input[name="username"]"#.to_string(),
            password_input: r#"input[name="password"]"#.to_string(),
            submit_button: r#"button[type="submit"]"#.to_string(),
            filter_toggle: "div, span, button".to_string(),
            filter_toggle_text: "Filter".to_string(),
            saved_search_menu: r#"div[class*="dropdownSaveSerchBtn"]"#.to_string(),
            saved_search_entry: "h4".to_string(),
            view_results_button: "button".to_string(),
            view_results_text: "View Properties".to_string(),
            row_name: "a.src-app-Search-Results-style__BKQRC__name".to_string(),
            detail_panel: ".src-app-Property-Detail-style__T4AFZ__propertyInfo".to_string(),
            title: "div.src-app-Property-Detail-style__fl01l__headerTitle".to_string(),
            field_item: ".src-app-Property-Detail-style__C1aGN__item".to_string(),
            field_label: ".src-app-Property-Detail-style__HzIi1__label".to_string(),
            field_value: ".src-app-Property-Detail-style__ozT4e__value".to_string(),
            linked_tab: r#"div[role="tab"]"#.to_string(),
            linked_tab_text: "Linked Properties".to_string(),
            linked_container: "div.ag-center-cols-container".to_string(),
            linked_links: r#"div.ag-center-cols-container a[href^="/search/"]"#.to_string(),
            mls_tab: r#"div[role="tab"]"#.to_string(),
            mls_tab_text: "MLS Details".to_string(),
            mls_label: r#"div[class*="label"]"#.to_string(),
        }
    }
}
