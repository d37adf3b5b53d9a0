//! Settings module.
//!
//! Handles loading, validating and merging `pythonz.toml`. The file is
//! sparse: stock defaults are the base layer and the user file overrides
//! just the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! site_url = "http://pythonz.net"  # Prefix for absolute URLs, no trailing slash
//! media_root = "data/media/"       # Directory holding uploaded and generated media
//! media_url = "/media/"            # URL prefix media_root is served under
//!
//! [thumbnails]
//! ttl_secs = 86400                 # How long a computed thumbnail URL is memoized
//! quality = 75                     # JPEG quality of generated thumbnails (1-100)
//!
//! [typograph]
//! extra_rules = []                 # Rules applied after the built-in set
//!
//! [integrations]
//! google_api_key = "..."           # Google Time Zone API key (omit to disable)
//! timeout_secs = 30                # Outbound HTTP request timeout
//!
//! [processing]
//! max_processes = 4                # Max parallel thumbnail workers (omit for auto)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::typograph::{RuleSpec, Typograph};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Name of the settings file looked up by the CLI.
pub const CONFIG_FILENAME: &str = "pythonz.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site settings loaded from `pythonz.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Scheme and host used to build absolute URLs.
    pub site_url: String,
    /// Filesystem directory holding uploaded and generated media.
    pub media_root: String,
    /// URL prefix `media_root` is served under.
    pub media_url: String,
    /// Thumbnail URL memoization.
    pub thumbnails: ThumbnailsConfig,
    /// Extra typography rules.
    pub typograph: TypographConfig,
    /// Third-party API settings.
    pub integrations: IntegrationsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_url: "http://pythonz.net".to_string(),
            media_root: "data/media/".to_string(),
            media_url: "/media/".to_string(),
            thumbnails: ThumbnailsConfig::default(),
            typograph: TypographConfig::default(),
            integrations: IntegrationsConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl Settings {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.site_url.starts_with("http://") || self.site_url.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "site_url must start with http:// or https://".into(),
            ));
        }
        if self.site_url.ends_with('/') {
            return Err(ConfigError::Validation(
                "site_url must not end with '/'".into(),
            ));
        }
        if !self.media_url.starts_with('/') || !self.media_url.ends_with('/') {
            return Err(ConfigError::Validation(
                "media_url must start and end with '/'".into(),
            ));
        }
        if self.media_root.is_empty() {
            return Err(ConfigError::Validation(
                "media_root must not be empty".into(),
            ));
        }
        if self.thumbnails.ttl_secs == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.ttl_secs must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.integrations.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "integrations.timeout_secs must be non-zero".into(),
            ));
        }
        Typograph::with_extra(&self.typograph.extra_rules)
            .map_err(|e| ConfigError::Validation(format!("typograph.extra_rules: {e}")))?;
        Ok(())
    }

    pub fn media_root(&self) -> PathBuf {
        PathBuf::from(&self.media_root)
    }
}

/// Thumbnail URL memoization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Seconds a computed thumbnail URL stays memoized.
    pub ttl_secs: u64,
    /// JPEG encoding quality for generated thumbnails (1-100).
    pub quality: u8,
}

impl ThumbnailsConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 86_400,
            quality: 75,
        }
    }
}

/// Typography settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypographConfig {
    /// Rules appended after the built-in set, applied in order.
    pub extra_rules: Vec<RuleSpec>,
}

/// Third-party API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IntegrationsConfig {
    /// Key for the Google Time Zone API. Time zone lookups are skipped without it.
    pub google_api_key: Option<String>,
    /// Outbound HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl IntegrationsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel thumbnail workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default settings as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Settings::default()).expect("default settings must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a settings file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Settings, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let settings: Settings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from `path`, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<Settings, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `pythonz.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pythonz settings
# =================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Scheme and host prepended to absolute URLs. No trailing slash.
site_url = "http://pythonz.net"

# Directory holding uploaded and generated media files.
media_root = "data/media/"

# URL prefix media_root is served under. Must start and end with '/'.
media_url = "/media/"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Seconds a computed thumbnail URL is kept in memory before the
# filesystem is checked again.
ttl_secs = 86400

# JPEG quality of generated thumbnails (1 = worst, 100 = best).
quality = 75

# ---------------------------------------------------------------------------
# Typography
# ---------------------------------------------------------------------------
[typograph]
# Extra substitution rules, applied in order after the built-in set.
# Replacement may refer to capture groups as ${1}, ${2}, ...
#
# [[typograph.extra_rules]]
# name = "NBSP_AFTER_NUMBER"
# pattern = '(\d) '
# replacement = "${1} "
extra_rules = []

# ---------------------------------------------------------------------------
# Integrations
# ---------------------------------------------------------------------------
[integrations]
# Google Time Zone API key. Time zone lookups are disabled without it.
# google_api_key = "..."

# Outbound HTTP request timeout, seconds.
timeout_secs = 30

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel thumbnail workers for `warm`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_settings_pass_validation() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn defaults_match_site() {
        let s = Settings::default();
        assert_eq!(s.site_url, "http://pythonz.net");
        assert_eq!(s.media_url, "/media/");
        assert_eq!(s.thumbnails.ttl(), Duration::from_secs(24 * 60 * 60));
        assert!(s.integrations.google_api_key.is_none());
    }

    // =========================================================================
    // effective_threads
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let config = ProcessingConfig {
            max_processes: None,
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let config = ProcessingConfig {
            max_processes: Some(99999),
        };
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // merge / parse
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str(
            r#"
[thumbnails]
ttl_secs = 60
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let thumbs = merged.get("thumbnails").unwrap();
        assert_eq!(thumbs.get("ttl_secs").unwrap().as_integer(), Some(60));
        // untouched top-level keys survive
        assert_eq!(
            merged.get("media_url").unwrap().as_str(),
            Some("/media/")
        );
    }

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[thumbnails]
ttl = 60
"#;
        let result: Result<Settings, _> = toml::from_str(toml_str);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<Settings, _> = toml::from_str("[thumbs]\nttl_secs = 1\n");
        assert!(result.is_err());
    }

    #[test]
    fn parse_extra_rules() {
        let toml_str = r#"
[[typograph.extra_rules]]
name = "ARROW"
pattern = '->'
replacement = "→"
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.typograph.extra_rules.len(), 1);
        assert_eq!(settings.typograph.extra_rules[0].name, "ARROW");
    }

    // =========================================================================
    // validation
    // =========================================================================

    #[test]
    fn validate_site_url_scheme() {
        let s = Settings {
            site_url: "pythonz.net".into(),
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_site_url_trailing_slash() {
        let s = Settings {
            site_url: "https://pythonz.net/".into(),
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_media_url_slashes() {
        let s = Settings {
            media_url: "media".into(),
            ..Settings::default()
        };
        assert!(matches!(s.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_zero_ttl() {
        let mut s = Settings::default();
        s.thumbnails.ttl_secs = 0;
        assert!(matches!(s.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_quality_range() {
        let mut s = Settings::default();
        s.thumbnails.quality = 0;
        assert!(matches!(s.validate(), Err(ConfigError::Validation(_))));
        s.thumbnails.quality = 100;
        assert!(s.validate().is_ok());
        s.thumbnails.quality = 101;
        assert!(matches!(s.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_bad_extra_rule() {
        let mut s = Settings::default();
        s.typograph.extra_rules.push(RuleSpec {
            name: "BROKEN".into(),
            pattern: "[".into(),
            replacement: String::new(),
        });
        let err = s.validate().unwrap_err().to_string();
        assert!(err.contains("BROKEN"));
    }

    // =========================================================================
    // loading
    // =========================================================================

    #[test]
    fn load_config_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let settings = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(settings.site_url, "http://pythonz.net");
    }

    #[test]
    fn load_config_overrides_and_validates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(
            &path,
            r#"
site_url = "https://example.org"
[integrations]
google_api_key = "k"
"#,
        )
        .unwrap();
        let settings = load_config(&path).unwrap();
        assert_eq!(settings.site_url, "https://example.org");
        assert_eq!(settings.integrations.google_api_key.as_deref(), Some("k"));
        assert_eq!(settings.integrations.timeout_secs, 30);
        assert_eq!(settings.media_url, "/media/");
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "media_url = \"/media\"\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn load_config_reports_toml_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        fs::write(&path, "site_url = \n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // stock_config_toml
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let settings: Settings = toml::from_str(stock_config_toml()).unwrap();
        let defaults = Settings::default();
        assert_eq!(settings.site_url, defaults.site_url);
        assert_eq!(settings.media_root, defaults.media_root);
        assert_eq!(settings.media_url, defaults.media_url);
        assert_eq!(settings.thumbnails.ttl_secs, defaults.thumbnails.ttl_secs);
        assert_eq!(settings.thumbnails.quality, defaults.thumbnails.quality);
        assert_eq!(
            settings.integrations.timeout_secs,
            defaults.integrations.timeout_secs
        );
        assert!(settings.typograph.extra_rules.is_empty());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in ["[thumbnails]", "[typograph]", "[integrations]", "[processing]"] {
            assert!(content.contains(section), "missing {section}");
        }
    }
}
