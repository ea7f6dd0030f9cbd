use serde::Deserialize;

/// Root configuration. Loaded from environment variables with the prefix
/// `INSIGHT__` and an optional TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub goals: GoalsConfig,
    #[serde(default)]
    pub segments: SegmentsConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoalsConfig {
    /// `exact` on url/file/external_website must be given a full URL.
    #[serde(default = "default_exact_match_requires_url")]
    pub exact_match_requires_url: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentsConfig {
    /// When false, every segment must be pre-processed (`auto_archive`).
    #[serde(default = "default_enable_create_realtime_segments")]
    pub enable_create_realtime_segments: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Treat every request as HTTPS, e.g. behind a TLS-terminating proxy.
    #[serde(default)]
    pub assume_secure_protocol: bool,
    #[serde(default = "default_ignore_cookie_name")]
    pub ignore_cookie_name: String,
    #[serde(default = "default_ignore_cookie_path")]
    pub ignore_cookie_path: String,
    /// SameSite value asked for before browser-specific adjustments.
    #[serde(default = "default_ignore_cookie_same_site")]
    pub ignore_cookie_same_site: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

fn default_exact_match_requires_url() -> bool {
    true
}
fn default_enable_create_realtime_segments() -> bool {
    true
}
fn default_ignore_cookie_name() -> String {
    "matomo_ignore".to_string()
}
fn default_ignore_cookie_path() -> String {
    "/".to_string()
}
fn default_ignore_cookie_same_site() -> String {
    "None".to_string()
}
fn default_log_filter() -> String {
    "insight=info".to_string()
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            exact_match_requires_url: default_exact_match_requires_url(),
        }
    }
}

impl Default for SegmentsConfig {
    fn default() -> Self {
        Self {
            enable_create_realtime_segments: default_enable_create_realtime_segments(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            assume_secure_protocol: false,
            ignore_cookie_name: default_ignore_cookie_name(),
            ignore_cookie_path: default_ignore_cookie_path(),
            ignore_cookie_same_site: default_ignore_cookie_same_site(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `insight.toml` (if present) and environment
    /// variables, the latter taking precedence.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("insight").required(false))
            .add_source(
                config::Environment::with_prefix("INSIGHT")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Parse a TOML document; missing keys fall back to defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert!(cfg.goals.exact_match_requires_url);
        assert!(cfg.segments.enable_create_realtime_segments);
        assert!(!cfg.tracker.assume_secure_protocol);
        assert_eq!(cfg.tracker.ignore_cookie_name, "matomo_ignore");
        assert_eq!(cfg.tracker.ignore_cookie_same_site, "None");
        assert_eq!(cfg.logging.filter, "insight=info");
    }

    #[test]
    fn test_toml_overrides_keep_other_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [segments]
            enable_create_realtime_segments = false

            [tracker]
            assume_secure_protocol = true
            "#,
        )
        .unwrap();
        assert!(!cfg.segments.enable_create_realtime_segments);
        assert!(cfg.tracker.assume_secure_protocol);
        assert_eq!(cfg.tracker.ignore_cookie_path, "/");
        assert!(cfg.goals.exact_match_requires_url);
    }
}
