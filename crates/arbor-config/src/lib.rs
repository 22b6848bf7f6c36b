//! Configuration management for Arbor.
//!
//! Parses `arbor.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Path values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `store.snapshot`
//! - `cache.dir`
//! - `site.web_root`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use expand::expand_opt;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the store snapshot path.
    pub snapshot: Option<PathBuf>,
    /// Override the cache directory.
    pub cache_dir: Option<PathBuf>,
    /// Override the working language.
    pub language: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "arbor.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Store configuration (paths are relative strings from TOML).
    store: StoreConfigRaw,
    /// Cache configuration (paths are relative strings from TOML).
    cache: CacheConfigRaw,
    /// Site configuration as parsed from TOML.
    site: SiteConfigRaw,
    /// Page tree behaviour.
    pub pages: PagesSettings,
    /// Statically registered application routes.
    pub routes: RoutesConfig,

    /// Resolved paths and site settings (set after loading).
    #[serde(skip)]
    pub resolved: ResolvedConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct StoreConfigRaw {
    snapshot: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct CacheConfigRaw {
    dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct SiteConfigRaw {
    web_root: Option<String>,
    default_language: Option<String>,
    languages: Option<Vec<String>>,
    multi_language: Option<bool>,
}

/// Resolved configuration with absolute paths.
#[derive(Debug, Default)]
pub struct ResolvedConfig {
    /// JSON snapshot of the page store.
    pub snapshot: PathBuf,
    /// Root of the artifact cache.
    pub cache_dir: PathBuf,
    /// Public web root probed for URL collisions.
    pub web_root: PathBuf,
    /// Working language when none is given.
    pub default_language: String,
    /// Every language the site is published in.
    pub languages: Vec<String>,
    /// Prefix generated URLs with the language code.
    pub multi_language: bool,
}

/// Page tree behaviour.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagesSettings {
    /// Archived revisions kept per page.
    pub max_revisions: usize,
    /// Suffix attempts before URL resolution gives up.
    pub max_url_attempts: u32,
}

impl Default for PagesSettings {
    fn default() -> Self {
        Self {
            max_revisions: 20,
            max_url_attempts: 1000,
        }
    }
}

/// Statically registered application routes.
#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConfig {
    /// Route paths without leading or trailing slash (e.g. `backend`, `api/v1`).
    pub paths: Vec<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`cache.dir`").
        field: String,
        /// Error message.
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `arbor.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(snapshot) = &settings.snapshot {
            self.resolved.snapshot.clone_from(snapshot);
        }
        if let Some(cache_dir) = &settings.cache_dir {
            self.resolved.cache_dir.clone_from(cache_dir);
        }
        if let Some(language) = &settings.language {
            self.resolved.default_language.clone_from(language);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            store: StoreConfigRaw::default(),
            cache: CacheConfigRaw::default(),
            site: SiteConfigRaw::default(),
            pages: PagesSettings::default(),
            routes: RoutesConfig::default(),
            resolved: ResolvedConfig {
                snapshot: base.join(".arbor/pages.json"),
                cache_dir: base.join(".arbor/cache"),
                web_root: base.join("www"),
                default_language: "en".to_owned(),
                languages: vec!["en".to_owned()],
                multi_language: false,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Expand environment variables in path fields.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand_opt(&mut self.store.snapshot, "store.snapshot")?;
        expand_opt(&mut self.cache.dir, "cache.dir")?;
        expand_opt(&mut self.site.web_root, "site.web_root")?;
        Ok(())
    }

    /// Resolve raw sections against the config file directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = Self::default_with_base(config_dir).resolved;
        let resolve = |raw: Option<&String>, default: PathBuf| {
            raw.map_or(default, |p| config_dir.join(p))
        };

        let languages = self.site.languages.clone().unwrap_or(defaults.languages);
        let default_language = self
            .site
            .default_language
            .clone()
            .or_else(|| languages.first().cloned())
            .unwrap_or(defaults.default_language);

        self.resolved = ResolvedConfig {
            snapshot: resolve(self.store.snapshot.as_ref(), defaults.snapshot),
            cache_dir: resolve(self.cache.dir.as_ref(), defaults.cache_dir),
            web_root: resolve(self.site.web_root.as_ref(), defaults.web_root),
            default_language,
            languages,
            multi_language: self.site.multi_language.unwrap_or(defaults.multi_language),
        };
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_pages()?;
        self.validate_site()?;
        self.validate_routes()?;
        Ok(())
    }

    fn validate_pages(&self) -> Result<(), ConfigError> {
        if self.pages.max_revisions == 0 {
            return Err(ConfigError::Validation(
                "pages.max_revisions must be at least 1".to_owned(),
            ));
        }
        if self.pages.max_url_attempts == 0 {
            return Err(ConfigError::Validation(
                "pages.max_url_attempts must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_site(&self) -> Result<(), ConfigError> {
        let site = &self.resolved;
        if site.languages.is_empty() {
            return Err(ConfigError::Validation(
                "site.languages cannot be empty".to_owned(),
            ));
        }
        if !site.languages.contains(&site.default_language) {
            return Err(ConfigError::Validation(format!(
                "language {} is not listed in site.languages",
                site.default_language
            )));
        }
        Ok(())
    }

    fn validate_routes(&self) -> Result<(), ConfigError> {
        if let Some(empty) = self.routes.paths.iter().find(|p| p.trim_matches('/').is_empty()) {
            return Err(ConfigError::Validation(format!(
                "routes.paths contains an empty route: {empty:?}"
            )));
        }
        Ok(())
    }
}
