//! Configuration system for wikimcp.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("wikimcp/", env!("CARGO_PKG_VERSION"));

/// Main configuration struct for wikimcp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key of the wiki selected at startup
    #[serde(rename = "defaultWiki", alias = "default_wiki")]
    pub default_wiki: String,
    /// Configured wikis, keyed by host (e.g. "en.wikipedia.org")
    pub wikis: BTreeMap<String, WikiConfig>,
    /// Outbound HTTP settings
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        let mut wikis = BTreeMap::new();
        wikis.insert(
            "en.wikipedia.org".to_string(),
            WikiConfig {
                sitename: "Wikipedia".to_string(),
                server: "https://en.wikipedia.org".to_string(),
                ..WikiConfig::default()
            },
        );
        wikis.insert(
            "localhost:8080".to_string(),
            WikiConfig {
                sitename: "Local MediaWiki Docker".to_string(),
                server: "http://localhost:8080".to_string(),
                ..WikiConfig::default()
            },
        );

        Self {
            default_wiki: "en.wikipedia.org".to_string(),
            wikis,
            http: HttpConfig::default(),
        }
    }
}

/// Connection settings for a single wiki.
///
/// Field names follow the MediaWiki settings they mirror (`$wgServer`,
/// `$wgScriptPath`, ...), so existing `config.json` files load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    /// `$wgSitename`
    pub sitename: String,
    /// `$wgServer`, an origin URL without trailing slash
    pub server: String,
    /// `$wgArticlePath` without the `/$1` suffix
    pub articlepath: String,
    /// `$wgScriptPath`, the prefix for api.php and rest.php
    pub scriptpath: String,
    /// OAuth owner-only access token (Extension:OAuth)
    #[serde(alias = "oauthToken", skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Username for session (cookie) authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for session (cookie) authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Whether reading requires authentication (`$wgGroupPermissions['*']['read'] = false`)
    pub private: bool,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            sitename: "MediaWiki".to_string(),
            server: String::new(),
            articlepath: "/wiki".to_string(),
            scriptpath: "/w".to_string(),
            token: None,
            username: None,
            password: None,
            private: false,
        }
    }
}

impl WikiConfig {
    /// Origin URL of the wiki.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Script path prefix.
    pub fn script_path(&self) -> &str {
        &self.scriptpath
    }

    /// Article path prefix.
    pub fn article_path(&self) -> &str {
        &self.articlepath
    }

    /// OAuth token, absent when unset or empty.
    pub fn oauth_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Username, absent when unset or empty.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.is_empty())
    }

    /// Password, absent when unset or empty.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    /// Whether every read requires authentication.
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Whether both a username and a password are configured.
    pub fn has_credentials(&self) -> bool {
        self.username().is_some() && self.password().is_some()
    }

    /// Base URL (server + script path). Protocol-relative servers are
    /// resolved to https.
    pub fn base_url(&self) -> String {
        let server = if self.server.starts_with("//") {
            format!("https:{}", self.server)
        } else {
            self.server.clone()
        };
        format!("{}{}", server, self.scriptpath)
    }

    /// Action API endpoint.
    pub fn api_url(&self) -> String {
        format!("{}/api.php", self.base_url())
    }

    /// REST API endpoint for a `/v1/...` path.
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/rest.php{}", self.base_url(), path)
    }

    /// Canonical article URL for a page title.
    pub fn page_url(&self, title: &str) -> String {
        format!(
            "{}{}/{}",
            self.server,
            self.articlepath,
            urlencoding::encode(title)
        )
    }

    /// Strip trailing slashes from the URL fragments.
    pub fn normalize(&mut self) {
        for field in [&mut self.server, &mut self.scriptpath, &mut self.articlepath] {
            while field.ends_with('/') {
                field.pop();
            }
        }
    }
}

/// Outbound HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout applied to every outbound request, in seconds
    pub timeout_secs: u64,
    /// How long a successful login is trusted before re-checking, in seconds
    pub auth_cache_secs: u64,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            auth_cache_secs: 300,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Validation result with multiple issues.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// List of validation issues
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Create a new empty validation result.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Check if validation passed (no errors).
    pub fn is_ok(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == IssueSeverity::Error)
    }

    /// Get only error-level issues.
    pub fn errors(&self) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == IssueSeverity::Error).collect()
    }

    /// Get only warning-level issues.
    pub fn warnings(&self) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == IssueSeverity::Warning).collect()
    }

    /// Add an error.
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Error,
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning.
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity: IssueSeverity::Warning,
            field: field.into(),
            message: message.into(),
        });
    }
}

/// A single validation issue.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue
    pub severity: IssueSeverity,
    /// Field path (e.g., "wikis.en.wikipedia.org.server")
    pub field: String,
    /// Human-readable message
    pub message: String,
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Warnings don't prevent loading
    Warning,
    /// Errors prevent loading
    Error,
}

impl Config {
    /// Path of the config file: `CONFIG` env var, else `config.json`.
    pub fn config_path() -> PathBuf {
        std::env::var("CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from the default path and the environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path` and the environment.
    ///
    /// A missing file yields the built-in defaults. The file replaces the
    /// default wiki list rather than merging into it.
    pub fn load_from(path: &Path) -> Result<Self, figment::Error> {
        let figment = if path.exists() {
            match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => Figment::new().merge(Toml::file(path)),
                _ => Figment::new().merge(Json::file(path)),
            }
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Figment::from(Serialized::defaults(Config::default()))
        };

        let mut config: Config = figment
            // e.g. WIKIMCP_HTTP__TIMEOUT_SECS=10
            .merge(Env::prefixed("WIKIMCP_").split("__"))
            .extract()?;

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.normalize();
        Ok(config)
    }

    /// Load and validate configuration.
    pub fn load_validated(path: &Path) -> Result<Self, Error> {
        let config = Self::load_from(path).map_err(|e| Error::Config(e.to_string()))?;
        let result = config.validate();

        if !result.is_ok() {
            let errors: Vec<String> = result
                .errors()
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            return Err(Error::Config(format!(
                "Configuration validation failed:\n  {}",
                errors.join("\n  ")
            )));
        }

        for warning in result.warnings() {
            tracing::warn!("Config warning - {}: {}", warning.field, warning.message);
        }

        Ok(config)
    }

    /// Apply the `MEDIAWIKI_*` environment overrides.
    ///
    /// When `MEDIAWIKI_API_URL` is set, a wiki keyed by the URL's host is
    /// inserted (replacing any existing entry) and made the default.
    pub fn apply_env_overrides<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(api_url) = var("MEDIAWIKI_API_URL") else {
            return;
        };

        let url = match url::Url::parse(&api_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid MEDIAWIKI_API_URL");
                return;
            }
        };

        let Some(host) = url.host_str() else {
            tracing::warn!("Ignoring MEDIAWIKI_API_URL without a host");
            return;
        };
        let host = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let scriptpath = match url.path().replace("/api.php", "") {
            path if path.is_empty() => "/w".to_string(),
            path => path,
        };

        let wiki = WikiConfig {
            sitename: var("MEDIAWIKI_SITENAME").unwrap_or_else(|| "MediaWiki".to_string()),
            server: format!("{}://{}", url.scheme(), host),
            articlepath: "/wiki".to_string(),
            scriptpath,
            token: var("MEDIAWIKI_ACCESS_TOKEN"),
            username: var("MEDIAWIKI_USERNAME"),
            password: var("MEDIAWIKI_PASSWORD"),
            private: var("MEDIAWIKI_PRIVATE").as_deref() == Some("true"),
        };

        self.wikis.insert(host.clone(), wiki);
        self.default_wiki = host;
    }

    /// Normalize every wiki's URL fragments.
    pub fn normalize(&mut self) {
        for wiki in self.wikis.values_mut() {
            wiki.normalize();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !self.wikis.contains_key(&self.default_wiki) {
            result.add_error(
                "defaultWiki",
                format!("Default wiki \"{}\" not found in config", self.default_wiki),
            );
        }

        for (id, wiki) in &self.wikis {
            if !wiki.server.starts_with("http://")
                && !wiki.server.starts_with("https://")
                && !wiki.server.starts_with("//")
            {
                result.add_error(
                    format!("wikis.{}.server", id),
                    "server must start with http://, https:// or //",
                );
            }

            if wiki.username().is_some() && wiki.password().is_none() {
                result.add_warning(
                    format!("wikis.{}.password", id),
                    "username is set without a password; session login will be skipped",
                );
            }

            if wiki.token.as_deref() == Some("") {
                result.add_warning(format!("wikis.{}.token", id), "OAuth token is empty string");
            }

            if wiki.private && wiki.oauth_token().is_none() && wiki.username().is_none() {
                result.add_warning(
                    format!("wikis.{}.private", id),
                    "private wiki has no token or username; every request will fail",
                );
            }
        }

        if self.http.timeout_secs == 0 {
            result.add_error("http.timeout_secs", "timeout_secs must be greater than 0");
        }

        result
    }
}
