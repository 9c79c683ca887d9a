//! Provider settings.
//!
//! The effective settings for one pillar compile are built fresh from the
//! defaults and the caller's overrides. Nothing here is process-wide; a
//! compile never sees overrides from another minion's compile.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Effective provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// KVDN endpoint
    pub url: String,
    /// Mapping document, a local path or `salt://` reference
    pub config: String,
    /// Inline credential
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// File holding the credential, takes precedence over `token`
    pub token_path: Option<PathBuf>,
    /// Omit variables whose secret is missing or empty
    pub unset_if_missing: bool,
    /// Store path of the dynamic mapping fragment
    pub dynamic_config_map: String,
    /// Store key of the dynamic mapping fragment
    pub dynamic_config_key: String,
    /// Merge the dynamic mapping fragment over the mapping document
    pub dynamic_config_enabled: bool,
    /// Directories searched, in order, for `salt://` references
    pub file_roots: Vec<PathBuf>,
    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: constants::DEFAULT_URL.to_string(),
            config: constants::DEFAULT_CONFIG.to_string(),
            token: None,
            token_path: None,
            unset_if_missing: false,
            dynamic_config_map: constants::DEFAULT_DYNAMIC_MAP.to_string(),
            dynamic_config_key: constants::DEFAULT_DYNAMIC_KEY.to_string(),
            dynamic_config_enabled: false,
            file_roots: vec![PathBuf::from(constants::DEFAULT_FILE_ROOT)],
            timeout_secs: constants::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Caller-supplied overrides.
///
/// Every field is optional; `None` keeps the underlying value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Overrides {
    pub url: Option<String>,
    pub config: Option<String>,
    pub token: Option<String>,
    pub token_path: Option<PathBuf>,
    pub unset_if_missing: Option<bool>,
    pub dynamic_config_map: Option<String>,
    pub dynamic_config_key: Option<String>,
    pub dynamic_config_enabled: Option<bool>,
    pub file_roots: Option<Vec<PathBuf>>,
    pub timeout_secs: Option<u64>,
}

impl Overrides {
    /// Load overrides from a TOML settings file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if the file can't be read, or
    /// `ConfigError::Parse` if the TOML is malformed or has unknown keys.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading settings");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: Self = toml::from_str(&contents).map_err(ConfigError::Parse)?;
        Ok(overrides)
    }

    /// Stack `other` on top of `self`; values set in `other` win.
    pub fn layer(self, other: Overrides) -> Overrides {
        Overrides {
            url: other.url.or(self.url),
            config: other.config.or(self.config),
            token: other.token.or(self.token),
            token_path: other.token_path.or(self.token_path),
            unset_if_missing: other.unset_if_missing.or(self.unset_if_missing),
            dynamic_config_map: other.dynamic_config_map.or(self.dynamic_config_map),
            dynamic_config_key: other.dynamic_config_key.or(self.dynamic_config_key),
            dynamic_config_enabled: other.dynamic_config_enabled.or(self.dynamic_config_enabled),
            file_roots: other.file_roots.or(self.file_roots),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
        }
    }
}

impl Settings {
    /// Build new settings from `self` with `overrides` applied.
    ///
    /// `self` is left untouched.
    pub fn merge(&self, overrides: &Overrides) -> Settings {
        let o = overrides.clone();
        Settings {
            url: o.url.unwrap_or_else(|| self.url.clone()),
            config: o.config.unwrap_or_else(|| self.config.clone()),
            token: o.token.or_else(|| self.token.clone()),
            token_path: o.token_path.or_else(|| self.token_path.clone()),
            unset_if_missing: o.unset_if_missing.unwrap_or(self.unset_if_missing),
            dynamic_config_map: o
                .dynamic_config_map
                .unwrap_or_else(|| self.dynamic_config_map.clone()),
            dynamic_config_key: o
                .dynamic_config_key
                .unwrap_or_else(|| self.dynamic_config_key.clone()),
            dynamic_config_enabled: o
                .dynamic_config_enabled
                .unwrap_or(self.dynamic_config_enabled),
            file_roots: o.file_roots.unwrap_or_else(|| self.file_roots.clone()),
            timeout_secs: o.timeout_secs.unwrap_or(self.timeout_secs),
        }
    }

    /// Check that the settings can drive a compile.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingUrl` if `url` is empty.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingUrl.into());
        }
        Ok(())
    }

    /// Resolve the bearer credential.
    ///
    /// Precedence, lowest first: `token`, the contents of `token_path`,
    /// then `env_token` (the value of `KVDN_TOKEN`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::TokenFile` if `token_path` is set but unreadable.
    pub fn resolve_token(&self, env_token: Option<String>) -> Result<Option<Zeroizing<String>>> {
        let mut token = self.token.clone().map(Zeroizing::new);

        if let Some(path) = &self.token_path {
            let path = expand_home(path);
            debug!(path = %path.display(), "reading token file");
            let contents = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::TokenFile { path, source })?;
            token = Some(Zeroizing::new(contents.trim().to_string()));
        }

        if let Some(env) = env_token.filter(|t| !t.is_empty()) {
            debug!("using token from {}", constants::TOKEN_ENV);
            token = Some(Zeroizing::new(env));
        }

        Ok(token.filter(|t| !t.is_empty()))
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
