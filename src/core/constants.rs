//! Constants used throughout kvdn-pillar.
//!
//! Centralizes magic strings and default configuration values.

/// Default KVDN endpoint.
pub const DEFAULT_URL: &str = "https://KVDN:8200";

/// Default location of the mapping document.
pub const DEFAULT_CONFIG: &str = "/srv/salt/kvdn.yml";

/// Default store path holding the dynamic mapping fragment.
pub const DEFAULT_DYNAMIC_MAP: &str = "salt/pillar_mapping";

/// Default key of the dynamic mapping fragment.
pub const DEFAULT_DYNAMIC_KEY: &str = "dynamic_config";

/// Default fileserver root for `salt://` references.
pub const DEFAULT_FILE_ROOT: &str = "/srv/salt";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable that overrides any configured token.
pub const TOKEN_ENV: &str = "KVDN_TOKEN";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "KVDN_PILLAR_LOG";

/// Fileserver URL scheme.
pub const FILESERVER_SCHEME: &str = "salt://";

/// Separator between store path and key in a location string.
pub const KEY_SEPARATOR: char = '?';
