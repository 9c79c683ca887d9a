//! kvdn-pillar - KVDN secrets as per-minion pillar data.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── pillar        # Compile the pillar of one minion
//! │   ├── couple        # Resolve a single location
//! │   ├── matches       # Evaluate a compound filter
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── config        # Settings, overrides and credential lookup
//!     ├── location      # Mapping document and location tree
//!     ├── resolver      # couple / resolve_pillar
//!     ├── store/        # Secrets stores
//!     │   ├── mod       # SecretsClient trait
//!     │   ├── kvdn      # KVDN REST client
//!     │   └── fs        # Static file-backed store
//!     ├── matcher/      # Host membership
//!     │   ├── mod       # HostMatcher trait
//!     │   └── compound  # Compound filter expressions
//!     ├── template      # Mapping template lookup and rendering
//!     └── pillar        # ext_pillar entry point
//! ```
//!
//! # Example
//!
//! ```
//! use kvdn_pillar::{ConfigMap, CompoundMatcher, FileStore, Resolver};
//!
//! let mut store = FileStore::default();
//! store.insert("secret/db", "password", "hunter2");
//!
//! let config = ConfigMap::from_yaml_str("\"web*\":\n  db_password: \"secret/db?password\"\n").unwrap();
//! let pillar = Resolver::new(store).resolve_pillar("web01", &config, &CompoundMatcher::new());
//!
//! assert_eq!(pillar["db_password"], "hunter2");
//! ```

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::config::{Overrides, Settings};
pub use crate::core::location::{Bindings, ConfigMap, Location};
pub use crate::core::matcher::{CompoundMatcher, Grains, HostMatcher};
pub use crate::core::pillar::{compile, ext_pillar};
pub use crate::core::resolver::Resolver;
pub use crate::core::store::{FileStore, KvdnClient, SecretsClient};
pub use crate::core::types::Pillar;
pub use crate::error::{Error, Result};
