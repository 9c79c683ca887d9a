//! Error types.
//!
//! Each subsystem has its own error enum; they all convert into [`Error`].
//! Inside pillar compilation these errors are logged and degraded, never
//! returned to the orchestrator.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("failed to write output: {0}")]
    Output(String),
}

/// Settings and mapping-document errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("'url' must be specified for KVDN configuration")]
    MissingUrl,

    #[error("failed to read token file {path}: {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid mapping document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid mapping document: {0}")]
    Document(String),

    #[error("invalid grain '{0}': expected key=value")]
    InvalidGrain(String),
}

/// Secrets store errors.
///
/// `NotFound` is kept apart from transport and decode failures so that
/// diagnostics can tell a missing secret from a broken store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("secret not found: {path}?{key}")]
    NotFound { path: String, key: String },

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed store response: {0}")]
    Decode(String),

    #[error("failed to load store file {path}: {reason}")]
    Load { path: PathBuf, reason: String },
}

/// Mapping template errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render template: {0}")]
    Render(#[from] minijinja::Error),

    #[error("template {0} rendered to an empty document")]
    Empty(PathBuf),
}

/// Compound filter errors.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("invalid compound expression '{expr}': {reason}")]
    Syntax { expr: String, reason: String },

    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),

    #[error("invalid glob: {0}")]
    Glob(#[from] globset::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
