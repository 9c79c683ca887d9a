//! Command-line interface.

pub mod completions;
pub mod couple;
pub mod matches;
pub mod output;
pub mod pillar;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::config::{Overrides, Settings};
use crate::core::matcher::Grains;
use crate::core::pillar::connect;
use crate::core::resolver::decode_value;
use crate::core::store::{FileStore, SecretsClient};
use crate::core::{constants, types::Pillar};
use crate::error::{ConfigError, Error, Result};

/// kvdn-pillar - KVDN secrets as per-minion pillar data.
#[derive(Parser)]
#[command(
    name = "kvdn-pillar",
    about = "Resolve KVDN secrets into per-minion pillar data",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings flags, layered over the settings file.
#[derive(Args, Debug, Default)]
pub struct SettingsArgs {
    /// TOML settings file
    #[arg(long, global = true, env = "KVDN_PILLAR_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// KVDN endpoint
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Mapping document (path or salt:// reference)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// File holding the KVDN token
    #[arg(long, global = true)]
    pub token_path: Option<PathBuf>,

    /// Omit variables whose secret is missing or empty
    #[arg(long, global = true)]
    pub unset_if_missing: bool,

    /// Merge the dynamic mapping fragment stored in KVDN
    #[arg(long, global = true)]
    pub dynamic_config: bool,

    /// Fileserver root for salt:// references (repeatable)
    #[arg(long = "file-root", global = true)]
    pub file_roots: Vec<PathBuf>,

    /// Read secrets from a static YAML/JSON snapshot instead of KVDN
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

/// Grain sources for the target minion.
#[derive(Args, Debug, Default)]
pub struct GrainArgs {
    /// YAML/JSON file with the minion's grains
    #[arg(long)]
    pub grains: Option<PathBuf>,

    /// Single grain as key=value (repeatable, overrides --grains)
    #[arg(long = "grain", value_name = "KEY=VALUE")]
    pub grain: Vec<String>,
}

/// Output encodings.
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum Format {
    #[default]
    Json,
    Yaml,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Compile the pillar of a minion
    Pillar {
        /// Minion id
        minion_id: String,
        #[command(flatten)]
        grains: GrainArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },

    /// Resolve a single location (path?key or path)
    Couple {
        /// Location string
        location: String,
        /// Output format
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },

    /// Check whether a minion matches a compound filter
    Match {
        /// Minion id
        minion_id: String,
        /// Compound filter expression
        expr: String,
        #[command(flatten)]
        grains: GrainArgs,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
pub fn execute(command: Command, settings: &SettingsArgs) -> Result<()> {
    match command {
        Command::Pillar {
            minion_id,
            grains,
            format,
        } => pillar::execute(&minion_id, &grains, settings, format),
        Command::Couple { location, format } => couple::execute(&location, settings, format),
        Command::Match {
            minion_id,
            expr,
            grains,
        } => matches::execute(&minion_id, &expr, &grains),
        Command::Completions { shell } => completions::execute(shell),
    }
}

impl SettingsArgs {
    /// Overrides from the settings file with flags on top.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the settings file can't be loaded.
    pub fn overrides(&self) -> Result<Overrides> {
        let file = match &self.settings {
            Some(path) => Overrides::load(path)?,
            None => Overrides::default(),
        };
        let flags = Overrides {
            url: self.url.clone(),
            config: self.config.clone(),
            token_path: self.token_path.clone(),
            unset_if_missing: self.unset_if_missing.then_some(true),
            dynamic_config_enabled: self.dynamic_config.then_some(true),
            file_roots: (!self.file_roots.is_empty()).then(|| self.file_roots.clone()),
            ..Default::default()
        };
        Ok(file.layer(flags))
    }

    /// Open the store selected by the flags: a snapshot file or KVDN.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the snapshot can't be loaded, or the
    /// `connect` errors for KVDN.
    pub fn open_store(&self, settings: &Settings) -> Result<Box<dyn SecretsClient>> {
        match &self.store {
            Some(path) => Ok(Box::new(FileStore::load(path)?)),
            None => Ok(Box::new(connect(
                settings,
                std::env::var(constants::TOKEN_ENV).ok(),
            )?)),
        }
    }
}

impl GrainArgs {
    /// Collect grains from the file and the `--grain` flags.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the grains file is unreadable or malformed,
    /// or a `--grain` lacks `=`.
    pub fn load(&self) -> Result<Grains> {
        let mut grains = match &self.grains {
            Some(path) => read_grains(path)?,
            None => Grains::new(),
        };
        for pair in &self.grain {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidGrain(pair.clone()))?;
            grains.insert(key.to_string(), decode_value(value.to_string()));
        }
        Ok(grains)
    }
}

fn read_grains(path: &Path) -> Result<Grains> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let grains: Grains = serde_yaml::from_str(&text).map_err(ConfigError::Yaml)?;
    Ok(grains)
}

/// Serialize a value for stdout.
///
/// # Errors
///
/// Returns `Error::Output` if serialization fails.
pub fn render<T: serde::Serialize>(value: &T, format: Format) -> Result<String> {
    match format {
        Format::Json => {
            serde_json::to_string_pretty(value).map_err(|e| Error::Output(e.to_string()))
        }
        Format::Yaml => serde_yaml::to_string(value).map_err(|e| Error::Output(e.to_string())),
    }
}

/// Print a compiled pillar.
///
/// # Errors
///
/// Returns `Error::Output` if serialization fails.
pub fn print_pillar(pillar: &Pillar, format: Format) -> Result<()> {
    println!("{}", render(pillar, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kvdn-pillar",
            "pillar",
            "web01",
            "--url",
            "http://kvdn:8200",
            "--unset-if-missing",
            "--grain",
            "role=web",
        ])
        .unwrap();

        assert_eq!(cli.settings.url.as_deref(), Some("http://kvdn:8200"));
        assert!(cli.settings.unset_if_missing);
        let Command::Pillar { minion_id, grains, .. } = cli.command else {
            panic!("expected pillar command");
        };
        assert_eq!(minion_id, "web01");
        assert_eq!(grains.grain, vec!["role=web".to_string()]);
    }

    #[test]
    fn test_flags_override_settings_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kvdn.toml");
        std::fs::write(&path, "url = \"http://file\"\nconfig = \"/etc/kvdn.yml\"\n").unwrap();

        let args = SettingsArgs {
            settings: Some(path),
            url: Some("http://flag".to_string()),
            ..Default::default()
        };
        let overrides = args.overrides().unwrap();
        assert_eq!(overrides.url.as_deref(), Some("http://flag"));
        assert_eq!(overrides.config.as_deref(), Some("/etc/kvdn.yml"));
        assert_eq!(overrides.unset_if_missing, None);
    }

    #[test]
    fn test_grain_flags() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("grains.yml");
        std::fs::write(&path, "role: db\nos: Ubuntu\n").unwrap();

        let args = GrainArgs {
            grains: Some(path),
            grain: vec!["role=web".to_string(), "roles=[\"a\",\"b\"]".to_string()],
        };
        let grains = args.load().unwrap();
        assert_eq!(grains["role"], "web");
        assert_eq!(grains["os"], "Ubuntu");
        assert_eq!(grains["roles"], serde_json::json!(["a", "b"]));

        let bad = GrainArgs {
            grains: None,
            grain: vec!["novalue".to_string()],
        };
        assert!(bad.load().is_err());
    }

    #[test]
    fn test_render_yaml() {
        let mut pillar = Pillar::new();
        pillar.insert("x".to_string(), serde_json::json!({"a": 1}));
        let yaml = render(&pillar, Format::Yaml).unwrap();
        assert_eq!(yaml, "x:\n  a: 1\n");
    }
}
