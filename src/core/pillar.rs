//! External pillar entry point.
//!
//! Glue between the orchestrator and the resolver: settings, credential,
//! store connection, mapping document, dynamic fragment. Every failure here
//! is logged and turns into an empty (or static-only) result; a compile
//! never returns an error to the orchestrator.

use std::time::Duration;

use tracing::{debug, error, info};

use crate::core::config::{Overrides, Settings};
use crate::core::constants;
use crate::core::location::ConfigMap;
use crate::core::matcher::{Grains, HostMatcher};
use crate::core::resolver::Resolver;
use crate::core::store::{KvdnClient, SecretsClient};
use crate::core::template::{self, RenderContext};
use crate::core::types::Pillar;
use crate::error::{ConfigError, Result};

/// Compile the KVDN pillar of one minion.
///
/// Settings are `defaults + overrides`, built for this call only. The
/// credential honours `KVDN_TOKEN` from the environment.
pub fn ext_pillar<M>(minion_id: &str, grains: &Grains, overrides: &Overrides, matcher: &M) -> Pillar
where
    M: HostMatcher + ?Sized,
{
    debug!(minion = minion_id, "compiling kvdn pillar");
    let settings = Settings::default().merge(overrides);

    let client = match connect(&settings, std::env::var(constants::TOKEN_ENV).ok()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "error getting kvdn connection");
            return Pillar::new();
        }
    };

    compile(minion_id, grains, &settings, &client, matcher)
}

/// Build a KVDN client from effective settings.
///
/// # Errors
///
/// Returns `ConfigError::MissingUrl`, `ConfigError::TokenFile`, or
/// `StoreError::Connection` if the client can't be set up.
pub fn connect(settings: &Settings, env_token: Option<String>) -> Result<KvdnClient> {
    settings.validate()?;
    let token = settings.resolve_token(env_token)?;
    let client = KvdnClient::new(
        &settings.url,
        token,
        Duration::from_secs(settings.timeout_secs),
    )?;
    Ok(client)
}

/// Compile a pillar against an already connected store.
pub fn compile<C, M>(
    minion_id: &str,
    grains: &Grains,
    settings: &Settings,
    client: &C,
    matcher: &M,
) -> Pillar
where
    C: SecretsClient + ?Sized,
    M: HostMatcher + ?Sized,
{
    if let Err(e) = settings.validate() {
        error!(error = %e, "invalid kvdn configuration");
        return Pillar::new();
    }

    let mut config_map = match load_mapping(minion_id, grains, settings) {
        Ok(config_map) => config_map,
        Err(e) => {
            error!(config = %settings.config, error = %e, "error while rendering the kvdn config template");
            return Pillar::new();
        }
    };

    if settings.dynamic_config_enabled {
        match load_dynamic(client, settings) {
            Ok(dynamic) => {
                info!(filters = dynamic.len(), "loaded dynamic configuration");
                config_map = config_map.merge(dynamic);
            }
            Err(e) => error!(error = %e, "unable to load dynamic config"),
        }
    }

    let pillar = Resolver::new(client)
        .unset_if_missing(settings.unset_if_missing)
        .resolve_pillar(minion_id, &config_map, matcher);
    debug!(minion = minion_id, vars = pillar.len(), "kvdn pillar compiled");
    pillar
}

/// Locate, render and parse the mapping document.
///
/// # Errors
///
/// Returns `TemplateError` if the document can't be found or rendered, or
/// `ConfigError` if it isn't a YAML mapping.
pub fn load_mapping(minion_id: &str, grains: &Grains, settings: &Settings) -> Result<ConfigMap> {
    let path = template::resolve_source(&settings.config, &settings.file_roots)?;
    let ctx = RenderContext {
        minion_id,
        grains,
        opts: settings,
    };
    let rendered = template::render_file(&path, &ctx)?;
    ConfigMap::from_yaml_str(&rendered)
}

/// Fetch and parse the dynamic mapping fragment.
///
/// # Errors
///
/// Returns `StoreError` if the fragment can't be read, or `ConfigError` if
/// it isn't a JSON object.
pub fn load_dynamic<C>(client: &C, settings: &Settings) -> Result<ConfigMap>
where
    C: SecretsClient + ?Sized,
{
    let raw = client.get(&settings.dynamic_config_map, &settings.dynamic_config_key)?;
    let doc: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| ConfigError::Document(format!("dynamic configuration is not JSON: {}", e)))?;
    ConfigMap::from_json(&doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_requires_url() {
        let settings = Settings {
            url: String::new(),
            ..Default::default()
        };
        assert!(connect(&settings, None).is_err());
    }

    #[test]
    fn test_connect_with_env_token() {
        let settings = Settings {
            url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let client = connect(&settings, Some("from-env".to_string())).unwrap();
        assert!(format!("{:?}", client).contains("<redacted>"));
    }

    #[test]
    fn test_ext_pillar_without_mapping_is_empty() {
        let overrides = Overrides {
            url: Some("http://127.0.0.1:1".to_string()),
            config: Some("/nonexistent/kvdn.yml".to_string()),
            ..Default::default()
        };
        let matcher = crate::core::matcher::CompoundMatcher::new();
        let pillar = ext_pillar("web01", &Grains::new(), &overrides, &matcher);
        assert!(pillar.is_empty());
    }
}
