//! Mapping document loading.
//!
//! The mapping document is a Jinja template that renders to YAML. It may
//! live on the local filesystem or be referenced as `salt://path`, in which
//! case the first file root containing `path` wins.

use std::path::{Component, Path, PathBuf};

use minijinja::{context, Environment};
use tracing::debug;

use crate::core::config::Settings;
use crate::core::constants::FILESERVER_SCHEME;
use crate::core::matcher::Grains;
use crate::error::TemplateError;

/// Variables available to the mapping template.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub minion_id: &'a str,
    pub grains: &'a Grains,
    pub opts: &'a Settings,
}

/// Locate the mapping document on disk.
///
/// # Errors
///
/// Returns `TemplateError::NotFound` if a `salt://` reference is not present
/// under any file root, escapes its root, or a local path doesn't exist.
pub fn resolve_source(config: &str, file_roots: &[PathBuf]) -> Result<PathBuf, TemplateError> {
    let Some(relative) = config.strip_prefix(FILESERVER_SCHEME) else {
        let path = PathBuf::from(config);
        if !path.is_file() {
            return Err(TemplateError::NotFound(config.to_string()));
        }
        return Ok(path);
    };

    let relative = Path::new(relative);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(TemplateError::NotFound(config.to_string()));
    }

    file_roots
        .iter()
        .map(|root| root.join(relative))
        .find(|candidate| candidate.is_file())
        .map(|found| {
            debug!(source = config, path = %found.display(), "resolved fileserver path");
            found
        })
        .ok_or_else(|| TemplateError::NotFound(config.to_string()))
}

/// Render template text.
///
/// # Errors
///
/// Returns `TemplateError::Render` on syntax or evaluation errors.
pub fn render_str(source: &str, ctx: &RenderContext<'_>) -> Result<String, TemplateError> {
    let env = Environment::new();
    let rendered = env.render_str(
        source,
        context! {
            minion_id => ctx.minion_id,
            grains => ctx.grains,
            opts => ctx.opts,
        },
    )?;
    Ok(rendered)
}

/// Read and render a template file.
///
/// # Errors
///
/// Returns `TemplateError::Read` if the file can't be read,
/// `TemplateError::Render` if rendering fails, or `TemplateError::Empty` if
/// the result is blank.
pub fn render_file(path: &Path, ctx: &RenderContext<'_>) -> Result<String, TemplateError> {
    debug!(path = %path.display(), "rendering mapping template");
    let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let rendered = render_str(&source, ctx)?;
    if rendered.trim().is_empty() {
        return Err(TemplateError::Empty(path.to_path_buf()));
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn with_ctx<T>(f: impl FnOnce(&RenderContext<'_>) -> T) -> T {
        let grains = json!({"role": "web"}).as_object().unwrap().clone();
        let settings = Settings::default();
        let ctx = RenderContext {
            minion_id: "web01",
            grains: &grains,
            opts: &settings,
        };
        f(&ctx)
    }

    #[test]
    fn test_render_str_exposes_context() {
        let out = with_ctx(|ctx| {
            render_str(
                "\"{{ minion_id }}\":\n  role: \"secret/{{ grains.role }}?name\"\n  url: {{ opts.url }}",
                ctx,
            )
        })
        .unwrap();
        assert!(out.contains("\"web01\":"));
        assert!(out.contains("secret/web?name"));
        assert!(out.contains("https://KVDN:8200"));
    }

    #[test]
    fn test_render_str_syntax_error() {
        let result = with_ctx(|ctx| render_str("{% if %}", ctx));
        assert!(matches!(result, Err(TemplateError::Render(_))));
    }

    #[test]
    fn test_render_file_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kvdn.yml");
        std::fs::write(&path, "{% if false %}x{% endif %}\n").unwrap();

        let result = with_ctx(|ctx| render_file(&path, ctx));
        assert!(matches!(result, Err(TemplateError::Empty(_))));
    }

    #[test]
    fn test_resolve_fileserver_path_searches_roots_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        std::fs::create_dir_all(second.path().join("pillar")).unwrap();
        std::fs::write(second.path().join("pillar/kvdn.yml"), "{}").unwrap();

        let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let found = resolve_source("salt://pillar/kvdn.yml", &roots).unwrap();
        assert_eq!(found, second.path().join("pillar/kvdn.yml"));

        std::fs::create_dir_all(first.path().join("pillar")).unwrap();
        std::fs::write(first.path().join("pillar/kvdn.yml"), "{}").unwrap();
        let found = resolve_source("salt://pillar/kvdn.yml", &roots).unwrap();
        assert_eq!(found, first.path().join("pillar/kvdn.yml"));
    }

    #[test]
    fn test_resolve_rejects_escapes_and_missing() {
        let root = TempDir::new().unwrap();
        let roots = vec![root.path().join("srv")];
        std::fs::write(root.path().join("secret.yml"), "{}").unwrap();

        assert!(resolve_source("salt://../secret.yml", &roots).is_err());
        assert!(resolve_source("salt://missing.yml", &roots).is_err());
        assert!(resolve_source("/nonexistent/kvdn.yml", &roots).is_err());
    }

    #[test]
    fn test_resolve_local_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("kvdn.yml");
        std::fs::write(&path, "{}").unwrap();

        let found = resolve_source(path.to_str().unwrap(), &[]).unwrap();
        assert_eq!(found, path);
    }
}
