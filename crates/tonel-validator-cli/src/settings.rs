use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tonel_validator_core::EngineSettings;

/// File-level configuration. Only the `[engine]` section is recognised.
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    #[serde(default)]
    engine: EngineSettings,
}

/// Resolve engine settings: config file, then environment, then `--engine`.
pub fn load_engine_settings(
    config_path: Option<&Path>,
    engine_override: Option<&str>,
) -> Result<EngineSettings> {
    let mut builder = config::Config::builder();
    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path).required(true));
    }
    let app: AppConfig = builder
        .build()
        .and_then(|cfg| cfg.try_deserialize())
        .with_context(|| match config_path {
            Some(path) => format!("failed to load configuration from {}", path.display()),
            None => "failed to build default configuration".to_string(),
        })?;

    let mut settings = app.engine.with_env_overrides();
    if let Some(program) = engine_override.filter(|p| !p.trim().is_empty()) {
        settings.program = program.to_string();
    }
    tracing::debug!(program = %settings.program, args = ?settings.args, "engine settings resolved");
    Ok(settings)
}
