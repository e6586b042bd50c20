pub mod analyze;
pub mod chat;
pub mod compare;
pub mod doctor;
pub mod onboard;

use std::sync::Arc;

use docportal_config::{AppConfig, ConfigError};
use docportal_core::Provider;

/// Accept the loaded config, failing early with setup hints when no API key
/// is available.
pub fn require_api_key(
    config: Result<AppConfig, ConfigError>,
) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = config.map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() && config.default_provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    DOCPORTAL_API_KEY = 'sk-...'   (generic)");
        eprintln!("    OPENAI_API_KEY    = 'sk-...'   (for OpenAI)");
        eprintln!("    GROQ_API_KEY      = 'gsk_...'  (for Groq)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_path().display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    Ok(config)
}

/// The default provider and the model to use with it.
pub fn default_provider(
    config: &AppConfig,
) -> Result<(Arc<dyn Provider>, String), Box<dyn std::error::Error>> {
    let router = docportal_providers::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;
    let model = config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone());
    Ok((provider, model))
}
