//! `docportal doctor`: Diagnose configuration and provider health.

use docportal_config::{AppConfig, ConfigError};

pub async fn run(config: Result<AppConfig, ConfigError>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 DocPortal Doctor — System Diagnostics");
    println!("=======================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_path();
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file — using defaults (run `docportal onboard`)");
        issues += 1;
    }

    let config = match config {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  {} issue(s) found. See above for details.", issues + 1);
            return Ok(());
        }
    };

    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!("  ⚠️  No API key configured — set DOCPORTAL_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    println!(
        "  ℹ️  Conditioning: head {} / tail {} chars",
        config.conditioning.head_chars, config.conditioning.tail_chars
    );

    let (provider, model) = super::default_provider(&config)?;
    match provider.health_check().await {
        Ok(true) => {
            println!("  ✅ Provider '{}' reachable", provider.name());
            match provider.list_models().await {
                Ok(models) if models.iter().any(|m| m == &model) => {
                    println!("  ✅ Model '{model}' available");
                }
                Ok(models) if models.is_empty() => {
                    println!("  ℹ️  Provider did not list models; assuming '{model}' exists");
                }
                Ok(models) => {
                    println!(
                        "  ⚠️  Model '{model}' not among {} listed models",
                        models.len()
                    );
                    issues += 1;
                }
                Err(e) => {
                    println!("  ⚠️  Could not list models: {e}");
                    issues += 1;
                }
            }
        }
        Ok(false) => {
            println!("  ❌ Provider '{}' rejected the health check", provider.name());
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
