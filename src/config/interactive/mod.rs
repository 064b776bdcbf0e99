#[cfg(test)]
mod tests;

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, ModelConfig};

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 Visual Search Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir);

    eprintln!("{}", style("Model Server").bold().yellow());
    eprintln!("Configure the TensorFlow Serving instance hosting the feature model.");
    eprintln!();

    configure_model(&mut config.model)?;

    eprintln!();
    eprintln!("{}", style("Search Server").bold().yellow());
    configure_server(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_model_connection(&config.model) {
        eprintln!("{}", style("✓ Model server reachable!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not reach the model server").yellow()
        );
        eprintln!("You can continue, but make sure it is running before searching.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Server Settings:").bold().yellow());
    eprintln!("  Bind: {}", style(config.server.bind_address()).cyan());
    eprintln!(
        "  Catalog: {}",
        style(config.server.catalog_path.display()).cyan()
    );
    eprintln!("  Results: {}", style(config.server.results_limit).cyan());
    eprintln!(
        "  Upload Limit: {} bytes",
        style(config.server.max_upload_bytes).cyan()
    );
    eprintln!("  CORS: {}", style(config.server.enable_cors).cyan());

    eprintln!();
    eprintln!("{}", style("Model Settings:").bold().yellow());
    eprintln!("  Model: {}", style(&config.model.model).cyan());
    eprintln!(
        "  Output: {}",
        style(config.model.output.as_deref().unwrap_or("(single output)")).cyan()
    );
    eprintln!("  Input Size: {}px", style(config.model.input_size).cyan());
    eprintln!(
        "  Embedding Dimension: {}",
        style(config.model.embedding_dimension).cyan()
    );
    match config.model.base_url() {
        Ok(url) => eprintln!("  Model URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Model URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Generator Settings:").bold().yellow());
    eprintln!("  Concurrency: {}", style(config.generator.concurrency).cyan());
    eprintln!(
        "  Input: {}",
        style(config.generator.input_path.display()).cyan()
    );
    eprintln!(
        "  Output: {}",
        style(config.generator.output_path.display()).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Config {
    if config_dir.join("config.toml").exists() {
        if let Ok(config) = Config::load(config_dir) {
            eprintln!("{}", style("Found existing configuration.").green());
            return config;
        }
    }

    eprintln!(
        "{}",
        style("No existing configuration found. Using defaults.").yellow()
    );
    Config {
        base_dir: config_dir.to_path_buf(),
        ..Config::default()
    }
}

fn configure_model(model: &mut ModelConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == model.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Model server protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Model server host")
        .default(model.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = ModelConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..ModelConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Model server REST port")
        .default(model.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let name: String = Input::new()
        .with_prompt("Model name")
        .default(model.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(model.embedding_dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (1..=8192).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 1 and 8192")
            }
        })
        .interact_text()?;

    model.set_protocol(protocol)?;
    model.set_host(host)?;
    model.set_port(port)?;
    model.set_model(name)?;
    model.set_embedding_dimension(dimension)?;

    Ok(())
}

fn configure_server(config: &mut Config) -> Result<()> {
    let port: u16 = Input::new()
        .with_prompt("HTTP port")
        .default(config.server.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let catalog: String = Input::new()
        .with_prompt("Catalog file")
        .default(config.server.catalog_path.display().to_string())
        .interact_text()?;

    let concurrency: usize = Input::new()
        .with_prompt("Embedding generator concurrency")
        .default(config.generator.concurrency)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=64).contains(input) {
                Ok(())
            } else {
                Err("Concurrency must be between 1 and 64")
            }
        })
        .interact_text()?;

    config.server.port = port;
    config.server.catalog_path = catalog.into();
    config.generator.set_concurrency(concurrency)?;

    Ok(())
}

fn test_model_connection(model: &ModelConfig) -> bool {
    let Ok(base) = model.base_url() else {
        return false;
    };
    let Ok(url) = base.join(&format!("v1/models/{}", model.model)) else {
        return false;
    };

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(url.as_str()).call() {
        Ok(_) => true,
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => true,
        Err(_) => false,
    }
}
