
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError, LlmConfig, OllamaConfig};
use crate::http::agent_with_timeout;

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!(
        "{}",
        style("🔧 Anime Recommender Configuration Setup").bold().cyan()
    );
    eprintln!();

    let mut config = load_existing_config(config_dir);

    eprintln!("{}", style("Ollama Configuration").bold().yellow());
    eprintln!("Configure your local Ollama instance for embedding generation.");
    eprintln!();

    configure_ollama(&mut config.ollama)?;

    eprintln!();
    eprintln!("{}", style("Language Model Configuration").bold().yellow());
    eprintln!("Configure the hosted model that writes the recommendations.");
    eprintln!();

    configure_llm(&mut config.llm)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_ollama_connection(&config.ollama) {
        eprintln!("{}", style("✓ Ollama connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to Ollama").yellow()
        );
        eprintln!("You can continue, but make sure Ollama is running before building the index.");
    }

    match config.llm.api_key() {
        Ok(_) => eprintln!(
            "{}",
            style(format!("✓ {} is set", config.llm.api_key_env)).green()
        ),
        Err(e) => eprintln!("{}", style(format!("⚠ Warning: {}", e)).yellow()),
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
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    for (section, lines) in config_summary(&config) {
        eprintln!("{}", style(section).bold().yellow());
        for (label, value) in lines {
            eprintln!("  {}: {}", label, style(value).cyan());
        }
        eprintln!();
    }

    eprintln!("Config file: {}", style(config.config_file_path().display()).dim());

    Ok(())
}

/// Labelled values shown by `config --show`, grouped by section
fn config_summary(config: &Config) -> Vec<(&'static str, Vec<(&'static str, String)>)> {
    let ollama_url = config
        .ollama_url()
        .map_or_else(|e| format!("Invalid ({})", e), |url| url.to_string());
    let api_key_status = if config.llm.api_key().is_ok() {
        "set".to_string()
    } else {
        "missing".to_string()
    };

    vec![
        (
            "Ollama Settings:",
            vec![
                ("URL", ollama_url),
                ("Model", config.ollama.model.clone()),
                ("Batch Size", config.ollama.batch_size.to_string()),
                (
                    "Embedding Dimension",
                    config.ollama.embedding_dimension.to_string(),
                ),
            ],
        ),
        (
            "LLM Settings:",
            vec![
                ("Base URL", config.llm.base_url.clone()),
                ("Model", config.llm.model.clone()),
                ("Temperature", crate::llm::groq::TEMPERATURE.to_string()),
                (
                    "API Key",
                    format!("{} ({})", config.llm.api_key_env, api_key_status),
                ),
            ],
        ),
        (
            "Retrieval:",
            vec![
                ("Chunk Size", config.chunking.chunk_size.to_string()),
                ("Chunk Overlap", config.chunking.chunk_overlap.to_string()),
                ("Top K", config.retrieval.top_k.to_string()),
                (
                    "Max Context Documents",
                    config.retrieval.max_context_docs.to_string(),
                ),
            ],
        ),
        (
            "Data:",
            vec![
                ("Raw CSV", config.raw_csv_path().display().to_string()),
                (
                    "Processed CSV",
                    config.processed_csv_path().display().to_string(),
                ),
                (
                    "Vector Index",
                    config.vector_database_path().display().to_string(),
                ),
            ],
        ),
    ]
}

fn load_existing_config(config_dir: &Path) -> Config {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No valid configuration found. Using defaults.").yellow()
            );
            Config {
                base_dir: config_dir.to_path_buf(),
                ..Config::default()
            }
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            config
        },
    )
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let embedding_dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(ollama.embedding_dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (64..=4096).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 64 and 4096")
            }
        })
        .interact_text()?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;
    ollama.set_model(model)?;
    ollama.set_embedding_dimension(embedding_dimension)?;

    Ok(())
}

fn configure_llm(llm: &mut LlmConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("LLM base URL")
        .default(llm.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            LlmConfig {
                base_url: input.clone(),
                ..LlmConfig::default()
            }
            .validate()
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("LLM model")
        .default(llm.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let api_key_env: String = Input::new()
        .with_prompt("Environment variable holding the API key")
        .default(llm.api_key_env.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Variable name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    llm.set_base_url(base_url)?;
    llm.set_model(model)?;
    llm.api_key_env = api_key_env.trim().to_string();

    Ok(())
}

fn test_ollama_connection(ollama: &OllamaConfig) -> bool {
    let url = format!(
        "{}://{}:{}/api/version",
        ollama.protocol, ollama.host, ollama.port
    );

    let agent = agent_with_timeout(Duration::from_secs(5));

    match agent.get(&url).call() {
        Ok(_) => true,
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => true,
        Err(_) => false,
    }
}
