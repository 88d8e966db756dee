// Configuration management module
// TOML settings for the embedding server, the hosted LLM and the data paths

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, DataConfig, LlmConfig, OllamaConfig, RetrievalConfig,
};
