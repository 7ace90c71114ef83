//! Explicit client configuration.
//!
//! Credentials are read once, at startup, into configuration objects that are
//! handed to client constructors. `from_env` helpers load a `.env` file when
//! present (via `dotenvy`) and fail with the name of the missing variable.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("environment variable {name} is not set")]
    #[diagnostic(
        code(relaygraph::clients::missing_var),
        help("Set the variable in the environment or in a .env file.")
    )]
    MissingVar { name: &'static str },
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar { name })
}

/// Configuration for the chat-completions client.
#[derive(Clone, Debug)]
pub struct CompletionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Bounded retries against transient transport failures. Retries stay
    /// inside the client, so a retried call never double-appends to state.
    pub max_retries: u32,
}

impl CompletionConfig {
    /// Defaults matching the DeepSeek chat-completions endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-chat".to_string(),
            temperature: 0.0,
            max_tokens: None,
            max_retries: 2,
        }
    }

    /// Reads `DEEPSEEK_API_KEY` from the environment (loading `.env` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Ok(Self::new(required_var("DEEPSEEK_API_KEY")?))
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Configuration for the web-search client.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub api_key: String,
    pub base_url: String,
    pub engine: String,
}

impl SearchConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://serpapi.com/search".to_string(),
            engine: "google".to_string(),
        }
    }

    /// Reads `SERP_API_KEY` from the environment (loading `.env` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Ok(Self::new(required_var("SERP_API_KEY")?))
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }
}
