use anyhow::{bail, Context, Result};
use async_openai::{config::OpenAIConfig, Client as OpenAIClient};
use ollama_rs::Ollama;
use std::env;
use url::Url;

use crate::dedup::{self, SelectorConfig};
use crate::gdelt::DEFAULT_GDELT_BASE_URL;
use crate::LLMClient;

const DEFAULT_PORT: u16 = 5001;
const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1";
const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Process configuration, read once at startup and held for the process
/// lifetime. The clients are stateless and need no teardown.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub gdelt_base_url: Url,
    pub llm_client: LLMClient,
    pub model: String,
    pub temperature: f32,
    pub selector: SelectorConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let gdelt_base_url = env::var("GDELT_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GDELT_BASE_URL.to_string());
        let gdelt_base_url =
            Url::parse(&gdelt_base_url).context("GDELT_BASE_URL is not a valid URL")?;

        let provider = env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let (llm_client, default_model) = match provider.as_str() {
            "openai" => {
                let api_key = env::var("OPENAI_API_KEY")
                    .context("OPENAI_API_KEY must be set when LLM_PROVIDER=openai")?;
                let config = OpenAIConfig::new().with_api_key(api_key);
                (
                    LLMClient::OpenAI(OpenAIClient::with_config(config)),
                    DEFAULT_OPENAI_MODEL,
                )
            }
            "ollama" => {
                let host =
                    env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost".to_string());
                let ollama_port = env::var("OLLAMA_PORT")
                    .ok()
                    .and_then(|p| p.parse::<u16>().ok())
                    .unwrap_or(11434);
                (
                    LLMClient::Ollama(Ollama::new(host, ollama_port)),
                    DEFAULT_OLLAMA_MODEL,
                )
            }
            other => bail!("Unsupported LLM_PROVIDER: {}", other),
        };

        let model = env::var("LLM_MODEL").unwrap_or_else(|_| default_model.to_string());
        let temperature = env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|t| t.parse::<f32>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        let max_articles = env::var("NEWS_MAX_ARTICLES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(dedup::DEFAULT_MAX_ARTICLES);
        let similarity_threshold = env::var("TITLE_SIMILARITY_THRESHOLD")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(dedup::DEFAULT_SIMILARITY_THRESHOLD);
        let selector = SelectorConfig::new(max_articles, similarity_threshold)
            .context("TITLE_SIMILARITY_THRESHOLD is out of range")?;

        Ok(Self {
            port,
            gdelt_base_url,
            llm_client,
            model,
            temperature,
            selector,
        })
    }
}
