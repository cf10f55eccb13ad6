use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use ollama_rs::generation::completion::request::GenerationRequest;
use ollama_rs::generation::options::GenerationOptions;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum SummarizationError {
    #[error("language model request timed out after {}s", GENERATION_TIMEOUT.as_secs())]
    Timeout,
    #[error("language model request failed: {0}")]
    Api(String),
    #[error("language model returned an empty completion")]
    EmptyCompletion,
}

impl SummarizationError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SummarizationError::Timeout | SummarizationError::Api(_))
    }
}

/// Sends one completion request to the configured model and returns the
/// trimmed response text.
pub async fn generate_llm_response(
    prompt: &str,
    max_tokens: u32,
    params: &LLMParams,
) -> Result<String, SummarizationError> {
    debug!(target: TARGET_LLM_REQUEST, "Sending LLM request of {} prompt chars", prompt.len());

    let response_text = match &params.llm_client {
        LLMClient::Ollama(ollama) => {
            let mut request = GenerationRequest::new(params.model.clone(), prompt.to_string());
            request.options = Some(
                GenerationOptions::default()
                    .temperature(params.temperature)
                    .num_predict(max_tokens as i32),
            );

            match timeout(GENERATION_TIMEOUT, ollama.generate(request)).await {
                Ok(Ok(response)) => response.response,
                Ok(Err(e)) => {
                    warn!(target: TARGET_LLM_REQUEST, "Error generating response: {}", e);
                    return Err(SummarizationError::Api(e.to_string()));
                }
                Err(_) => {
                    error!(target: TARGET_LLM_REQUEST, "LLM request timed out");
                    return Err(SummarizationError::Timeout);
                }
            }
        }
        LLMClient::OpenAI(client) => {
            let message = ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| SummarizationError::Api(e.to_string()))?;
            let request = CreateChatCompletionRequestArgs::default()
                .model(params.model.clone())
                .messages([message.into()])
                .max_tokens(max_tokens)
                .temperature(params.temperature)
                .build()
                .map_err(|e| SummarizationError::Api(e.to_string()))?;

            match timeout(GENERATION_TIMEOUT, client.chat().create(request)).await {
                Ok(Ok(response)) => response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .unwrap_or_default(),
                Ok(Err(e)) => {
                    warn!(target: TARGET_LLM_REQUEST, "Error generating response: {}", e);
                    return Err(SummarizationError::Api(e.to_string()));
                }
                Err(_) => {
                    error!(target: TARGET_LLM_REQUEST, "LLM request timed out");
                    return Err(SummarizationError::Timeout);
                }
            }
        }
    };

    let response_text = response_text.trim().to_string();
    if response_text.is_empty() {
        error!(target: TARGET_LLM_REQUEST, "No response text in completion");
        return Err(SummarizationError::EmptyCompletion);
    }

    debug!(target: TARGET_LLM_REQUEST, "LLM response received ({} chars)", response_text.len());
    Ok(response_text)
}
