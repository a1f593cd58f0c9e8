use shared::ChatRequest;

use crate::config::KeySource;
use crate::error::GatewayError;
use crate::gemini::{reply_text, GeminiClient, GenerateContentRequest};
use crate::prompt::build_prompt;

pub const NO_REPLY: &str = "no response from provider";

/// Validates a chat turn, makes the provider call and normalizes the outcome.
pub struct Gateway {
    provider: GeminiClient,
    api_key: KeySource,
}

impl Gateway {
    pub fn new(provider: GeminiClient, api_key: KeySource) -> Self {
        Self { provider, api_key }
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<String, GatewayError> {
        if request.message.is_empty() {
            return Err(GatewayError::Validation(
                "message should not be empty".to_string(),
            ));
        }

        let api_key = self
            .api_key
            .resolve()
            .ok_or_else(|| GatewayError::Configuration("api key is missing".to_string()))?;

        let prompt = build_prompt(&request.history, &request.message);
        tracing::debug!(
            turns = request.history.len(),
            image = request.image.is_some(),
            "sending prompt to provider"
        );
        let body = GenerateContentRequest::new(prompt, request.image);

        match self.provider.generate_content(&api_key, &body).await {
            Ok(response) => Ok(reply_text(&response).unwrap_or_else(|| {
                tracing::warn!("provider response had no candidate text");
                NO_REPLY.to_string()
            })),
            Err(e) => {
                match &e {
                    GatewayError::Upstream {
                        details: Some(details),
                        ..
                    } => tracing::error!("provider error: {}", details),
                    other => tracing::error!("provider error: {}", other),
                }
                Err(e)
            }
        }
    }
}
