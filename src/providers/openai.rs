use std::time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use log::{debug, trace, error};

use crate::providers::{ChatMessage, RemoteProvider, StructuredModel};
use crate::schema::SchemaDescriptor;

// ===== Message Types =====

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub response_format: Value
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse
{   pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: AssistantMessage
  , pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantMessage
{   #[serde(default)]
    pub content: Option<String>
  , #[serde(default)]
    pub refusal: Option<String>
}

/// `response_format` asking for strict schema-conforming JSON
pub fn json_schema_format(schema: &SchemaDescriptor) -> Value
{   json!({
      "type": "json_schema",
      "json_schema": {
        "name": schema.name,
        "strict": true,
        "schema": schema.to_json_schema()
      }
    })
}

// ===== Hosted Model =====

/// Model behind an OpenAI-compatible chat completions API
#[derive(Debug, Clone)]
pub struct RemoteModel
{   provider: RemoteProvider
  , model: String
  , api_base: String
  , api_key: Option<String>
  , timeout: Option<Duration>
  , http_client: reqwest::Client
}

impl RemoteModel
{   pub fn new(
      provider: RemoteProvider
    , model: String
    , config: &crate::config::RemoteProviderConfig
    , http_client: reqwest::Client
    ) -> Self
    {   debug!("Creating {} model handle for {}", provider, model);
        RemoteModel
        {   provider
          , model
          , api_base: config.api_base.trim_end_matches('/').to_string()
          , api_key: config.resolve_api_key()
          , timeout: config.timeout_secs.map(Duration::from_secs)
          , http_client
        }
    }

    pub fn provider(&self) -> RemoteProvider
    {   self.provider
    }

    fn api_key(&self) -> Result<&str, crate::error::Error>
    {   self.api_key.as_deref().ok_or_else(|| {
          error!("No API key for model: {}", self.model);
          crate::error::Error::MissingApiKey(
            format!("{}:{}", self.provider, self.model)
          )
        })
    }
}

impl StructuredModel for RemoteModel
{   fn model_name(&self) -> &str
    {   &self.model
    }

    async fn invoke(
      &self
    , prompt: &str
    , schema: &SchemaDescriptor
    ) -> Result<Value, crate::error::Error>
    {   debug!("Invoking {} model {}", self.provider, self.model);

        let api_key = self.api_key()?;

        let request = ChatCompletionRequest
        {   model: self.model.clone()
          , messages: vec![ChatMessage::user(prompt)]
          , response_format: json_schema_format(schema)
        };

        trace!("{} request: {:?}", self.provider, request);

        let mut builder = self.http_client
          .post(format!("{}/chat/completions", self.api_base))
          .header("Authorization", format!("Bearer {}", api_key))
          .header("Content-Type", "application/json")
          .json(&request);
        if let Some(timeout) = self.timeout
        {   builder = builder.timeout(timeout);
        }

        let response = builder
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::HttpError(e.to_string())
          })?;

        let status = response.status();
        trace!("{} response status: {}", self.provider, status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("{} API error: {}", self.provider, error_text);
            return Err(crate::error::Error::ApiError(
              format!("{} error ({}): {}", self.provider, status, error_text)
            ));
        }

        let chat_response: ChatCompletionResponse
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            crate::error::Error::ParseError(e.to_string())
          })?;

        let choice = chat_response.choices.into_iter().next()
          .ok_or_else(|| {
            error!("No choices in response");
            crate::error::Error::NoChoicesInResponse
          })?;

        if let Some(refusal) = choice.message.refusal
        {   error!("{} refused: {}", self.model, refusal);
            return Err(crate::error::Error::Validation(
              format!("model refused: {}", refusal)
            ));
        }

        let content = choice.message.content.ok_or_else(|| {
          crate::error::Error::Validation(format!(
            "empty completion (finish_reason: {})",
            choice.finish_reason.as_deref().unwrap_or("unknown")
          ))
        })?;

        crate::providers::parse_structured(&content, schema)
    }
}
