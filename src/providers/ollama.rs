//! Locally served models through the Ollama chat API

use std::time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::{debug, trace, error};

use crate::providers::{ChatMessage, StructuredModel};
use crate::schema::SchemaDescriptor;

#[derive(Debug, Clone, Serialize)]
pub struct OllamaChatRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub stream: bool
  , /// JSON schema the answer is constrained to
    pub format: Value
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaChatResponse
{   pub message: ChatMessage
  , #[serde(default)]
    pub done: bool
}

#[derive(Debug, Clone)]
pub struct LocalModel
{   model: String
  , api_base: String
  , timeout: Option<Duration>
  , http_client: reqwest::Client
}

impl LocalModel
{   pub fn new(
      model: String
    , config: &crate::config::LocalProviderConfig
    , http_client: reqwest::Client
    ) -> Self
    {   debug!("Creating local model handle for {}", model);
        LocalModel
        {   model
          , api_base: config.api_base.trim_end_matches('/').to_string()
          , timeout: config.timeout_secs.map(Duration::from_secs)
          , http_client
        }
    }
}

impl StructuredModel for LocalModel
{   fn model_name(&self) -> &str
    {   &self.model
    }

    async fn invoke(
      &self
    , prompt: &str
    , schema: &SchemaDescriptor
    ) -> Result<Value, crate::error::Error>
    {   debug!("Invoking local model {}", self.model);

        let request = OllamaChatRequest
        {   model: self.model.clone()
          , messages: vec![ChatMessage::user(prompt)]
          , stream: false
          , format: schema.to_json_schema()
        };

        trace!("Ollama request: {:?}", request);

        let mut builder = self.http_client
          .post(format!("{}/api/chat", self.api_base))
          .json(&request);
        if let Some(timeout) = self.timeout
        {   builder = builder.timeout(timeout);
        }

        let response = builder
          .send()
          .await
          .map_err(|e| {
            error!("Ollama unreachable at {}: {}", self.api_base, e);
            crate::error::Error::HttpError(e.to_string())
          })?;

        let status = response.status();
        trace!("Ollama response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("Ollama error: {}", error_text);
            return Err(crate::error::Error::ApiError(
              format!("Ollama error ({}): {}", status, error_text)
            ));
        }

        let chat_response: OllamaChatResponse
          = response.json().await.map_err(|e| {
            error!("Parse error: {}", e);
            crate::error::Error::ParseError(e.to_string())
          })?;

        if !chat_response.done
        {   debug!("Ollama reported an unfinished generation");
        }

        crate::providers::parse_structured(
          &chat_response.message.content, schema
        )
    }
}
