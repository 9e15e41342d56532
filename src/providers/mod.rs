//! Model backends able to answer a prompt in a given shape

use std::fmt;
use std::future::Future;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::{error, trace};

use crate::schema::SchemaDescriptor;

pub mod ollama;
pub mod openai;

pub use ollama::LocalModel;
pub use openai::RemoteModel;

/// Anything that takes a prompt plus a target shape and returns a
/// conforming instance, or fails.
pub trait StructuredModel
{   /// Model identifier as the caller named it
    fn model_name(&self) -> &str;

    /// Run `prompt`, constraining the answer to `schema`
    fn invoke(
      &self
    , prompt: &str
    , schema: &SchemaDescriptor
    ) -> impl Future<Output = Result<Value, crate::error::Error>> + Send;
}

/// Class of backend behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily
{   /// Hosted API, key required
    Remote
  , /// Locally served, addressed by model name only
    Local
}

/// Hosted API vendors, inferred from the model name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RemoteProvider
{   OpenAI
  , MistralAi
}

impl RemoteProvider
{   /// Infer the vendor from the naming convention of `model`
    pub fn detect(model: &str) -> Option<RemoteProvider>
    {   const OPENAI: [&str; 5] = ["gpt-", "o1", "o3", "o4", "chatgpt-"];
        const MISTRAL: [&str; 5] = [
          "mistral-", "open-mistral", "codestral", "ministral", "pixtral"
        ];
        if OPENAI.iter().any(|p| model.starts_with(p))
        {   Some(RemoteProvider::OpenAI)
        } else if MISTRAL.iter().any(|p| model.starts_with(p))
        {   Some(RemoteProvider::MistralAi)
        } else
        {   None
        }
    }
}

impl fmt::Display for RemoteProvider
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   match self
        {   RemoteProvider::OpenAI => f.write_str("OpenAI")
          , RemoteProvider::MistralAi => f.write_str("Mistral")
        }
    }
}

/// A configured backend bound to one family and one model
#[derive(Debug, Clone)]
pub enum ModelHandle
{   Remote(RemoteModel)
  , Local(LocalModel)
}

impl ModelHandle
{   pub fn family(&self) -> ProviderFamily
    {   match self
        {   ModelHandle::Remote(_) => ProviderFamily::Remote
          , ModelHandle::Local(_) => ProviderFamily::Local
        }
    }
}

impl StructuredModel for ModelHandle
{   fn model_name(&self) -> &str
    {   match self
        {   ModelHandle::Remote(m) => m.model_name()
          , ModelHandle::Local(m) => m.model_name()
        }
    }

    async fn invoke(
      &self
    , prompt: &str
    , schema: &SchemaDescriptor
    ) -> Result<Value, crate::error::Error>
    {   match self
        {   ModelHandle::Remote(m) => m.invoke(prompt, schema).await
          , ModelHandle::Local(m) => m.invoke(prompt, schema).await
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

impl ChatMessage
{   pub fn user(content: &str) -> Self
    {   ChatMessage
        {   role: "user".to_string()
          , content: content.to_string()
        }
    }
}

/// Parse generated text as JSON and coerce it into `schema`
pub(crate) fn parse_structured(
  content: &str
, schema: &SchemaDescriptor
) -> Result<Value, crate::error::Error>
{   trace!("Structured content: {}", content);
    let value: Value = serde_json::from_str(content.trim())
      .map_err(|e| {
        error!("Model output is not JSON: {}", e);
        crate::error::Error::ParseError(e.to_string())
      })?;
    schema.coerce(value).map_err(|e| {
      error!("Model output does not fit {}: {}", schema.name, e);
      e
    })
}
