//! Configuration for the GeoLLM service, its providers and the geocoder

use serde::{Deserialize, Serialize};
use log::{debug, info};

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const MISTRAL_API_BASE: &str = "https://api.mistral.ai/v1";
pub const OLLAMA_API_BASE: &str = "http://localhost:11434";
pub const NOMINATIM_API_BASE: &str
  = "https://nominatim.openstreetmap.org";

/// Supported model lists, by provider family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalogConfig
{   /// Names served by a hosted API
    pub remote: Vec<String>
  , /// Names served by a local Ollama instance
    pub local: Vec<String>
}

impl Default for ModelCatalogConfig
{   fn default() -> Self
    {   ModelCatalogConfig
        {   remote: vec![
              "gpt-4.1".to_string()
            , "gpt-4o-mini".to_string()
            , "gpt-4o".to_string()
            , "gpt-3.5-turbo".to_string()
            ]
          , local: vec![
              "qwen3".to_string()
            , "gemma".to_string()
            ]
        }
    }
}

/// Hosted provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteProviderConfig
{   /// API base URL
    pub api_base: String
  , /// Inline API key; takes precedence over `api_key_env`
    #[serde(default)]
    pub api_key: Option<String>
  , /// Environment variable holding the API key
    pub api_key_env: String
  , /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>
}

impl RemoteProviderConfig
{   fn hosted(api_base: &str, api_key_env: &str) -> Self
    {   RemoteProviderConfig
        {   api_base: api_base.to_string()
          , api_key: None
          , api_key_env: api_key_env.to_string()
          , timeout_secs: None
        }
    }

    /// Inline key first, then the environment
    pub fn resolve_api_key(&self) -> Option<String>
    {   if let Some(key) = &self.api_key
        {   return Some(key.clone());
        }
        std::env::var(&self.api_key_env)
          .ok()
          .filter(|k| !k.trim().is_empty())
    }
}

/// Local inference server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalProviderConfig
{   pub api_base: String
  , #[serde(default)]
    pub timeout_secs: Option<u64>
}

impl Default for LocalProviderConfig
{   fn default() -> Self
    {   LocalProviderConfig
        {   api_base: OLLAMA_API_BASE.to_string()
          , timeout_secs: None
        }
    }
}

/// Geocoder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocoderConfig
{   pub api_base: String
  , /// Sent as User-Agent; Nominatim rejects anonymous clients
    pub user_agent: String
  , /// Minimum delay between two lookups against one host
    pub min_interval_ms: u64
}

impl Default for GeocoderConfig
{   fn default() -> Self
    {   GeocoderConfig
        {   api_base: NOMINATIM_API_BASE.to_string()
          , user_agent: "geo_injector".to_string()
          , min_interval_ms: 500
        }
    }
}

/// GeoLLM configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoLlmConfig
{   /// Address the HTTP server binds to
    pub bind: String
  , pub models: ModelCatalogConfig
  , pub openai: RemoteProviderConfig
  , pub mistral: RemoteProviderConfig
  , pub ollama: LocalProviderConfig
  , pub geocoder: GeocoderConfig
}

impl Default for GeoLlmConfig
{   fn default() -> Self
    {   GeoLlmConfig
        {   bind: DEFAULT_BIND.to_string()
          , models: ModelCatalogConfig::default()
          , openai: RemoteProviderConfig::hosted(
              OPENAI_API_BASE, "OPENAI_API_KEY"
            )
          , mistral: RemoteProviderConfig::hosted(
              MISTRAL_API_BASE, "MISTRAL_API_KEY"
            )
          , ollama: LocalProviderConfig::default()
          , geocoder: GeocoderConfig::default()
        }
    }
}

impl GeoLlmConfig
{   /// Parse a JSON config; missing sections take their defaults
    pub fn from_json(text: &str)
      -> Result<Self, crate::error::Error>
    {   serde_json::from_str(text).map_err(|e| {
          crate::error::Error::InvalidConfiguration(e.to_string())
        })
    }

    /// Read a JSON config file
    pub fn from_file(path: &str)
      -> Result<Self, crate::error::Error>
    {   debug!("Reading config from {}", path);
        let text = std::fs::read_to_string(path).map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("{}: {}", path, e)
          )
        })?;
        Self::from_json(&text)
    }

    /// Defaults, then `GEOLLM_CONFIG` file, then env overrides
    pub fn load() -> Result<Self, crate::error::Error>
    {   let mut config = match std::env::var("GEOLLM_CONFIG")
        {   Ok(path) => {
              info!("Loading config file {}", path);
              Self::from_file(&path)?
            }
          , Err(_) => GeoLlmConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self)
    {   if let Ok(bind) = std::env::var("GEOLLM_BIND")
        {   self.bind = bind;
        }
        if let Ok(base) = std::env::var("OLLAMA_BASE_URL")
        {   self.ollama.api_base = base;
        }
        if let Ok(base) = std::env::var("NOMINATIM_BASE_URL")
        {   self.geocoder.api_base = base;
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn defaults_match_supported_lists()
    {   let config = GeoLlmConfig::default();
        assert_eq!(
          config.models.remote,
          vec!["gpt-4.1", "gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"]
        );
        assert_eq!(config.models.local, vec!["qwen3", "gemma"]);
        assert_eq!(config.geocoder.min_interval_ms, 500);
        assert_eq!(config.openai.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn partial_json_keeps_defaults()
    {   let config = GeoLlmConfig::from_json(
          r#"{ "bind": "0.0.0.0:9000",
               "models": { "remote": ["gpt-4o"], "local": [] } }"#
        ).unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.models.remote, vec!["gpt-4o"]);
        assert!(config.models.local.is_empty());
        assert_eq!(config.ollama.api_base, OLLAMA_API_BASE);
    }

    #[test]
    fn malformed_json_is_a_configuration_error()
    {   let err = GeoLlmConfig::from_json("{ bind").unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIGURATION");
    }

    #[test]
    fn inline_key_beats_environment()
    {   let mut remote = RemoteProviderConfig::hosted(
          OPENAI_API_BASE, "GEOLLM_TEST_UNSET_KEY_VAR"
        );
        assert_eq!(remote.resolve_api_key(), None);
        remote.api_key = Some("sk-inline".to_string());
        assert_eq!(remote.resolve_api_key().as_deref(), Some("sk-inline"));
    }
}
