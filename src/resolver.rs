//! Model-name to backend resolution

use std::collections::HashMap;
use serde::Serialize;
use log::{debug, warn};

use crate::config::GeoLlmConfig;
use crate::providers::{
  LocalModel, ModelHandle, ProviderFamily, RemoteModel, RemoteProvider
};

/// The two supported lists plus a name -> family lookup.
///
/// The lookup is built local-first then remote, so a name present
/// in both lists resolves as remote.
#[derive(Debug, Clone, Serialize)]
pub struct ModelCatalog
{   remote: Vec<String>
  , local: Vec<String>
  , #[serde(skip)]
    families: HashMap<String, ProviderFamily>
}

impl ModelCatalog
{   pub fn new(remote: Vec<String>, local: Vec<String>) -> Self
    {   let mut families = HashMap::new();
        for name in &local
        {   families.insert(name.clone(), ProviderFamily::Local);
        }
        for name in &remote
        {   if families.insert(name.clone(), ProviderFamily::Remote)
              == Some(ProviderFamily::Local)
            {   debug!("{} is listed as remote and local; using remote", name);
            }
        }
        ModelCatalog { remote, local, families }
    }

    pub fn remote(&self) -> &[String]
    {   &self.remote
    }

    pub fn local(&self) -> &[String]
    {   &self.local
    }

    pub fn family_of(&self, model_name: &str) -> Option<ProviderFamily>
    {   self.families.get(model_name).copied()
    }

    /// The only diagnostic a caller gets for a bad model name,
    /// so it lists both catalogs in full.
    pub fn unsupported(&self) -> crate::error::Error
    {   crate::error::Error::UnsupportedModel(format!(
          "This model is not yet implemented. \
           Supported commercial models : {} \
           Supported Ollama models {}",
          quoted_list(&self.remote), quoted_list(&self.local)
        ))
    }
}

/// `['a', 'b']`
fn quoted_list(names: &[String]) -> String
{   let quoted: Vec<String>
      = names.iter().map(|n| format!("'{}'", n)).collect();
    format!("[{}]", quoted.join(", "))
}

impl Default for ModelCatalog
{   fn default() -> Self
    {   let lists = crate::config::ModelCatalogConfig::default();
        ModelCatalog::new(lists.remote, lists.local)
    }
}

/// Builds a fresh model handle per request. Fails closed.
#[derive(Debug, Clone)]
pub struct Resolver
{   catalog: ModelCatalog
  , openai: crate::config::RemoteProviderConfig
  , mistral: crate::config::RemoteProviderConfig
  , ollama: crate::config::LocalProviderConfig
  , http_client: reqwest::Client
}

impl Resolver
{   pub fn new(config: &GeoLlmConfig) -> Self
    {   Resolver::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(
      config: &GeoLlmConfig
    , http_client: reqwest::Client
    ) -> Self
    {   Resolver
        {   catalog: ModelCatalog::new(
              config.models.remote.clone()
            , config.models.local.clone()
            )
          , openai: config.openai.clone()
          , mistral: config.mistral.clone()
          , ollama: config.ollama.clone()
          , http_client
        }
    }

    pub fn catalog(&self) -> &ModelCatalog
    {   &self.catalog
    }

    pub fn resolve(&self, model_name: &str)
      -> Result<ModelHandle, crate::error::Error>
    {   match self.catalog.family_of(model_name)
        {   Some(ProviderFamily::Remote) => {
              let provider = RemoteProvider::detect(model_name)
                .ok_or_else(|| {
                  crate::error::Error::InvalidConfiguration(format!(
                    "cannot infer a provider for remote model {}",
                    model_name
                  ))
                })?;
              let config = match provider
              {   RemoteProvider::OpenAI => &self.openai
                , RemoteProvider::MistralAi => &self.mistral
              };
              debug!("Resolved {} to remote {}", model_name, provider);
              Ok(ModelHandle::Remote(RemoteModel::new(
                provider,
                model_name.to_string(),
                config,
                self.http_client.clone()
              )))
            }
          , Some(ProviderFamily::Local) => {
              debug!("Resolved {} to local", model_name);
              Ok(ModelHandle::Local(LocalModel::new(
                model_name.to_string(),
                &self.ollama,
                self.http_client.clone()
              )))
            }
          , None => {
              warn!("Unsupported model requested: {}", model_name);
              Err(self.catalog.unsupported())
            }
        }
    }
}
