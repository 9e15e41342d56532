use std::sync::Arc;
use serde_json::Value;
use log::{debug, info};

use crate::providers::{ModelHandle, StructuredModel};
use crate::registry::{Registry, RequestKind};
use crate::resolver::Resolver;

/// Structured generation over one resolved model.
///
/// Model errors are returned untouched; the model layer has already
/// coerced the answer into the registered schema.
#[derive(Debug)]
pub struct GeoClient<M = ModelHandle>
{   registry: Arc<Registry>
  , model: M
}

impl GeoClient<ModelHandle>
{   /// Resolve `model_name` up front; an unsupported name fails here,
    /// before any prompt is rendered.
    pub fn new(
      registry: Arc<Registry>
    , resolver: &Resolver
    , model_name: &str
    ) -> Result<Self, crate::error::Error>
    {   debug!("Creating GeoClient for model {}", model_name);
        let model = resolver.resolve(model_name)?;
        Ok(GeoClient { registry, model })
    }
}

impl<M: StructuredModel> GeoClient<M>
{   /// Use an already built model
    pub fn with_model(registry: Arc<Registry>, model: M) -> Self
    {   GeoClient { registry, model }
    }

    pub fn model(&self) -> &M
    {   &self.model
    }

    pub fn model_name(&self) -> &str
    {   self.model.model_name()
    }

    /// Ask the model for `kind`-shaped data answering `query`
    pub async fn generate(
      &self
    , query: &str
    , kind: RequestKind
    ) -> Result<Value, crate::error::Error>
    {   let schema = self.registry.schema_for(kind)?;
        let prompt = self.registry.prompt_for(kind, query)?;
        info!(
          "Generating {} data with {}",
          kind, self.model.model_name()
        );
        self.model.invoke(&prompt, schema).await
    }
}
