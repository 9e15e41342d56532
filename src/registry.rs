//! Request kinds and their (prompt, schema) registrations

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use log::debug;

use crate::schema::{FieldSpec, FieldType, SchemaDescriptor};

/// Shape of geographic answer a caller wants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind
{   /// Set of point locations
    InteractivePoint
  , /// Routes between places
    FlowRoute
  , /// Events placed in time
    Timeline
  , /// Region-colored map
    Choropleth
}

impl RequestKind
{   pub const ALL: [RequestKind; 4] = [
      RequestKind::InteractivePoint
    , RequestKind::FlowRoute
    , RequestKind::Timeline
    , RequestKind::Choropleth
    ];

    pub fn as_str(&self) -> &'static str
    {   match self
        {   RequestKind::InteractivePoint => "interactive_point"
          , RequestKind::FlowRoute => "flow_route"
          , RequestKind::Timeline => "timeline"
          , RequestKind::Choropleth => "choropleth"
        }
    }
}

impl fmt::Display for RequestKind
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.as_str())
    }
}

/// Prompt text with a single `{query}` slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate(&'static str);

impl PromptTemplate
{   pub const SLOT: &'static str = "{query}";

    pub const fn new(template: &'static str) -> Self
    {   PromptTemplate(template)
    }

    pub fn render(&self, query: &str) -> String
    {   self.0.replacen(Self::SLOT, query, 1)
    }
}

pub const INTERACTIVE_POINT_PROMPT: PromptTemplate = PromptTemplate::new(
  "Find *modern geographic locations* names for the locations \
   which can answer user's query. User Query : {query}"
);

/// Place as the model reports it, before geocoding
pub fn place_schema() -> SchemaDescriptor
{   SchemaDescriptor::new("Place", vec![
      FieldSpec::required(
        "name", "Modern place name", FieldType::String
      )
    , FieldSpec::optional(
        "context",
        "Short description of why it's relevant",
        FieldType::String
      )
    ])
}

pub fn interactive_point_schema() -> SchemaDescriptor
{   SchemaDescriptor::new("InteractivePointSchema", vec![
      FieldSpec::required(
        "places",
        "Places that answer the query",
        FieldType::Array(Box::new(FieldType::Object(place_schema())))
      ).with_default(json!([]))
    ])
}

/// Immutable kind -> prompt / schema mapping, built once at startup
/// and shared by every client.
#[derive(Debug, Clone, Default)]
pub struct Registry
{   prompts: HashMap<RequestKind, PromptTemplate>
  , schemas: HashMap<RequestKind, SchemaDescriptor>
}

impl Registry
{   /// Registry with every implemented kind wired in
    pub fn builtin() -> Self
    {   Registry::default()
          .with_prompt(
            RequestKind::InteractivePoint, INTERACTIVE_POINT_PROMPT
          )
          .with_schema(
            RequestKind::InteractivePoint, interactive_point_schema()
          )
    }

    pub fn with_prompt(
      mut self
    , kind: RequestKind
    , template: PromptTemplate
    ) -> Self
    {   self.prompts.insert(kind, template);
        self
    }

    pub fn with_schema(
      mut self
    , kind: RequestKind
    , schema: SchemaDescriptor
    ) -> Self
    {   self.schemas.insert(kind, schema);
        self
    }

    /// Render the kind's prompt around the user query
    pub fn prompt_for(&self, kind: RequestKind, query: &str)
      -> Result<String, crate::error::Error>
    {   debug!("Rendering prompt for {}", kind);
        self.prompts.get(&kind)
          .map(|t| t.render(query))
          .ok_or_else(|| {
            crate::error::Error::Registration(
              format!("No prompt registered for {}", kind)
            )
          })
    }

    pub fn schema_for(&self, kind: RequestKind)
      -> Result<&SchemaDescriptor, crate::error::Error>
    {   self.schemas.get(&kind).ok_or_else(|| {
          crate::error::Error::Registration(
            format!("No schema registered for {}", kind)
          )
        })
    }
}
