pub mod error;
pub mod config;
pub mod schema;
pub mod registry;
pub mod providers;
pub mod resolver;
pub mod client;
pub mod throttle;
pub mod geocode;
pub mod envelope;
pub mod server;

/*

geollm: ask a language model which places answer a question,
geocode them, and hand back a versioned JSON envelope.

geollm/
├── src/
│   ├── lib.rs          # Re-exports
│   ├── main.rs         # HTTP server binary
│   ├── error.rs        # Error type and HTTP error codes
│   ├── config.rs       # Service, provider and geocoder configuration
│   ├── schema.rs       # Output shape descriptors + coercion
│   ├── registry.rs     # RequestKind -> (prompt, schema)
│   ├── providers/      # Model backends
│   │   ├── mod.rs      # StructuredModel trait, ModelHandle
│   │   ├── openai.rs   # Hosted, OpenAI-compatible (OpenAI, Mistral)
│   │   └── ollama.rs   # Locally served
│   ├── resolver.rs     # Model name -> ModelHandle
│   ├── client.rs       # Structured generation
│   ├── throttle.rs     # Per-host minimum interval
│   ├── geocode.rs      # Nominatim lookups, payload enrichment
│   ├── envelope.rs     # Response envelope, error body
│   └── server.rs       # axum routes
└── tests/              # HTTP-level tests against fake upstreams

*/

pub use client::GeoClient;
pub use config::GeoLlmConfig;
pub use envelope::{ApiEnvelope, ErrorBody, Meta, SCHEMA_VERSION};
pub use error::{Error, Result};
pub use geocode::{Coordinates, Geocoder, Nominatim, Place};
pub use providers::{ModelHandle, ProviderFamily, StructuredModel};
pub use registry::{PromptTemplate, Registry, RequestKind};
pub use resolver::{ModelCatalog, Resolver};
pub use schema::SchemaDescriptor;
