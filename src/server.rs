//! HTTP boundary: one generation endpoint plus model listing

use std::sync::Arc;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use log::{error, info};

use crate::client::GeoClient;
use crate::config::GeoLlmConfig;
use crate::envelope::{ApiEnvelope, ErrorBody, ErrorDetail};
use crate::geocode::{enrich_places, Geocoder, Nominatim};
use crate::providers::StructuredModel;
use crate::registry::{Registry, RequestKind};
use crate::resolver::Resolver;

/// Request kind served by the generation endpoint
pub const SERVED_KIND: RequestKind = RequestKind::InteractivePoint;

/// Shared, read-only state handed to every request
#[derive(Clone)]
pub struct AppState
{   pub registry: Arc<Registry>
  , pub resolver: Arc<Resolver>
  , pub geocoder: Nominatim
}

impl AppState
{   pub fn from_config(config: &GeoLlmConfig)
      -> Result<Self, crate::error::Error>
    {   let http_client = reqwest::Client::new();
        Ok(AppState
        {   registry: Arc::new(Registry::builtin())
          , resolver: Arc::new(Resolver::with_client(
              config, http_client.clone()
            ))
          , geocoder: Nominatim::new(&config.geocoder, http_client)?
        })
    }
}

/// Generate, geocode, wrap. Nothing is returned if generation fails;
/// geocoding misses only drop coordinates.
pub async fn answer<M, G>(
  client: &GeoClient<M>
, geocoder: &G
, query: &str
, kind: RequestKind
) -> Result<ApiEnvelope, crate::error::Error>
where
  M: StructuredModel
, G: Geocoder
{   let mut data = client.generate(query, kind).await?;
    enrich_places(geocoder, &mut data).await;
    Ok(ApiEnvelope::build(query, kind, client.model_name(), data))
}

/// Error leaving the HTTP layer
pub struct ApiError(pub crate::error::Error);

impl IntoResponse for ApiError
{   fn into_response(self) -> Response
    {   let status = match self.0
        {   crate::error::Error::UnsupportedModel(_) => {
              StatusCode::UNPROCESSABLE_ENTITY
            }
          , _ => {
              error!("Request failed: {}", self.0);
              StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody::from_error(&self.0))).into_response()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateParams
{   pub query: String
  , pub model_name: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelList
{   pub remote: Vec<String>
  , pub local: Vec<String>
}

pub fn router(state: AppState) -> Router
{   Router::new()
      .route("/api/generate_geo_data", get(generate_geo_data))
      .route("/api/models", get(list_models))
      .route("/healthz", get(healthz))
      .with_state(state)
}

async fn generate_geo_data(
  State(state): State<AppState>
, params: Result<Query<GenerateParams>, QueryRejection>
) -> Result<Json<ApiEnvelope>, Response>
{   let Query(params) = params.map_err(|rejection| {
      let body = ErrorBody
      {   ok: false
        , error: ErrorDetail
          {   code: "INVALID_REQUEST".to_string()
            , message: rejection.body_text()
            , hint: "Pass both query and model_name".to_string()
          }
      };
      (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    })?;

    info!(
      "Received query: {} with model name {}",
      params.query, params.model_name
    );

    let client = GeoClient::new(
      state.registry.clone(), &state.resolver, &params.model_name
    ).map_err(|e| ApiError(e).into_response())?;

    answer(&client, &state.geocoder, &params.query, SERVED_KIND)
      .await
      .map(Json)
      .map_err(|e| ApiError(e).into_response())
}

async fn list_models(State(state): State<AppState>) -> Json<ModelList>
{   let catalog = state.resolver.catalog();
    Json(ModelList
    {   remote: catalog.remote().to_vec()
      , local: catalog.local().to_vec()
    })
}

async fn healthz() -> StatusCode
{   StatusCode::OK
}

/// Bind `config.bind` and serve until the process exits
pub async fn serve(config: GeoLlmConfig)
  -> Result<(), crate::error::Error>
{   let state = AppState::from_config(&config)?;
    let listener = tokio::net::TcpListener::bind(&config.bind)
      .await
      .map_err(|e| {
        crate::error::Error::InvalidConfiguration(
          format!("failed to bind {}: {}", config.bind, e)
        )
      })?;
    info!("GeoLLM listening on http://{}", config.bind);
    axum::serve(listener, router(state))
      .await
      .map_err(|e| crate::error::Error::Other(e.to_string()))
}
