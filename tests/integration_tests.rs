use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use geollm::config::GeoLlmConfig;
use geollm::server::{router, AppState, ModelList};

/// Serve `app` on an ephemeral port, return its base URL
async fn spawn(app: Router) -> String
{   let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
      .await
      .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

// ===== Fake upstreams =====

async fn fake_chat_completions(
  headers: HeaderMap
, Json(body): Json<Value>
) -> (StatusCode, Json<Value>)
{   if headers.get("authorization").and_then(|v| v.to_str().ok())
      != Some("Bearer sk-test")
    {   return (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": { "message": "bad key" } }))
        );
    }
    if body["model"] == "gpt-4.1"
    {   return (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": { "message": "overloaded" } }))
        );
    }
    assert_eq!(body["response_format"]["type"], "json_schema");
    let prompt = body["messages"][0]["content"].as_str().unwrap_or("");
    let content = if prompt.contains("Capital of France")
    {   json!({ "places": [{ "name": "Paris", "context": "capital city" }] })
    } else if prompt.contains("Three French cities")
    {   json!({ "places": [
          { "name": "Paris", "context": null },
          { "name": "Lyon", "context": null },
          { "name": "Nice", "context": null }
        ]})
    } else
    {   json!({ "places": [] })
    };
    (
      StatusCode::OK,
      Json(json!({
        "choices": [{
          "index": 0,
          "message": { "role": "assistant", "content": content.to_string() },
          "finish_reason": "stop"
        }]
      }))
    )
}

async fn fake_ollama_chat(Json(body): Json<Value>) -> Json<Value>
{   assert_eq!(body["stream"], false);
    assert_eq!(body["format"]["type"], "object");
    Json(json!({
      "model": body["model"],
      "message": { "role": "assistant", "content": "{\"places\": []}" },
      "done": true
    }))
}

async fn fake_search(Query(params): Query<HashMap<String, String>>)
  -> Json<Value>
{   match params.get("q").map(String::as_str)
    {   Some("Paris") => Json(json!([
          { "lat": "48.85", "lon": "2.35", "display_name": "Paris, France" }
        ]))
      , _ => Json(json!([]))
    }
}

/// `fake_search` that also records when each lookup arrived
async fn timed_search(
  State(arrivals): State<Arc<Mutex<Vec<Instant>>>>
, query: Query<HashMap<String, String>>
) -> Json<Value>
{   arrivals.lock().unwrap().push(Instant::now());
    fake_search(query).await
}

async fn upstream() -> String
{   spawn(
      Router::new()
        .route("/v1/chat/completions", post(fake_chat_completions))
        .route("/api/chat", post(fake_ollama_chat))
        .route("/search", get(fake_search))
    ).await
}

fn test_config(upstream: &str) -> GeoLlmConfig
{   let mut config = GeoLlmConfig::default();
    config.openai.api_base = format!("{}/v1", upstream);
    config.openai.api_key = Some("sk-test".to_string());
    config.ollama.api_base = upstream.to_string();
    config.geocoder.api_base = upstream.to_string();
    config.geocoder.min_interval_ms = 0;
    config
}

async fn service(config: GeoLlmConfig) -> String
{   let state = AppState::from_config(&config).unwrap();
    spawn(router(state)).await
}

async fn generate(base: &str, query: &str, model: &str)
  -> (StatusCode, Value)
{   let response = reqwest::Client::new()
      .get(format!("{}/api/generate_geo_data", base))
      .query(&[("query", query), ("model_name", model)])
      .send()
      .await
      .unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap())
}

// ===== Tests =====

#[tokio::test]
async fn test_capital_of_france_is_geocoded()
{   let upstream = upstream().await;
    let base = service(test_config(&upstream)).await;

    let (status, body) = generate(&base, "Capital of France", "gpt-4o-mini")
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body,
      json!({
        "meta": {
          "query": "Capital of France",
          "geo_data_type": "interactive_point",
          "model_name": "gpt-4o-mini",
          "version": "0.1"
        },
        "data": { "places": [{
          "name": "Paris",
          "context": "capital city",
          "lat": 48.85,
          "lng": 2.35
        }]}
      })
    );
}

#[tokio::test]
async fn test_geocoding_calls_are_spaced()
{   let arrivals = Arc::new(Mutex::new(Vec::new()));
    let upstream = spawn(
      Router::new()
        .route("/v1/chat/completions", post(fake_chat_completions))
        .route("/search", get(timed_search))
        .with_state(arrivals.clone())
    ).await;
    let mut config = test_config(&upstream);
    config.geocoder.min_interval_ms = 100;
    let base = service(config).await;

    let (status, body) = generate(&base, "Three French cities", "gpt-4o")
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["places"][0]["lat"], 48.85);
    assert!(body["data"]["places"][1].get("lat").is_none());

    let arrivals = arrivals.lock().unwrap().clone();
    assert_eq!(arrivals.len(), 3);
    for pair in arrivals.windows(2)
    {   let gap = pair[1].duration_since(pair[0]);
        assert!(gap >= Duration::from_millis(80), "lookups {:?} apart", gap);
    }
    assert!(
      arrivals[2].duration_since(arrivals[0]) >= Duration::from_millis(180)
    );
}

#[tokio::test]
async fn test_unsupported_model_is_422()
{   let upstream = upstream().await;
    let base = service(test_config(&upstream)).await;

    let (status, body) = generate(&base, "Capital of France", "llama-unknown")
      .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_MODEL");
    assert_eq!(body["error"]["hint"], "Use one of the supported models");
    let message = body["error"]["message"].as_str().unwrap();
    for name in ["gpt-4.1", "gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo",
                 "qwen3", "gemma"]
    {   assert!(message.contains(name), "{} missing from {}", name, message);
    }
}

#[tokio::test]
async fn test_local_model_with_no_places()
{   let upstream = upstream().await;
    let base = service(test_config(&upstream)).await;

    let (status, body) = generate(&base, "Somewhere", "qwen3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["model_name"], "qwen3");
    assert_eq!(body["data"], json!({ "places": [] }));
}

#[tokio::test]
async fn test_provider_failure_is_500()
{   let upstream = upstream().await;
    let base = service(test_config(&upstream)).await;

    let (status, body) = generate(&base, "Capital of France", "gpt-4.1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "PROVIDER_ERROR");
}

#[tokio::test]
async fn test_missing_api_key_is_500()
{   let upstream = upstream().await;
    let mut config = test_config(&upstream);
    config.openai.api_key = None;
    config.openai.api_key_env = "GEOLLM_TEST_UNSET_KEY_VAR".to_string();
    let base = service(config).await;

    let (status, body) = generate(&base, "Capital of France", "gpt-4o").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "MISSING_API_KEY");
}

#[tokio::test]
async fn test_missing_parameter_is_422()
{   let upstream = upstream().await;
    let base = service(test_config(&upstream)).await;

    let response = reqwest::Client::new()
      .get(format!("{}/api/generate_geo_data", base))
      .query(&[("query", "Capital of France")])
      .send()
      .await
      .unwrap();
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_model_listing_and_health()
{   let upstream = upstream().await;
    let base = service(test_config(&upstream)).await;
    let http = reqwest::Client::new();

    let models: ModelList = http
      .get(format!("{}/api/models", base))
      .send()
      .await
      .unwrap()
      .json()
      .await
      .unwrap();
    assert_eq!(
      models.remote,
      vec!["gpt-4.1", "gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"]
    );
    assert_eq!(models.local, vec!["qwen3", "gemma"]);

    let health = http.get(format!("{}/healthz", base)).send().await.unwrap();
    assert!(health.status().is_success());
}
