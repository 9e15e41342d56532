//! Response envelope and error body returned to HTTP callers

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::RequestKind;

pub const SCHEMA_VERSION: &str = "0.1";

/// Request metadata echoed next to the data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta
{   pub query: String
  , pub geo_data_type: RequestKind
  , pub model_name: String
  , pub version: String
}

/// Final payload of one generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope
{   pub meta: Meta
  , pub data: Value
}

impl ApiEnvelope
{   pub fn build(
      query: &str
    , kind: RequestKind
    , model_name: &str
    , data: Value
    ) -> Self
    {   ApiEnvelope
        {   meta: Meta
            {   query: query.to_string()
              , geo_data_type: kind
              , model_name: model_name.to_string()
              , version: SCHEMA_VERSION.to_string()
            }
          , data
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail
{   pub code: String
  , pub message: String
  , pub hint: String
}

/// `{ok: false, error: {code, message, hint}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody
{   pub ok: bool
  , pub error: ErrorDetail
}

impl ErrorBody
{   pub fn from_error(err: &crate::error::Error) -> Self
    {   let hint = match err
        {   crate::error::Error::UnsupportedModel(_) => {
              "Use one of the supported models"
            }
          , crate::error::Error::MissingApiKey(_) => {
              "Set the provider API key on the server"
            }
          , _ => "Check the server logs"
        };
        ErrorBody
        {   ok: false
          , error: ErrorDetail
            {   code: err.code().to_string()
              , message: err.to_string()
              , hint: hint.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn envelope_layout()
    {   let envelope = ApiEnvelope::build(
          "Capital of France",
          RequestKind::InteractivePoint,
          "gpt-4o-mini",
          json!({ "places": [] })
        );
        assert_eq!(
          serde_json::to_value(&envelope).unwrap(),
          json!({
            "meta": {
              "query": "Capital of France",
              "geo_data_type": "interactive_point",
              "model_name": "gpt-4o-mini",
              "version": "0.1"
            },
            "data": { "places": [] }
          })
        );
    }

    #[test]
    fn identical_inputs_build_identical_envelopes()
    {   let data = json!({ "places": [{ "name": "Paris", "context": null }] });
        let a = ApiEnvelope::build(
          "q", RequestKind::InteractivePoint, "gemma", data.clone()
        );
        let b = ApiEnvelope::build(
          "q", RequestKind::InteractivePoint, "gemma", data
        );
        assert_eq!(a, b);
        assert_eq!(
          serde_json::to_string(&a).unwrap(),
          serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn unsupported_model_error_body()
    {   let body = ErrorBody::from_error(
          &crate::error::Error::UnsupportedModel("nope".to_string())
        );
        assert_eq!(
          serde_json::to_value(&body).unwrap(),
          json!({ "ok": false, "error": {
            "code": "UNSUPPORTED_MODEL",
            "message": "nope",
            "hint": "Use one of the supported models"
          }})
        );
    }
}
