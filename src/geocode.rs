//! Place-name geocoding and enrichment of generated payloads

use std::future::Future;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use log::{debug, trace, warn};

use crate::throttle::Throttle;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates
{   pub lat: f64
  , pub lng: f64
}

/// One named location; coordinates only after a successful lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place
{   pub name: String
  , #[serde(default)]
    pub context: Option<String>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>
}

impl Place
{   /// Places of an interactive-point payload; empty when absent
    pub fn from_payload(payload: &Value)
      -> Result<Vec<Place>, crate::error::Error>
    {   match payload.get("places")
        {   Some(places) => serde_json::from_value(places.clone())
              .map_err(|e| crate::error::Error::ParseError(e.to_string()))
          , None => Ok(vec![])
        }
    }

    pub fn locate(&mut self, coords: Coordinates)
    {   self.lat = Some(coords.lat);
        self.lng = Some(coords.lng);
    }
}

/// Free-text place name to coordinates; `None` means not found
pub trait Geocoder
{   fn geocode(&self, name: &str)
      -> impl Future<Output = Result<Option<Coordinates>, crate::error::Error>>
         + Send;
}

#[derive(Debug, Deserialize)]
struct NominatimHit
{   lat: String
  , lon: String
}

/// OpenStreetMap Nominatim search, throttled per host
#[derive(Debug, Clone)]
pub struct Nominatim
{   api_base: String
  , host: String
  , user_agent: String
  , http_client: reqwest::Client
  , throttle: Arc<Throttle>
}

impl Nominatim
{   pub fn new(
      config: &crate::config::GeocoderConfig
    , http_client: reqwest::Client
    ) -> Result<Self, crate::error::Error>
    {   let throttle = Arc::new(
          Throttle::from_millis(config.min_interval_ms)
        );
        Nominatim::with_throttle(config, http_client, throttle)
    }

    /// Share `throttle` with other geocoders hitting the same hosts
    pub fn with_throttle(
      config: &crate::config::GeocoderConfig
    , http_client: reqwest::Client
    , throttle: Arc<Throttle>
    ) -> Result<Self, crate::error::Error>
    {   let api_base = config.api_base.trim_end_matches('/').to_string();
        let host = reqwest::Url::parse(&api_base)
          .ok()
          .and_then(|u| u.host_str().map(str::to_string))
          .ok_or_else(|| {
            crate::error::Error::InvalidConfiguration(
              format!("geocoder base URL has no host: {}", api_base)
            )
          })?;
        Ok(Nominatim
        {   api_base
          , host
          , user_agent: config.user_agent.clone()
          , http_client
          , throttle
        })
    }
}

impl Geocoder for Nominatim
{   async fn geocode(&self, name: &str)
      -> Result<Option<Coordinates>, crate::error::Error>
    {   self.throttle.acquire(&self.host).await;
        debug!("Geocoding {}", name);

        let response = self.http_client
          .get(format!("{}/search", self.api_base))
          .header("User-Agent", &self.user_agent)
          .query(&[("q", name), ("format", "json"), ("limit", "1")])
          .send()
          .await
          .map_err(|e| crate::error::Error::HttpError(e.to_string()))?;

        let status = response.status();
        trace!("Nominatim response status: {}", status);
        if !status.is_success()
        {   return Err(crate::error::Error::ApiError(
              format!("Nominatim error ({})", status)
            ));
        }

        let hits: Vec<NominatimHit> = response.json().await
          .map_err(|e| crate::error::Error::ParseError(e.to_string()))?;

        match hits.first()
        {   Some(hit) => {
              let lat = hit.lat.parse::<f64>();
              let lng = hit.lon.parse::<f64>();
              match (lat, lng)
              {   (Ok(lat), Ok(lng)) => Ok(Some(Coordinates { lat, lng }))
                , _ => Err(crate::error::Error::ParseError(format!(
                    "bad coordinates {:?},{:?}", hit.lat, hit.lon
                  )))
              }
            }
          , None => Ok(None)
        }
    }
}

/// Add `lat`/`lng` to every place the geocoder can find.
///
/// Misses and lookup failures leave that place without coordinates;
/// the payload as a whole always survives.
pub async fn enrich_places<G: Geocoder>(geocoder: &G, payload: &mut Value)
{   let mut places = match Place::from_payload(payload)
    {   Ok(places) => places
      , Err(e) => {
          warn!("Payload places are not geocodable: {}", e);
          return;
        }
    };
    if places.is_empty()
    {   return;
    }

    for place in places.iter_mut()
    {   match geocoder.geocode(&place.name).await
        {   Ok(Some(coords)) => place.locate(coords)
          , Ok(None) => {
              debug!("No geocoding match for {}", place.name);
            }
          , Err(e) => {
              warn!("Geocoding {} failed: {}", place.name, e);
            }
        }
    }

    match serde_json::to_value(&places)
    {   Ok(enriched) => payload["places"] = enriched
      , Err(e) => warn!("Could not write coordinates back: {}", e)
    }
}
