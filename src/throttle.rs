//! Minimum-interval throttle for outbound calls, shared across requests

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use log::debug;

/// Longest spacing honoured; larger configured intervals are capped
pub const MAX_INTERVAL: Duration = Duration::from_secs(3600);

/// Spaces calls to one host at least `min_interval` apart.
///
/// Each caller reserves the next free slot for its host under the
/// lock, then sleeps outside it, so concurrent requests queue up
/// without serializing other hosts.
#[derive(Debug)]
pub struct Throttle
{   min_interval: Duration
  , next_slot: Mutex<HashMap<String, Instant>>
}

impl Throttle
{   pub fn new(min_interval: Duration) -> Self
    {   Throttle
        {   min_interval: min_interval.min(MAX_INTERVAL)
          , next_slot: Mutex::new(HashMap::new())
        }
    }

    pub fn from_millis(min_interval_ms: u64) -> Self
    {   Throttle::new(Duration::from_millis(min_interval_ms))
    }

    /// Wait for this caller's slot on `host`; returns the time waited
    pub async fn acquire(&self, host: &str) -> Duration
    {   let now = Instant::now();
        let slot = {
          let mut slots = self.next_slot.lock().await;
          let slot = match slots.get(host)
          {   Some(next) if *next > now => *next
            , _ => now
          };
          let next = slot.checked_add(self.min_interval)
            .unwrap_or(slot);
          slots.insert(host.to_string(), next);
          slot
        };
        let wait = slot.saturating_duration_since(now);
        if !wait.is_zero()
        {   debug!("Throttling {} for {:?}", host, wait);
            tokio::time::sleep_until(slot).await;
        }
        wait
    }
}
