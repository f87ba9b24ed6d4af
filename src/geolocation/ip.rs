//! IP-based location provider.
//!
//! City-level fixes from `ipapi.co`. No permission model and no real
//! accuracy modes; high- and low-accuracy requests behave the same. Useful
//! wherever the real platform capability (a browser, a GPS) is absent —
//! notably the `hawkgeo` CLI.

use super::provider::{LocationProvider, WatchChannel, WatchId};
use super::types::{FixOptions, ProviderFault, RawFix};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const ENDPOINT: &str = "https://ipapi.co/json/";
const USER_AGENT: &str = "HawkeRouteGeo/0.3 (marketplace-client)";

/// IP geolocation is city-grade at best.
const IP_FIX_ACCURACY_M: f64 = 25_000.0;

/// How often a watch re-polls the endpoint.
const WATCH_REFRESH: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct IpApiResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

pub struct IpApiProvider {
    agent: ureq::Agent,
    endpoint: String,
    watches: Mutex<HashMap<WatchId, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl IpApiProvider {
    pub fn new() -> Self {
        Self::with_endpoint(ENDPOINT)
    }

    /// Point the provider at a different endpoint (for testing).
    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            agent: ureq::Agent::new(),
            endpoint: endpoint.to_string(),
            watches: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for IpApiProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn fetch(agent: &ureq::Agent, endpoint: &str, timeout: Duration) -> Result<RawFix, ProviderFault> {
    let response = agent
        .get(endpoint)
        .timeout(timeout)
        .set("User-Agent", USER_AGENT)
        .call()
        .map_err(|e| match e {
            // A dead network is a provider that cannot determine a fix.
            ureq::Error::Transport(t) => ProviderFault::PositionUnavailable(t.to_string()),
            ureq::Error::Status(code, _) => {
                ProviderFault::Other(format!("geolocation endpoint returned HTTP {}", code))
            }
        })?;

    let body = response
        .into_string()
        .map_err(|e| ProviderFault::Other(e.to_string()))?;
    parse_body(&body)
}

fn parse_body(body: &str) -> Result<RawFix, ProviderFault> {
    let r: IpApiResult =
        serde_json::from_str(body).map_err(|e| ProviderFault::Other(e.to_string()))?;

    let latitude = r
        .latitude
        .ok_or_else(|| ProviderFault::Other("no latitude in response".into()))?;
    let longitude = r
        .longitude
        .ok_or_else(|| ProviderFault::Other("no longitude in response".into()))?;

    Ok(RawFix::new(latitude, longitude, IP_FIX_ACCURACY_M))
}

impl LocationProvider for IpApiProvider {
    fn current_fix(
        &self,
        options: FixOptions,
    ) -> impl Future<Output = Result<RawFix, ProviderFault>> + Send {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        async move {
            // ureq blocks; keep the caller's timeout wrapper honest by running
            // it off the async worker.
            tokio::task::spawn_blocking(move || fetch(&agent, &endpoint, options.timeout))
                .await
                .map_err(|e| ProviderFault::Other(e.to_string()))?
        }
    }

    fn start_watch(&self, options: FixOptions) -> WatchChannel {
        let id = WatchId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();

        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        let handle = tokio::spawn(async move {
            loop {
                let agent = agent.clone();
                let endpoint = endpoint.clone();
                let item = match tokio::task::spawn_blocking(move || {
                    fetch(&agent, &endpoint, options.timeout)
                })
                .await
                {
                    Ok(result) => result,
                    Err(e) => Err(ProviderFault::Other(e.to_string())),
                };
                if tx.send(item).is_err() {
                    break;
                }
                tokio::time::sleep(WATCH_REFRESH).await;
            }
        });

        self.watches.lock().unwrap().insert(id, handle);
        WatchChannel { id, updates: rx }
    }

    fn clear_watch(&self, id: WatchId) {
        if let Some(handle) = self.watches.lock().unwrap().remove(&id) {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_response() {
        let raw = parse_body(
            r#"{"ip":"203.0.113.7","city":"Singapore","latitude":1.3521,"longitude":103.8198,"timezone":"Asia/Singapore"}"#,
        )
        .unwrap();
        assert_eq!(raw.latitude, 1.3521);
        assert_eq!(raw.longitude, 103.8198);
        assert_eq!(raw.accuracy, IP_FIX_ACCURACY_M);
        assert!(raw.speed.is_none());
    }

    #[test]
    fn test_parse_missing_coordinates() {
        let result = parse_body(r#"{"ip":"203.0.113.7","city":"Singapore"}"#);
        assert!(matches!(result, Err(ProviderFault::Other(_))));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_body("not json").is_err());
    }
}
