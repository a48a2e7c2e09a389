//! Simulated launcher
//!
//! Plays the external launcher's part against a real save-data directory:
//! picks up `requests/<id>.json` and answers with `responses/<id>.json`.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::time::Duration;

use bridge_correlator::DirectoryExchange;
use shared_bus::{BridgeEvent, Subscription};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};

const SCAN_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone, Debug)]
pub struct SimulatedLauncher {
    exchange: DirectoryExchange,
}

impl SimulatedLauncher {
    pub fn new(exchange: DirectoryExchange) -> Self {
        Self { exchange }
    }

    /// Ids of the request files currently present, sorted.
    pub fn pending_requests(&self) -> io::Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.exchange.requests_dir())? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            // Skips `*.json.tmp` files still being written
            if let Some(id) = name.strip_suffix(".json") {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Wait until a request file not in `known` shows up.
    pub async fn wait_for_new_request(
        &self,
        known: &[String],
        within: Duration,
    ) -> Option<String> {
        let deadline = Instant::now() + within;
        while Instant::now() < deadline {
            if let Ok(ids) = self.pending_requests() {
                if let Some(id) = ids.into_iter().find(|id| !known.contains(id)) {
                    return Some(id);
                }
            }
            sleep(SCAN_INTERVAL).await;
        }
        None
    }

    pub fn read_request(&self, id: &str) -> io::Result<serde_json::Value> {
        let bytes = fs::read(self.exchange.requests_dir().join(format!("{id}.json")))?;
        serde_json::from_slice(&bytes).map_err(io::Error::other)
    }

    /// Write a JSON response the way the launcher does: temp file, then rename.
    pub fn respond(&self, id: &str, response: &serde_json::Value) -> io::Result<()> {
        let bytes = serde_json::to_vec(response).map_err(io::Error::other)?;
        self.respond_raw(id, &bytes)
    }

    pub fn respond_raw(&self, id: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.exchange.responses_dir().join(format!("{id}.json"));
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &path)
    }

    /// Answer every request as it appears, then remove the request file.
    pub fn spawn_auto_responder<F>(self, answer: F) -> JoinHandle<()>
    where
        F: Fn(&serde_json::Value) -> serde_json::Value + Send + 'static,
    {
        tokio::spawn(async move {
            let mut answered = HashSet::new();
            loop {
                for id in self.pending_requests().unwrap_or_default() {
                    if answered.contains(&id) {
                        continue;
                    }
                    let Ok(request) = self.read_request(&id) else {
                        continue;
                    };
                    if self.respond(&id, &answer(&request)).is_ok() {
                        let request_path = self.exchange.requests_dir().join(format!("{id}.json"));
                        let _ = fs::remove_file(request_path);
                        answered.insert(id);
                    }
                }
                sleep(SCAN_INTERVAL).await;
            }
        })
    }
}

/// Next event on `subscription`, or `None` if nothing arrives in time.
pub async fn next_event(subscription: &mut Subscription, within: Duration) -> Option<BridgeEvent> {
    timeout(within, subscription.recv())
        .await
        .ok()
        .and_then(Result::ok)
}
