//! MQTT backend: each store path is a retained topic under a prefix.
//!
//! A spawned task drives the rumqttc event loop and mirrors the retained
//! values of the watched paths (the ones the device reads) into a local
//! map.  Reads are served from that mirror; writes publish retained JSON.
//! Written-only paths such as history are never mirrored, so the map stays
//! the size of the watch list.  While the broker is unreachable both fail
//! with [`RemoteError::Unavailable`] and nothing is queued.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS, SubscribeFilter};
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::RemoteStore;
use crate::error::RemoteError;

type Mirror = Arc<RwLock<HashMap<String, Value>>>;

pub struct MqttStore {
    client: AsyncClient,
    prefix: String,
    watched: Arc<HashSet<String>>,
    connected: Arc<AtomicBool>,
    mirror: Mirror,
}

impl MqttStore {
    /// Start the event-loop task.  Returns immediately; the store reports
    /// not-ready until the broker acknowledges the connection.  Only
    /// `watched` paths are subscribed to and served by `get`.
    pub fn start(host: &str, port: u16, client_id: &str, prefix: &str, watched: Vec<String>) -> Self {
        let mut mqttoptions = MqttOptions::new(client_id, host, port);
        mqttoptions.set_keep_alive(Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(mqttoptions, 20);

        let prefix = prefix.trim_matches('/').to_string();
        let watched: Arc<HashSet<String>> = Arc::new(
            watched
                .iter()
                .map(|p| p.trim_matches('/').to_string())
                .collect(),
        );
        let connected = Arc::new(AtomicBool::new(false));
        let mirror: Mirror = Arc::new(RwLock::new(HashMap::new()));

        let task_client = client.clone();
        let task_prefix = prefix.clone();
        let task_watched = Arc::clone(&watched);
        let task_connected = Arc::clone(&connected);
        let task_mirror = Arc::clone(&mirror);

        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("remote store connected to mqtt");
                        let filters = task_watched.iter().map(|path| {
                            SubscribeFilter::new(path_to_topic(&task_prefix, path), QoS::AtLeastOnce)
                        });
                        if let Err(e) = task_client.try_subscribe_many(filters) {
                            warn!(paths = task_watched.len(), "mqtt subscribe failed: {e}");
                        }
                        task_connected.store(true, Ordering::SeqCst);
                    }
                    Ok(Event::Incoming(Packet::Publish(p))) => {
                        let mut m = task_mirror.write().await;
                        apply_publish(&mut m, &task_prefix, &task_watched, &p.topic, &p.payload);
                    }
                    Ok(Event::Incoming(Packet::Disconnect)) => {
                        warn!("mqtt disconnected");
                        task_connected.store(false, Ordering::SeqCst);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("mqtt error: {e}. retrying...");
                        task_connected.store(false, Ordering::SeqCst);
                        sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        });

        Self {
            client,
            prefix,
            watched,
            connected,
            mirror,
        }
    }
}

impl RemoteStore for MqttStore {
    fn is_ready(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn get(&mut self, path: &str) -> Result<Value, RemoteError> {
        if !self.is_ready() {
            return Err(RemoteError::Unavailable("mqtt not connected".into()));
        }
        self.mirror
            .read()
            .await
            .get(path.trim_matches('/'))
            .cloned()
            .ok_or_else(|| RemoteError::Missing(path.to_string()))
    }

    async fn set(&mut self, path: &str, value: Value) -> Result<(), RemoteError> {
        if !self.is_ready() {
            return Err(RemoteError::Unavailable("mqtt not connected".into()));
        }
        let payload = serde_json::to_vec(&value).map_err(|e| RemoteError::Encode(e.to_string()))?;
        let topic = path_to_topic(&self.prefix, path);

        self.client
            .publish(&topic, QoS::AtLeastOnce, true, payload)
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?;

        debug!(%topic, "published retained value");
        let path = path.trim_matches('/');
        if self.watched.contains(path) {
            self.mirror.write().await.insert(path.to_string(), value);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Topic / payload helpers
// ---------------------------------------------------------------------------

/// Fold one incoming publish into the mirror.  Topics outside the prefix or
/// the watch list are dropped; a null payload clears the entry.
pub(crate) fn apply_publish(
    mirror: &mut HashMap<String, Value>,
    prefix: &str,
    watched: &HashSet<String>,
    topic: &str,
    payload: &[u8],
) {
    let Some(path) = topic_to_path(prefix, topic) else {
        return;
    };
    if !watched.contains(path) {
        debug!(%topic, "ignoring unwatched topic");
        return;
    }
    let value = decode_payload(payload);
    if value.is_null() {
        mirror.remove(path);
    } else {
        mirror.insert(path.to_string(), value);
    }
}

/// "greenhouse" + "settings/automation" → "greenhouse/settings/automation".
pub(crate) fn path_to_topic(prefix: &str, path: &str) -> String {
    let path = path.trim_matches('/');
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{prefix}/{path}")
    }
}

/// Inverse of [`path_to_topic`]; `None` for topics outside the prefix.
pub(crate) fn topic_to_path<'t>(prefix: &str, topic: &'t str) -> Option<&'t str> {
    let rest = if prefix.is_empty() {
        topic
    } else {
        topic.strip_prefix(prefix)?.strip_prefix('/')?
    };
    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Payloads are JSON.  Anything that doesn't parse is kept as a string so a
/// hand-published `true` vs `"on"` still shows up as a type mismatch rather
/// than vanishing.  An empty payload clears a retained topic.
pub(crate) fn decode_payload(payload: &[u8]) -> Value {
    if payload.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(payload)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(payload).trim().to_string()))
}

// ===========================================================================
// Tests
// ===========================================================================
