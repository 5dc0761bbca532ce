//! State snapshots, append-only history, and health pushes.
//!
//! Every write is independent and best-effort: failures are counted and
//! logged, never retried or buffered.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::clock::{now_unix, DeviceClock};
use crate::health::HealthSnapshot;
use crate::remote::RemoteStore;
use crate::state::{ControlLoopState, ThresholdKind};

/// One history entry, written as a single object so it is never half-present.
///
/// `timestamp` is Unix time in milliseconds, on the same scale as the
/// history key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub timestamp: u64,
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub soil_moisture: Option<f32>,
    pub lighting: Option<u8>,
    pub fan_status: bool,
    pub pump_status: bool,
    pub light_status: bool,
}

impl TelemetryRecord {
    pub fn capture(state: &ControlLoopState, timestamp: u64) -> Self {
        Self {
            timestamp,
            temperature: state.reading.temperature,
            humidity: state.reading.humidity,
            soil_moisture: state.reading.soil_moisture_pct,
            lighting: state.reading.light_pct,
            fan_status: state.actuators.fan,
            pump_status: state.actuators.pump,
            light_status: state.actuators.light,
        }
    }
}

/// Hands out history keys in Unix milliseconds (boot time plus uptime),
/// bumping past the previous key when two records land in the same tick.
/// Anchoring to the boot time keeps keys from one run clear of the next.
#[derive(Debug, Default)]
pub struct HistoryKeyer {
    last: Option<u64>,
}

impl HistoryKeyer {
    pub fn next(&mut self, now_ms: u64) -> u64 {
        let key = match self.last {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last = Some(key);
        key
    }
}

#[derive(Debug, Default)]
pub struct TelemetryPublisher {
    keyer: HistoryKeyer,
}

impl TelemetryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the current state to its fixed paths and append one history
    /// record.  Returns the history key used.
    pub async fn publish_state<S: RemoteStore>(
        &mut self,
        store: &mut S,
        state: &ControlLoopState,
        clock: &DeviceClock,
    ) -> u64 {
        let now = now_unix();
        let r = &state.reading;
        let a = &state.actuators;

        let mut writes: Vec<(String, Value)> = Vec::new();
        let mut push = |path: &str, v: Value| writes.push((path.to_string(), v));

        // Fields with no valid reading yet are left as they are remotely.
        if let Some(t) = r.temperature {
            push("sensor_data/temperature", json!(t));
        }
        if let Some(h) = r.humidity {
            push("sensor_data/humidity", json!(h));
        }
        if let Some(m) = r.soil_moisture_pct {
            push("sensor_data/soil_moisture", json!(m));
        }
        if let Some(l) = r.light_pct {
            push("sensor_data/lighting", json!(l));
        }
        push("sensor_data/fan_status", json!(a.fan));
        push("sensor_data/pump_status", json!(a.pump));
        push("sensor_data/light_status", json!(a.light));
        for kind in ThresholdKind::ALL {
            push(
                &format!("settings/thresholds/current/{}", kind.key()),
                json!(state.thresholds.get(kind)),
            );
        }
        push("system/mode", json!(state.mode.as_str()));
        push("system/last_update", json!(now));

        let now_ms = clock.unix_ms();
        let key = self.keyer.next(now_ms);
        let record = TelemetryRecord::capture(state, now_ms);
        match serde_json::to_value(&record) {
            Ok(v) => push(&format!("history/{key}"), v),
            Err(e) => warn!(key, "history record not encodable: {e}"),
        }

        write_all(store, writes, "state").await;
        key
    }

    pub async fn publish_health<S: RemoteStore>(&self, store: &mut S, health: &HealthSnapshot) {
        let mut writes = vec![
            ("system/free_heap".to_string(), json!(health.free_heap)),
            ("system/uptime".to_string(), json!(health.uptime_s)),
            ("system/status".to_string(), json!(health.status)),
        ];
        if let Some(rssi) = health.wifi_rssi {
            writes.push(("system/wifi_rssi".to_string(), json!(rssi)));
        }
        write_all(store, writes, "health").await;
    }
}

async fn write_all<S: RemoteStore>(store: &mut S, writes: Vec<(String, Value)>, what: &str) {
    let total = writes.len();
    let mut failed = 0;
    for (path, value) in writes {
        if let Err(e) = store.set(&path, value).await {
            debug!(%path, "write failed: {e}");
            failed += 1;
        }
    }
    if failed > 0 {
        warn!(failed, total, "{what} push incomplete");
    } else {
        debug!(total, "{what} pushed");
    }
}

// ===========================================================================
// Tests
// ===========================================================================
