//! Recording mocks shared by the unit tests.

use std::collections::{HashMap, HashSet};

use anyhow::bail;
use serde_json::Value;

use greenhouse_sensors::{Climate, Probe, SensorHardware};

use crate::error::RemoteError;
use crate::reboot::Restarter;
use crate::relay::Outputs;
use crate::remote::RemoteStore;
use crate::state::Actuator;

// ---------------------------------------------------------------------------
// Remote store
// ---------------------------------------------------------------------------

/// In-memory store that records every read and every successful write.
#[derive(Debug, Default)]
pub struct MockStore {
    pub values: HashMap<String, Value>,
    pub reads: Vec<String>,
    pub writes: Vec<(String, Value)>,
    /// While set, `is_ready` is false and every call is `Unavailable`.
    pub offline: bool,
    /// Writes to these paths fail with `Unavailable`.
    pub failing_writes: HashSet<String>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, path: &str, value: Value) {
        self.values.insert(path.to_string(), value);
    }

    pub fn value(&self, path: &str) -> Option<&Value> {
        self.values.get(path)
    }

    /// Every value written to `path`, oldest first.
    pub fn writes_to(&self, path: &str) -> Vec<&Value> {
        self.writes
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, v)| v)
            .collect()
    }

    pub fn writes_under(&self, prefix: &str) -> Vec<&(String, Value)> {
        self.writes
            .iter()
            .filter(|(p, _)| p.starts_with(prefix))
            .collect()
    }
}

impl RemoteStore for MockStore {
    fn is_ready(&self) -> bool {
        !self.offline
    }

    async fn get(&mut self, path: &str) -> Result<Value, RemoteError> {
        self.reads.push(path.to_string());
        if self.offline {
            return Err(RemoteError::Unavailable("mock offline".into()));
        }
        self.values
            .get(path)
            .cloned()
            .ok_or_else(|| RemoteError::Missing(path.to_string()))
    }

    async fn set(&mut self, path: &str, value: Value) -> Result<(), RemoteError> {
        if self.offline || self.failing_writes.contains(path) {
            return Err(RemoteError::Unavailable(format!("mock write to {path} failed")));
        }
        self.writes.push((path.to_string(), value.clone()));
        self.values.insert(path.to_string(), value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Scripted sensor board.  `None` fields make the matching read fail.
/// Reading a probe whose rail is off is an error, as on real hardware.
#[derive(Debug)]
pub struct MockSensors {
    pub climate: Option<Climate>,
    pub soil_raw: Option<u16>,
    pub light_raw: Option<u16>,
    pub max: u16,
    pub soil_powered: bool,
    pub light_powered: bool,
    pub rail_log: Vec<(Probe, bool)>,
}

impl MockSensors {
    /// Full scale of 1000 keeps percentages exact in assertions.
    pub fn new() -> Self {
        Self {
            climate: None,
            soil_raw: None,
            light_raw: None,
            max: 1000,
            soil_powered: false,
            light_powered: false,
            rail_log: Vec::new(),
        }
    }

    pub fn with_climate(mut self, temperature_c: f32, humidity_pct: f32) -> Self {
        self.climate = Some(Climate {
            temperature_c,
            humidity_pct,
        });
        self
    }

    /// Raw values giving the requested moisture / light percentages.
    pub fn with_probes(mut self, moisture_pct: u16, light_pct: u16) -> Self {
        let scale = |pct: u16| (u32::from(pct) * u32::from(self.max) / 100) as u16;
        self.soil_raw = Some(self.max - scale(moisture_pct));
        self.light_raw = Some(scale(light_pct));
        self
    }
}

impl SensorHardware for MockSensors {
    fn read_climate(&mut self) -> anyhow::Result<Climate> {
        match self.climate {
            Some(c) => Ok(c),
            None => bail!("mock climate sensor fault"),
        }
    }

    fn set_power(&mut self, probe: Probe, on: bool) -> anyhow::Result<()> {
        match probe {
            Probe::Soil => self.soil_powered = on,
            Probe::Light => self.light_powered = on,
        }
        self.rail_log.push((probe, on));
        Ok(())
    }

    fn read_raw(&mut self, probe: Probe) -> anyhow::Result<u16> {
        let (powered, raw) = match probe {
            Probe::Soil => (self.soil_powered, self.soil_raw),
            Probe::Light => (self.light_powered, self.light_raw),
        };
        if !powered {
            bail!("{probe:?} read while unpowered");
        }
        match raw {
            Some(r) => Ok(r),
            None => bail!("mock {probe:?} adc fault"),
        }
    }

    fn raw_max(&self) -> u16 {
        self.max
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Records every relay and LED write in order.
#[derive(Debug, Default)]
pub struct RecordingOutputs {
    pub writes: Vec<(Actuator, bool)>,
    pub led: Vec<bool>,
}

impl RecordingOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes_for(&self, actuator: Actuator) -> Vec<bool> {
        self.writes
            .iter()
            .filter(|(a, _)| *a == actuator)
            .map(|(_, on)| *on)
            .collect()
    }

    pub fn last(&self, actuator: Actuator) -> Option<bool> {
        self.writes_for(actuator).last().copied()
    }
}

impl Outputs for RecordingOutputs {
    fn set(&mut self, actuator: Actuator, on: bool) {
        self.writes.push((actuator, on));
    }

    fn set_status_led(&mut self, on: bool) {
        self.led.push(on);
    }
}

// ---------------------------------------------------------------------------
// Restarter
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingRestarter {
    pub restarts: usize,
}

impl Restarter for RecordingRestarter {
    fn restart(&mut self) {
        self.restarts += 1;
    }
}
