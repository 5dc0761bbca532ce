use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Sensor reading
// ---------------------------------------------------------------------------

/// Latest known-good sensor values.  `None` until the first valid read of
/// that field; after that a field only ever changes to another valid value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorReading {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub soil_moisture_pct: Option<f32>,
    pub light_pct: Option<u8>,
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdKind {
    Temperature,
    Moisture,
    Light,
}

impl ThresholdKind {
    pub const ALL: [ThresholdKind; 3] = [Self::Temperature, Self::Moisture, Self::Light];

    /// Inclusive upper bound; the lower bound is exclusive zero.
    pub fn max(self) -> i64 {
        match self {
            Self::Temperature => 40,
            Self::Moisture => 100,
            Self::Light => 100,
        }
    }

    /// `0 < value <= max`.
    pub fn accepts(self, value: i64) -> bool {
        value > 0 && value <= self.max()
    }

    /// Key under `settings/thresholds/current/` and in config files.
    pub fn key(self) -> &'static str {
        match self {
            Self::Temperature => "temp_threshold",
            Self::Moisture => "moisture_threshold",
            Self::Light => "light_threshold",
        }
    }
}

impl fmt::Display for ThresholdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "temperature"),
            Self::Moisture => write!(f, "moisture"),
            Self::Light => write!(f, "light"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThresholdConfig {
    /// °C, fan runs at or above.
    pub temperature: i64,
    /// Soil moisture %, pump runs below.
    pub moisture: i64,
    /// Light %, grow light switches on below.
    pub light: i64,
}

impl ThresholdConfig {
    pub fn get(&self, kind: ThresholdKind) -> i64 {
        match kind {
            ThresholdKind::Temperature => self.temperature,
            ThresholdKind::Moisture => self.moisture,
            ThresholdKind::Light => self.light,
        }
    }

    pub fn set(&mut self, kind: ThresholdKind, value: i64) {
        match kind {
            ThresholdKind::Temperature => self.temperature = value,
            ThresholdKind::Moisture => self.moisture = value,
            ThresholdKind::Light => self.light = value,
        }
    }
}

// ---------------------------------------------------------------------------
// Mode + actuators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    #[default]
    Automatic,
    Manual,
}

impl ControlMode {
    pub fn from_automation_flag(automatic: bool) -> Self {
        if automatic {
            Self::Automatic
        } else {
            Self::Manual
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actuator {
    Fan,
    Pump,
    Light,
}

impl Actuator {
    pub const ALL: [Actuator; 3] = [Self::Fan, Self::Pump, Self::Light];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fan => "fan",
            Self::Pump => "pump",
            Self::Light => "light",
        }
    }
}

/// Commanded actuator outputs.
///
/// `light_latched` makes the grow light edge-triggered: it only changes on
/// a threshold crossing.  Fan and pump have no latch and are recomputed
/// from the current reading on every automatic cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActuatorState {
    pub fan: bool,
    pub pump: bool,
    pub light: bool,
    pub light_latched: bool,
}

impl ActuatorState {
    pub fn get(&self, actuator: Actuator) -> bool {
        match actuator {
            Actuator::Fan => self.fan,
            Actuator::Pump => self.pump,
            Actuator::Light => self.light,
        }
    }

    pub fn set(&mut self, actuator: Actuator, on: bool) {
        match actuator {
            Actuator::Fan => self.fan = on,
            Actuator::Pump => self.pump = on,
            Actuator::Light => self.light = on,
        }
    }
}

// ---------------------------------------------------------------------------
// Loop state
// ---------------------------------------------------------------------------

/// Everything the control loop mutates, owned in one place and lent to each
/// component in turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlLoopState {
    pub reading: SensorReading,
    pub thresholds: ThresholdConfig,
    pub mode: ControlMode,
    pub actuators: ActuatorState,
}

impl ControlLoopState {
    /// Boot state: no readings yet, configured default thresholds,
    /// AUTOMATIC, everything off.
    pub fn new(thresholds: ThresholdConfig) -> Self {
        Self {
            reading: SensorReading::default(),
            thresholds,
            mode: ControlMode::Automatic,
            actuators: ActuatorState::default(),
        }
    }
}
