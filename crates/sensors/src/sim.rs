//! Stateful greenhouse simulator for local development.
//!
//! Models enough physics to exercise the control loop end to end:
//! - Temporal coherence via random walk with mean reversion
//! - Gradual soil drying (evaporation, faster when hot)
//! - Diurnal (day/night) temperature and daylight cycle
//! - Occasional climate sensor faults (NaN or bus error)
//! - Closed-loop response: fan cools, pump wets the soil, grow light
//!   brightens the light sensor

use std::fmt;

use anyhow::bail;

use crate::adc::RAW_MAX;
use crate::{Climate, Probe, SensorHardware};

// ---------------------------------------------------------------------------
// Gaussian approximation (no extra dependency)
// ---------------------------------------------------------------------------

/// Approximate a sample from N(0,1) using the Irwin-Hall method:
/// sum of 12 uniform [0,1) values minus 6.
fn approx_std_normal() -> f64 {
    let mut sum: f64 = 0.0;
    for _ in 0..12 {
        sum += fastrand::f64();
    }
    sum - 6.0
}

/// Sample from N(mean, sigma).
fn gaussian(mean: f64, sigma: f64) -> f64 {
    mean + sigma * approx_std_normal()
}

// ---------------------------------------------------------------------------
// Scenario presets
// ---------------------------------------------------------------------------

/// Pre-configured simulation profiles selectable via `SIM_SCENARIO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Mild day, moderate drying.  Occasional sensor fault.
    Temperate,
    /// Hot afternoon around 34 °C.  Fan should run most of the time.
    Heatwave,
    /// Fast-drying soil.  Pump cycles frequently.
    Drought,
    /// ~15% of climate reads fail.  Exercises last-known-good filtering.
    Flaky,
}

impl Scenario {
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "heatwave" => Self::Heatwave,
            "drought" => Self::Drought,
            "flaky" => Self::Flaky,
            _ => Self::Temperate,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperate => write!(f, "temperate"),
            Self::Heatwave => write!(f, "heatwave"),
            Self::Drought => write!(f, "drought"),
            Self::Flaky => write!(f, "flaky"),
        }
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

pub struct GreenhouseSim {
    // Current "true" conditions.  Evolve once per climate read.
    temperature_c: f64,
    humidity_pct: f64,
    /// 0.0 = bone dry, 1.0 = saturated.
    soil_wetness: f64,
    /// Daylight fraction reaching the sensor, 0.0..=1.0.
    daylight: f64,

    // Scenario parameters
    ambient_c: f64,
    drying_per_step: f64,
    fault_prob: f32,

    diurnal_period_s: f64,

    // Actuators as last commanded by the controller
    fan: bool,
    pump: bool,
    grow_light: bool,

    // Probe supply rails
    soil_powered: bool,
    light_powered: bool,
}

/// Cooling per step while the fan runs (°C).
const FAN_COOLING: f64 = 0.4;
/// Wetting per step while the pump runs (fraction of full scale).
const PUMP_WETTING: f64 = 0.03;
/// Light sensor contribution of the grow light.
const GROW_LIGHT_GAIN: f64 = 0.35;
/// Pull toward ambient per step.
const THERMAL_REVERSION: f64 = 0.05;

impl GreenhouseSim {
    /// `diurnal_period_s` controls the day/night cycle length.  Use 600
    /// (10 min) for fast dev iteration or 86400 for real-time.
    pub fn new(scenario: Scenario, diurnal_period_s: f64) -> Self {
        let (ambient_c, drying, fault_prob, start_wetness) = match scenario {
            Scenario::Temperate => (24.0, 0.004, 0.02_f32, 0.55),
            Scenario::Heatwave => (34.0, 0.008, 0.02, 0.45),
            Scenario::Drought => (27.0, 0.02, 0.02, 0.25),
            Scenario::Flaky => (25.0, 0.005, 0.15, 0.5),
        };

        Self {
            temperature_c: ambient_c,
            humidity_pct: 60.0,
            soil_wetness: start_wetness,
            daylight: 0.5,
            ambient_c,
            drying_per_step: drying,
            fault_prob,
            diurnal_period_s,
            fan: false,
            pump: false,
            grow_light: false,
            soil_powered: false,
            light_powered: false,
        }
    }

    pub fn set_fan(&mut self, on: bool) {
        self.fan = on;
    }

    pub fn set_pump(&mut self, on: bool) {
        self.pump = on;
    }

    pub fn set_grow_light(&mut self, on: bool) {
        self.grow_light = on;
    }

    /// Diurnal phase in [-1, 1], peaking mid-"afternoon".
    fn diurnal(&self) -> f64 {
        let now_s = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64();
        (2.0 * std::f64::consts::PI * now_s / self.diurnal_period_s).sin()
    }

    /// Advance the model by one control cycle.
    fn step(&mut self) {
        let phase = self.diurnal();

        let target = self.ambient_c + 3.0 * phase;
        let cooling = if self.fan { FAN_COOLING } else { 0.0 };
        self.temperature_c += THERMAL_REVERSION * (target - self.temperature_c)
            + gaussian(0.0, 0.1)
            - cooling;

        let misting = if self.pump { 0.5 } else { 0.0 };
        self.humidity_pct = (self.humidity_pct + 0.05 * (60.0 - self.humidity_pct)
            + gaussian(0.0, 0.5)
            + misting)
            .clamp(0.0, 100.0);

        // Hotter air dries the soil faster.
        let heat_factor = (self.temperature_c / self.ambient_c).max(0.5);
        let wetting = if self.pump { PUMP_WETTING } else { 0.0 };
        self.soil_wetness = (self.soil_wetness - self.drying_per_step * heat_factor
            + wetting
            + gaussian(0.0, 0.002))
        .clamp(0.0, 1.0);

        self.daylight = (phase.max(0.0) + gaussian(0.0, 0.02)).clamp(0.0, 1.0);
    }
}

impl SensorHardware for GreenhouseSim {
    fn read_climate(&mut self) -> anyhow::Result<Climate> {
        self.step();

        if fastrand::f32() < self.fault_prob {
            // Half the faults look like a bus error, half like a NaN frame.
            if fastrand::bool() {
                bail!("simulated climate sensor timeout");
            }
            return Ok(Climate {
                temperature_c: f32::NAN,
                humidity_pct: f32::NAN,
            });
        }

        Ok(Climate {
            temperature_c: self.temperature_c as f32,
            humidity_pct: self.humidity_pct as f32,
        })
    }

    fn set_power(&mut self, probe: Probe, on: bool) -> anyhow::Result<()> {
        match probe {
            Probe::Soil => self.soil_powered = on,
            Probe::Light => self.light_powered = on,
        }
        Ok(())
    }

    fn read_raw(&mut self, probe: Probe) -> anyhow::Result<u16> {
        let full = f64::from(RAW_MAX);
        match probe {
            Probe::Soil => {
                if !self.soil_powered {
                    bail!("soil probe read while unpowered");
                }
                // Capacitive probes read high when dry.
                Ok(((1.0 - self.soil_wetness) * full).round() as u16)
            }
            Probe::Light => {
                if !self.light_powered {
                    bail!("light sensor read while unpowered");
                }
                let grow = if self.grow_light { GROW_LIGHT_GAIN } else { 0.0 };
                Ok(((self.daylight + grow).min(1.0) * full).round() as u16)
            }
        }
    }

    fn raw_max(&self) -> u16 {
        RAW_MAX
    }
}

// ===========================================================================
// Tests
// ===========================================================================
