//! Threshold actuation, run only in automatic mode.
//!
//! ```text
//! fan   = temperature >= temp_threshold          (level, every cycle)
//! pump  = soil_moisture < moisture_threshold     (level, every cycle)
//! light : unlatched ──[light < thr]──▶ ON, latched
//!         latched   ──[light >= thr]──▶ OFF, unlatched
//! ```
//!
//! Fan and pump have no hysteresis band and can chatter when the reading
//! sits on the threshold.  The light only switches on a crossing.

use tracing::info;

use crate::relay::Outputs;
use crate::state::{Actuator, ActuatorState, SensorReading, ThresholdConfig};

/// Compute the next actuator state from the current reading.  A field with
/// no valid reading yet never switches anything on.
pub fn decide(
    reading: &SensorReading,
    thresholds: &ThresholdConfig,
    current: &ActuatorState,
) -> ActuatorState {
    let fan = reading
        .temperature
        .is_some_and(|t| t >= thresholds.temperature as f32);
    let pump = reading
        .soil_moisture_pct
        .is_some_and(|m| m < thresholds.moisture as f32);

    let (light, light_latched) = match reading.light_pct {
        Some(l) if i64::from(l) < thresholds.light && !current.light_latched => (true, true),
        Some(l) if i64::from(l) >= thresholds.light && current.light_latched => (false, false),
        _ => (current.light, current.light_latched),
    };

    ActuatorState {
        fan,
        pump,
        light,
        light_latched,
    }
}

/// Evaluate thresholds and drive the outputs.  Fan and pump relays are
/// written every call; the light relay and status LED only on a latch
/// transition.
pub fn evaluate<O: Outputs>(
    reading: &SensorReading,
    thresholds: &ThresholdConfig,
    state: &mut ActuatorState,
    outputs: &mut O,
) {
    let next = decide(reading, thresholds, state);

    for actuator in [Actuator::Fan, Actuator::Pump] {
        let on = next.get(actuator);
        if on != state.get(actuator) {
            info!(actuator = actuator.as_str(), on, "automatic switch");
        }
        outputs.set(actuator, on);
    }

    if next.light_latched != state.light_latched {
        info!(
            on = next.light,
            light = ?reading.light_pct,
            threshold = thresholds.light,
            "grow light crossing"
        );
        outputs.set(Actuator::Light, next.light);
        outputs.set_status_led(next.light);
    }

    *state = next;
}

// ===========================================================================
// Tests
// ===========================================================================
