//! Automation flag and manual overrides.

use tracing::{debug, info};

use crate::config::SchemaSettings;
use crate::relay::Outputs;
use crate::remote::{parse_bool, read_first, RemoteStore};
use crate::state::{Actuator, ControlLoopState, ControlMode};

pub struct ModeReconciler {
    automation: Vec<String>,
    overrides: Vec<(Actuator, Vec<String>)>,
}

impl ModeReconciler {
    pub fn new(schema: &SchemaSettings) -> Self {
        Self {
            automation: schema.automation.clone(),
            overrides: Actuator::ALL
                .into_iter()
                .map(|a| (a, schema.override_paths(a).to_vec()))
                .collect(),
        }
    }

    /// Read the automation flag and, in manual mode, apply the override for
    /// each actuator straight to its relay.  Anything unreadable leaves the
    /// previous mode and actuator state untouched.
    pub async fn reconcile<S: RemoteStore, O: Outputs>(
        &self,
        store: &mut S,
        state: &mut ControlLoopState,
        outputs: &mut O,
    ) {
        if let Some((path, automatic)) = read_first(store, &self.automation, parse_bool).await {
            let mode = ControlMode::from_automation_flag(automatic);
            if mode != state.mode {
                info!(%path, from = state.mode.as_str(), to = mode.as_str(), "control mode changed");
                state.mode = mode;
            }
        }

        if state.mode != ControlMode::Manual {
            return;
        }

        for (actuator, paths) in &self.overrides {
            let Some((path, on)) = read_first(store, paths, parse_bool).await else {
                continue;
            };

            if state.actuators.get(*actuator) != on {
                info!(actuator = actuator.as_str(), on, %path, "manual override applied");
            } else {
                debug!(actuator = actuator.as_str(), on, %path, "manual override unchanged");
            }

            outputs.set(*actuator, on);
            state.actuators.set(*actuator, on);

            if *actuator == Actuator::Light {
                // Keep the latch in step so automatic mode resumes from the
                // state the light is actually in.
                state.actuators.light_latched = on;
                outputs.set_status_led(on);
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
