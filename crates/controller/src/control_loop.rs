//! The control loop: one owner of all mutable state, one strictly
//! sequential cycle per tick.
//!
//! ```text
//! every tick:        connectivity ─▶ reboot check
//! every health_s:    health push
//! every telemetry_s: sense ─▶ thresholds ─▶ mode ─▶ actuate ─▶ telemetry
//! ```
//!
//! While the store is not ready every remote step is skipped; sensing and
//! automatic actuation carry on with the last known configuration.

use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

use greenhouse_sensors::SensorHardware;

use crate::actuation;
use crate::clock::{Cadence, DeviceClock};
use crate::config::Config;
use crate::health::HealthProbe;
use crate::mode::ModeReconciler;
use crate::reboot::{RebootCoordinator, Restarter};
use crate::relay::Outputs;
use crate::remote::RemoteStore;
use crate::sensing::SensorAcquisition;
use crate::state::{ControlLoopState, ControlMode};
use crate::telemetry::TelemetryPublisher;
use crate::thresholds::ThresholdStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Continue,
    Restarting,
}

pub struct ControlLoop<S, H, O, R> {
    store: S,
    sensors: SensorAcquisition<H>,
    outputs: O,
    thresholds: ThresholdStore,
    mode: ModeReconciler,
    reboot: RebootCoordinator<R>,
    telemetry: TelemetryPublisher,
    health: HealthProbe,
    clock: DeviceClock,
    cycle: std::time::Duration,
    telemetry_due: Cadence,
    health_due: Cadence,
    online: Option<bool>,
    state: ControlLoopState,
}

impl<S, H, O, R> ControlLoop<S, H, O, R>
where
    S: RemoteStore,
    H: SensorHardware,
    O: Outputs,
    R: Restarter,
{
    pub fn new(cfg: &Config, store: S, hw: H, outputs: O, restarter: R) -> Self {
        let timing = &cfg.timing;
        Self {
            store,
            sensors: SensorAcquisition::new(
                hw,
                timing.settle(),
                cfg.sensors.temperature_min..=cfg.sensors.temperature_max,
            ),
            outputs,
            thresholds: ThresholdStore::new(&cfg.schema),
            mode: ModeReconciler::new(&cfg.schema),
            reboot: RebootCoordinator::new(
                &cfg.schema.reboot_request,
                timing.reboot_flush(),
                restarter,
            ),
            telemetry: TelemetryPublisher::new(),
            health: HealthProbe::new(),
            clock: DeviceClock::start(),
            cycle: timing.cycle(),
            telemetry_due: Cadence::new(timing.telemetry()),
            health_due: Cadence::new(timing.health()),
            online: None,
            state: ControlLoopState::new(cfg.thresholds.to_config()),
        }
    }

    pub fn state(&self) -> &ControlLoopState {
        &self.state
    }

    /// Tick until a restart is issued.
    pub async fn run(mut self) {
        let mut ticker = interval(self.cycle);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            cycle_ms = self.cycle.as_millis() as u64,
            mode = self.state.mode.as_str(),
            "control loop started"
        );

        loop {
            ticker.tick().await;
            if self.run_cycle().await == CycleOutcome::Restarting {
                break;
            }
        }
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let now = Instant::now();
        let online = self.check_connectivity();

        if online && self.reboot.check(&mut self.store).await {
            return CycleOutcome::Restarting;
        }

        if online && self.health_due.due(now) {
            let snapshot = self.health.sample(&self.clock);
            self.telemetry
                .publish_health(&mut self.store, &snapshot)
                .await;
        }

        if !self.telemetry_due.due(now) {
            return CycleOutcome::Continue;
        }

        self.sensors.sample(&mut self.state.reading).await;

        if online {
            self.thresholds
                .refresh(&mut self.store, &mut self.state.thresholds)
                .await;
            self.mode
                .reconcile(&mut self.store, &mut self.state, &mut self.outputs)
                .await;
        }

        if self.state.mode == ControlMode::Automatic {
            actuation::evaluate(
                &self.state.reading,
                &self.state.thresholds,
                &mut self.state.actuators,
                &mut self.outputs,
            );
        }

        if online {
            self.telemetry
                .publish_state(&mut self.store, &self.state, &self.clock)
                .await;
        }

        CycleOutcome::Continue
    }

    /// Logs only on transitions.
    fn check_connectivity(&mut self) -> bool {
        let ready = self.store.is_ready();
        match (self.online, ready) {
            (Some(false) | None, true) => info!("remote store reachable"),
            (Some(true) | None, false) => warn!("remote store unreachable, running on cached config"),
            _ => {}
        }
        self.online = Some(ready);
        ready
    }
}

// ===========================================================================
// Tests
// ===========================================================================
