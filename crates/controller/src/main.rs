mod actuation;
mod clock;
mod config;
mod control_loop;
mod error;
mod health;
mod mode;
mod reboot;
mod relay;
mod remote;
mod sensing;
mod state;
mod telemetry;
mod thresholds;

#[cfg(test)]
mod testing;

use std::env;
use std::time::Duration;

use anyhow::Result;
use greenhouse_sensors::SensorHardware;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Backend, Config};
use control_loop::ControlLoop;
use reboot::ProcessRestart;
use relay::{Outputs, RelayBoard};
use remote::mqtt::MqttStore;
use remote::rest::RestStore;
use remote::RemoteStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ──────────────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::load(&config_path)?;
    info!(
        path = %config_path,
        backend = ?cfg.remote.backend,
        telemetry_s = cfg.timing.telemetry_s,
        health_s = cfg.timing.health_s,
        "config loaded"
    );

    // ── Hardware ────────────────────────────────────────────────────
    let (sensors, mut outputs) = hardware(&cfg)?;
    // Fail-safe: everything off until the first decision.
    outputs.all_off();

    let restarter = ProcessRestart::new(cfg.reboot.command.clone());

    // ── Remote store ────────────────────────────────────────────────
    match cfg.remote.backend {
        Backend::Rest => {
            let store = RestStore::new(
                &cfg.remote.url,
                cfg.remote.auth.clone(),
                Duration::from_secs(cfg.remote.timeout_s),
            )?;
            run(&cfg, store, sensors, outputs, restarter).await;
        }
        Backend::Mqtt => {
            let r = &cfg.remote;
            let store = MqttStore::start(
                &r.mqtt_host,
                r.mqtt_port,
                &r.client_id,
                &r.topic_prefix,
                cfg.schema.read_paths(),
            );
            run(&cfg, store, sensors, outputs, restarter).await;
        }
    }

    Ok(())
}

async fn run<S, H, O>(cfg: &Config, store: S, sensors: H, outputs: O, restarter: ProcessRestart)
where
    S: RemoteStore,
    H: SensorHardware,
    O: Outputs,
{
    ControlLoop::new(cfg, store, sensors, outputs, restarter)
        .run()
        .await;
}

// ---------------------------------------------------------------------------
// Hardware selection
// ---------------------------------------------------------------------------

#[cfg(feature = "gpio")]
fn hardware(cfg: &Config) -> Result<(greenhouse_sensors::board::Board, RelayBoard)> {
    let board = greenhouse_sensors::board::Board::open(&cfg.sensors.wiring())?;
    let relays = RelayBoard::new(&cfg.relays)?;
    info!("sensor board and relays opened");
    Ok((board, relays))
}

/// Without GPIO the loop runs against the simulator, with the relay board
/// feeding fan/pump/light back into it.
#[cfg(not(feature = "gpio"))]
fn hardware(
    cfg: &Config,
) -> Result<(
    std::rc::Rc<std::cell::RefCell<greenhouse_sensors::sim::GreenhouseSim>>,
    relay::SimulatedRelays,
)> {
    use greenhouse_sensors::sim::{GreenhouseSim, Scenario};
    use std::{cell::RefCell, rc::Rc};

    let scenario = env::var("SIM_SCENARIO")
        .map(|s| Scenario::from_str_lossy(&s))
        .unwrap_or(Scenario::Temperate);
    let day_s: f64 = env::var("SIM_DAY_S")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(600.0);

    info!(%scenario, day_s, "running against the greenhouse simulator");

    let sim = Rc::new(RefCell::new(GreenhouseSim::new(scenario, day_s)));
    let relays = relay::SimulatedRelays::new(RelayBoard::new(&cfg.relays)?, Rc::clone(&sim));
    Ok((sim, relays))
}
