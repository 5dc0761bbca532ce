//! Relay outputs for fan, pump and grow light, plus the status LED that
//! mirrors the grow light.  The `gpio` feature gates the real rppal driver;
//! without it, a mock board logs state changes.

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::RelaySettings;
use crate::state::Actuator;

#[cfg(feature = "gpio")]
use anyhow::Context;
#[cfg(feature = "gpio")]
use rppal::gpio::{Gpio, OutputPin};

#[cfg(not(feature = "gpio"))]
use greenhouse_sensors::sim::GreenhouseSim;
#[cfg(not(feature = "gpio"))]
use std::{cell::RefCell, rc::Rc};

/// Write-side port: the control loop commands outputs only through this.
pub trait Outputs {
    fn set(&mut self, actuator: Actuator, on: bool);

    fn set_status_led(&mut self, on: bool);

    fn all_off(&mut self) {
        for a in Actuator::ALL {
            self.set(a, false);
        }
        self.set_status_led(false);
    }
}

fn on_off(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

// ---------------------------------------------------------------------------
// Real GPIO relay board (production — requires rppal + Raspberry Pi hardware)
// ---------------------------------------------------------------------------
#[cfg(feature = "gpio")]
pub struct RelayBoard {
    relays: HashMap<Actuator, OutputPin>,
    status_led: OutputPin,
    active_low: bool, // many relay boards are active-low
}

#[cfg(feature = "gpio")]
impl RelayBoard {
    pub fn new(settings: &RelaySettings) -> Result<Self> {
        let gpio = Gpio::new()?;
        let mut relays = HashMap::new();

        for (actuator, pin_num) in settings.pins() {
            let mut pin = gpio
                .get(pin_num)
                .with_context(|| format!("{} relay gpio {pin_num}", actuator.as_str()))?
                .into_output();

            // Fail-safe: ensure "OFF" at startup
            if settings.active_low {
                pin.set_high();
            } else {
                pin.set_low();
            }
            relays.insert(actuator, pin);
        }

        let status_led = gpio
            .get(settings.status_led)
            .with_context(|| format!("status led gpio {}", settings.status_led))?
            .into_output_low();

        info!(active_low = settings.active_low, "relay board initialised");

        Ok(Self {
            relays,
            status_led,
            active_low: settings.active_low,
        })
    }
}

#[cfg(feature = "gpio")]
impl Outputs for RelayBoard {
    fn set(&mut self, actuator: Actuator, on: bool) {
        if let Some(pin) = self.relays.get_mut(&actuator) {
            // active-low: LOW energises the coil
            if on != self.active_low {
                pin.set_high();
            } else {
                pin.set_low();
            }
            debug!(actuator = actuator.as_str(), "relay set {}", on_off(on));
        }
    }

    fn set_status_led(&mut self, on: bool) {
        if on {
            self.status_led.set_high();
        } else {
            self.status_led.set_low();
        }
    }
}

// ---------------------------------------------------------------------------
// Mock relay board (development — no hardware, logs state)
// ---------------------------------------------------------------------------
#[cfg(not(feature = "gpio"))]
pub struct RelayBoard {
    pub(crate) relays: HashMap<Actuator, bool>,
    pub(crate) status_led: bool,
}

#[cfg(not(feature = "gpio"))]
impl RelayBoard {
    pub fn new(settings: &RelaySettings) -> Result<Self> {
        let mut relays = HashMap::new();
        for (actuator, pin_num) in settings.pins() {
            info!(
                actuator = actuator.as_str(),
                gpio = pin_num,
                "[mock-gpio] registered relay (not wired)"
            );
            relays.insert(actuator, false);
        }
        info!("[mock-gpio] relay board initialised (no hardware)");
        Ok(Self {
            relays,
            status_led: false,
        })
    }
}

#[cfg(not(feature = "gpio"))]
impl Outputs for RelayBoard {
    fn set(&mut self, actuator: Actuator, on: bool) {
        if let Some(state) = self.relays.get_mut(&actuator) {
            if *state != on {
                info!(actuator = actuator.as_str(), "[mock-gpio] relay set {}", on_off(on));
            }
            *state = on;
        } else {
            debug!(actuator = actuator.as_str(), "[mock-gpio] relay not registered");
        }
    }

    fn set_status_led(&mut self, on: bool) {
        self.status_led = on;
    }
}

// ---------------------------------------------------------------------------
// Simulation link: forwards every command to the simulator as well
// ---------------------------------------------------------------------------
#[cfg(not(feature = "gpio"))]
pub struct SimulatedRelays {
    board: RelayBoard,
    sim: Rc<RefCell<GreenhouseSim>>,
}

#[cfg(not(feature = "gpio"))]
impl SimulatedRelays {
    pub fn new(board: RelayBoard, sim: Rc<RefCell<GreenhouseSim>>) -> Self {
        Self { board, sim }
    }
}

#[cfg(not(feature = "gpio"))]
impl Outputs for SimulatedRelays {
    fn set(&mut self, actuator: Actuator, on: bool) {
        self.board.set(actuator, on);
        let mut sim = self.sim.borrow_mut();
        match actuator {
            Actuator::Fan => sim.set_fan(on),
            Actuator::Pump => sim.set_pump(on),
            Actuator::Light => sim.set_grow_light(on),
        }
    }

    fn set_status_led(&mut self, on: bool) {
        self.board.set_status_led(on);
    }
}

// ===========================================================================
// Tests
// ===========================================================================
