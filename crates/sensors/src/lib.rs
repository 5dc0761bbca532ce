//! Sensor-side hardware for the greenhouse controller.
//!
//! The controller only ever talks to [`SensorHardware`].  Two implementations
//! ship with this crate:
//!
//! - [`board::Board`] (feature `hw`): ADS1115 + SHT3x over I2C and two
//!   switched probe supply rails on Raspberry Pi GPIO.
//! - [`sim::GreenhouseSim`] (feature `sim`): a stateful simulator for local
//!   development that reacts to the controller's actuators.

pub mod adc;
pub mod climate;

#[cfg(feature = "hw")]
pub mod board;
#[cfg(feature = "sim")]
pub mod sim;

use std::cell::RefCell;
use std::rc::Rc;

/// One temperature/humidity sample exactly as the sensor reported it.
/// Plausibility filtering is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Climate {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// The two analog probes.  Each sits on its own switched supply rail so it
/// is only powered while being read (limits electrolysis on the soil probe).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Soil,
    Light,
}

/// Read-side port between the control loop and physical sensors.
pub trait SensorHardware {
    /// Read ambient temperature and humidity.
    fn read_climate(&mut self) -> anyhow::Result<Climate>;

    /// Switch the supply rail feeding `probe`.
    fn set_power(&mut self, probe: Probe, on: bool) -> anyhow::Result<()>;

    /// Read the raw ADC value for `probe` (0..=[`raw_max`](Self::raw_max)).
    fn read_raw(&mut self, probe: Probe) -> anyhow::Result<u16>;

    /// Full-scale raw value, used to normalise readings to percent.
    fn raw_max(&self) -> u16;
}

// Lets the simulator be shared between the sensing side and the relay side
// of the same single-threaded loop.
impl<T: SensorHardware> SensorHardware for Rc<RefCell<T>> {
    fn read_climate(&mut self) -> anyhow::Result<Climate> {
        self.borrow_mut().read_climate()
    }

    fn set_power(&mut self, probe: Probe, on: bool) -> anyhow::Result<()> {
        self.borrow_mut().set_power(probe, on)
    }

    fn read_raw(&mut self, probe: Probe) -> anyhow::Result<u16> {
        self.borrow_mut().read_raw(probe)
    }

    fn raw_max(&self) -> u16 {
        self.borrow().raw_max()
    }
}
