//! Real sensor board: ADS1115 + SHT3x on I2C bus 1 and two GPIO outputs
//! switching the probe supply rails.

use anyhow::{Context, Result};
use rppal::gpio::{Gpio, OutputPin};

use crate::adc::{Ads1115, RAW_MAX};
use crate::climate::Sht3x;
use crate::{Climate, Probe, SensorHardware};

/// Wiring of the sensor board.
#[derive(Debug, Clone)]
pub struct BoardWiring {
    pub adc_addr: u16,
    pub climate_addr: u16,
    pub soil_channel: usize,
    pub light_channel: usize,
    /// BCM pin switching the soil probe supply.
    pub soil_power_pin: u8,
    /// BCM pin switching the light sensor supply.
    pub light_power_pin: u8,
}

pub struct Board {
    adc: Ads1115,
    climate: Sht3x,
    soil_power: OutputPin,
    light_power: OutputPin,
}

impl Board {
    pub fn open(wiring: &BoardWiring) -> Result<Self> {
        let adc = Ads1115::new(wiring.adc_addr, wiring.soil_channel, wiring.light_channel)
            .context("failed to open ADS1115")?;
        let climate = Sht3x::new(wiring.climate_addr).context("failed to open SHT3x")?;

        let gpio = Gpio::new()?;
        // Both rails start unpowered.
        let soil_power = gpio
            .get(wiring.soil_power_pin)
            .with_context(|| format!("soil rail gpio {}", wiring.soil_power_pin))?
            .into_output_low();
        let light_power = gpio
            .get(wiring.light_power_pin)
            .with_context(|| format!("light rail gpio {}", wiring.light_power_pin))?
            .into_output_low();

        Ok(Self {
            adc,
            climate,
            soil_power,
            light_power,
        })
    }
}

impl SensorHardware for Board {
    fn read_climate(&mut self) -> Result<Climate> {
        self.climate.measure()
    }

    fn set_power(&mut self, probe: Probe, on: bool) -> Result<()> {
        let pin = match probe {
            Probe::Soil => &mut self.soil_power,
            Probe::Light => &mut self.light_power,
        };
        if on {
            pin.set_high();
        } else {
            pin.set_low();
        }
        Ok(())
    }

    fn read_raw(&mut self, probe: Probe) -> Result<u16> {
        self.adc.read_probe(probe)
    }

    fn raw_max(&self) -> u16 {
        RAW_MAX
    }
}
