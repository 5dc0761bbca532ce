//! Sensor acquisition with validity filtering.
//!
//! A failed read never overwrites a cached value: the field keeps its last
//! known-good value (or stays `None` if there never was one).

use std::ops::RangeInclusive;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use greenhouse_sensors::{Probe, SensorHardware};

use crate::state::SensorReading;

const HUMIDITY_RANGE: RangeInclusive<f32> = 0.0..=100.0;

pub struct SensorAcquisition<H> {
    hw: H,
    settle: Duration,
    temperature_range: RangeInclusive<f32>,
}

impl<H: SensorHardware> SensorAcquisition<H> {
    pub fn new(hw: H, settle: Duration, temperature_range: RangeInclusive<f32>) -> Self {
        Self {
            hw,
            settle,
            temperature_range,
        }
    }

    /// Refresh `reading` in place.  Blocks for the rail settle delay.
    pub async fn sample(&mut self, reading: &mut SensorReading) {
        self.sample_climate(reading);

        let (soil, light) = self.sample_probes().await;
        let max = self.hw.raw_max();
        if let Some(raw) = soil {
            reading.soil_moisture_pct = Some(moisture_percent(raw, max));
        }
        if let Some(raw) = light {
            reading.light_pct = Some(light_percent(raw, max));
        }

        debug!(
            temperature = ?reading.temperature,
            humidity = ?reading.humidity,
            soil_moisture = ?reading.soil_moisture_pct,
            light = ?reading.light_pct,
            "sensors sampled"
        );
    }

    fn sample_climate(&mut self, reading: &mut SensorReading) {
        let climate = match self.hw.read_climate() {
            Ok(c) => c,
            Err(e) => {
                warn!("climate sensor read failed, keeping last values: {e:#}");
                return;
            }
        };

        if plausible(climate.temperature_c, &self.temperature_range) {
            reading.temperature = Some(climate.temperature_c);
        } else {
            warn!(value = climate.temperature_c, "implausible temperature ignored");
        }

        if plausible(climate.humidity_pct, &HUMIDITY_RANGE) {
            reading.humidity = Some(climate.humidity_pct);
        } else {
            warn!(value = climate.humidity_pct, "implausible humidity ignored");
        }
    }

    /// Power both probe rails, wait for them to settle, read, and power
    /// them down again.  A probe whose rail failed to switch on is skipped.
    async fn sample_probes(&mut self) -> (Option<u16>, Option<u16>) {
        let soil_on = self.power(Probe::Soil, true);
        let light_on = self.power(Probe::Light, true);

        if soil_on || light_on {
            sleep(self.settle).await;
        }

        let soil = if soil_on { self.read(Probe::Soil) } else { None };
        let light = if light_on { self.read(Probe::Light) } else { None };

        self.power(Probe::Soil, false);
        self.power(Probe::Light, false);

        (soil, light)
    }

    fn power(&mut self, probe: Probe, on: bool) -> bool {
        match self.hw.set_power(probe, on) {
            Ok(()) => true,
            Err(e) => {
                warn!(?probe, on, "probe rail switch failed: {e:#}");
                false
            }
        }
    }

    fn read(&mut self, probe: Probe) -> Option<u16> {
        match self.hw.read_raw(probe) {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!(?probe, "probe read failed, keeping last value: {e:#}");
                None
            }
        }
    }
}

fn plausible(v: f32, range: &RangeInclusive<f32>) -> bool {
    // NaN fails `contains`.
    range.contains(&v)
}

/// Capacitive soil probes read high when dry, so the scale is inverted.
pub fn moisture_percent(raw: u16, max: u16) -> f32 {
    if max == 0 {
        return 0.0;
    }
    (100.0 - f32::from(raw) * 100.0 / f32::from(max)).clamp(0.0, 100.0)
}

pub fn light_percent(raw: u16, max: u16) -> u8 {
    if max == 0 {
        return 0;
    }
    (f32::from(raw) * 100.0 / f32::from(max))
        .round()
        .clamp(0.0, 100.0) as u8
}

// ===========================================================================
// Tests
// ===========================================================================
