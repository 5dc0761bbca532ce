//! ADS1115 16-bit ADC driver over I2C for the soil and light probes.
//!
//! Reads single-ended channels at PGA ±4.096 V, 128 SPS, single-shot mode.
//! With the probes powered from 3.3 V a single-ended read never exceeds
//! [`RAW_MAX`].

#[cfg(feature = "hw")]
use rppal::i2c::I2c;
#[cfg(feature = "hw")]
use std::{thread, time::Duration};

#[cfg(feature = "hw")]
use crate::Probe;

// ── ADS1115 register addresses ──────────────────────────────────────────────

/// Conversion result register (read-only, 16-bit signed).
#[cfg(feature = "hw")]
const REG_CONVERSION: u8 = 0x00;
/// Configuration register (read/write).
#[cfg(feature = "hw")]
const REG_CONFIG: u8 = 0x01;

// ── Config register bit fields ──────────────────────────────────────────────
//
// Layout (MSB first):
//   [15]    OS       — write 1 to start single-shot conversion
//   [14:12] MUX      — input multiplexer (channel selection)
//   [11:9]  PGA      — programmable gain amplifier
//   [8]     MODE     — 0 = continuous, 1 = single-shot
//   [7:5]   DR       — data rate
//   [4]     COMP_MODE
//   [3]     COMP_POL
//   [2]     COMP_LAT
//   [1:0]   COMP_QUE — 11 = disable comparator (default)

/// OS=1 (start), PGA=001 (±4.096 V), MODE=1 (single-shot),
/// DR=100 (128 SPS), COMP_QUE=11 (comparator off).
const CONFIG_BASE: u16 = 0b1_000_001_1_100_0_0_0_11;

/// MUX values for single-ended reads (AINx vs GND).
const MUX_SHIFT: u8 = 12;
const MUX_SINGLE_ENDED: [u16; 4] = [0b100, 0b101, 0b110, 0b111];

/// Maximum valid ADS1115 channel index (0–3 for single-ended).
pub const MAX_CHANNEL: usize = 3;

/// Full-scale single-ended reading (15-bit unsigned).
pub const RAW_MAX: u16 = 32767;

/// Conversion time at 128 SPS is ~7.8 ms.
#[cfg(feature = "hw")]
const CONVERSION_WAIT: Duration = Duration::from_millis(9);

/// Bit 15 of the config register: conversion-ready flag when read.
#[cfg(feature = "hw")]
const OS_READY_BIT: u16 = 1 << 15;

/// Build the config register value for a single-ended read on `channel`.
#[cfg_attr(not(feature = "hw"), allow(dead_code))]
fn config_for_channel(channel: usize) -> u16 {
    CONFIG_BASE | (MUX_SINGLE_ENDED[channel] << MUX_SHIFT)
}

/// Map a signed conversion result onto the single-ended range.  Negative
/// values only appear on bus corruption or a floating input.
pub fn clamp_single_ended(raw: i16) -> u16 {
    raw.max(0) as u16
}

// ── Driver ──────────────────────────────────────────────────────────────────

/// ADS1115 driver backed by `rppal::i2c`, with one channel per probe.
#[cfg(feature = "hw")]
pub struct Ads1115 {
    i2c: I2c,
    soil_channel: usize,
    light_channel: usize,
}

#[cfg(feature = "hw")]
impl Ads1115 {
    /// Open I2C bus 1 and address the ADS1115 at `addr`.
    pub fn new(addr: u16, soil_channel: usize, light_channel: usize) -> anyhow::Result<Self> {
        for ch in [soil_channel, light_channel] {
            anyhow::ensure!(
                ch <= MAX_CHANNEL,
                "ADS1115 channel {ch} out of range (0–{MAX_CHANNEL})"
            );
        }
        anyhow::ensure!(
            soil_channel != light_channel,
            "soil and light probes share ADS1115 channel {soil_channel}"
        );

        let mut i2c = I2c::new()?;
        i2c.set_slave_address(addr)?;

        tracing::info!(
            addr = format_args!("0x{addr:02x}"),
            soil_channel,
            light_channel,
            "ads1115 initialised"
        );

        Ok(Self {
            i2c,
            soil_channel,
            light_channel,
        })
    }

    /// Single-shot read of the channel wired to `probe`.
    pub fn read_probe(&mut self, probe: Probe) -> anyhow::Result<u16> {
        let channel = match probe {
            Probe::Soil => self.soil_channel,
            Probe::Light => self.light_channel,
        };
        let raw = self.read_channel(channel)?;
        Ok(clamp_single_ended(raw))
    }

    fn read_channel(&mut self, channel: usize) -> anyhow::Result<i16> {
        let config = config_for_channel(channel);
        self.i2c.block_write(REG_CONFIG, &config.to_be_bytes())?;

        thread::sleep(CONVERSION_WAIT);

        // One wait is normally enough at 128 SPS.
        let mut ready = false;
        for _ in 0..3 {
            let mut buf = [0u8; 2];
            self.i2c.block_read(REG_CONFIG, &mut buf)?;
            if u16::from_be_bytes(buf) & OS_READY_BIT != 0 {
                ready = true;
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        anyhow::ensure!(ready, "ads1115 conversion on channel {channel} never completed");

        let mut buf = [0u8; 2];
        self.i2c.block_read(REG_CONVERSION, &mut buf)?;
        Ok(i16::from_be_bytes(buf))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
