//! SHT3x temperature/humidity sensor over I2C.
//!
//! Single-shot, high repeatability, clock stretching disabled.  Each
//! measurement returns six bytes: temperature (2) + CRC, humidity (2) + CRC.

use anyhow::{ensure, Result};

use crate::Climate;

#[cfg(feature = "hw")]
use rppal::i2c::I2c;
#[cfg(feature = "hw")]
use std::{thread, time::Duration};

/// Single-shot measurement, high repeatability, no clock stretching.
#[cfg(feature = "hw")]
const CMD_MEASURE_HIGH: [u8; 2] = [0x24, 0x00];

/// Datasheet maximum for a high-repeatability measurement is 15.5 ms.
#[cfg(feature = "hw")]
const MEASURE_WAIT: Duration = Duration::from_millis(16);

const CRC_POLY: u8 = 0x31;
const CRC_INIT: u8 = 0xFF;

/// Sensirion CRC-8 over one 16-bit word.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC_INIT;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

pub fn raw_to_celsius(raw: u16) -> f32 {
    -45.0 + 175.0 * f32::from(raw) / 65535.0
}

pub fn raw_to_humidity(raw: u16) -> f32 {
    100.0 * f32::from(raw) / 65535.0
}

/// Decode a measurement frame, rejecting it if either CRC fails.
pub fn decode(frame: &[u8; 6]) -> Result<Climate> {
    ensure!(
        crc8(&frame[0..2]) == frame[2],
        "sht3x temperature crc mismatch"
    );
    ensure!(crc8(&frame[3..5]) == frame[5], "sht3x humidity crc mismatch");

    let t_raw = u16::from_be_bytes([frame[0], frame[1]]);
    let rh_raw = u16::from_be_bytes([frame[3], frame[4]]);

    Ok(Climate {
        temperature_c: raw_to_celsius(t_raw),
        humidity_pct: raw_to_humidity(rh_raw),
    })
}

#[cfg(feature = "hw")]
pub struct Sht3x {
    i2c: I2c,
}

#[cfg(feature = "hw")]
impl Sht3x {
    pub fn new(addr: u16) -> Result<Self> {
        let mut i2c = I2c::new()?;
        i2c.set_slave_address(addr)?;
        tracing::info!(addr = format_args!("0x{addr:02x}"), "sht3x initialised");
        Ok(Self { i2c })
    }

    pub fn measure(&mut self) -> Result<Climate> {
        self.i2c.write(&CMD_MEASURE_HIGH)?;
        thread::sleep(MEASURE_WAIT);

        let mut frame = [0u8; 6];
        let n = self.i2c.read(&mut frame)?;
        ensure!(n == frame.len(), "sht3x short read ({n} bytes)");
        decode(&frame)
    }
}
