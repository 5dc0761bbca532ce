//! Device health snapshot: free memory, Wi-Fi signal, uptime.

use std::path::PathBuf;

use sysinfo::System;

use crate::clock::DeviceClock;

const WIRELESS_PATH: &str = "/proc/net/wireless";

#[derive(Debug, Clone, PartialEq)]
pub struct HealthSnapshot {
    /// Available memory in bytes.
    pub free_heap: u64,
    /// Signal level in dBm; `None` without a wireless interface.
    pub wifi_rssi: Option<i32>,
    pub uptime_s: u64,
    pub status: &'static str,
}

pub struct HealthProbe {
    system: System,
    wireless: PathBuf,
}

impl HealthProbe {
    pub fn new() -> Self {
        Self::with_wireless_path(WIRELESS_PATH)
    }

    pub fn with_wireless_path(path: impl Into<PathBuf>) -> Self {
        let mut system = System::new();
        system.refresh_memory();
        Self {
            system,
            wireless: path.into(),
        }
    }

    pub fn sample(&mut self, clock: &DeviceClock) -> HealthSnapshot {
        self.system.refresh_memory();

        let wifi_rssi = std::fs::read_to_string(&self.wireless)
            .ok()
            .and_then(|s| parse_wireless(&s));

        HealthSnapshot {
            free_heap: self.system.available_memory(),
            wifi_rssi,
            uptime_s: clock.uptime().as_secs(),
            status: "online",
        }
    }
}

/// Signal level of the first interface listed in `/proc/net/wireless`.
///
/// ```text
/// Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
///  face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
///  wlan0: 0000   54.  -56.  -256        0      0      0      0     12        0
/// ```
pub fn parse_wireless(contents: &str) -> Option<i32> {
    contents
        .lines()
        .skip(2)
        .find_map(|line| line.split_once(':'))
        .and_then(|(_, stats)| stats.split_whitespace().nth(2))
        .and_then(|level| level.trim_end_matches('.').parse::<f32>().ok())
        .map(|dbm| dbm.round() as i32)
}

// ===========================================================================
// Tests
// ===========================================================================
