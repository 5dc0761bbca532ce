//! TOML config file loading and validation.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use greenhouse_sensors::adc::MAX_CHANNEL;

use crate::state::{Actuator, ThresholdConfig, ThresholdKind};

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteSettings,
    pub timing: TimingSettings,
    pub thresholds: ThresholdSettings,
    pub sensors: SensorSettings,
    pub relays: RelaySettings,
    pub schema: SchemaSettings,
    pub reboot: RebootSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Rest,
    Mqtt,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub backend: Backend,
    /// REST base URL, e.g. `https://<project>.firebaseio.com`.
    pub url: String,
    /// Pre-issued token; usually supplied via `REMOTE_AUTH` instead.
    pub auth: Option<String>,
    pub timeout_s: u64,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub client_id: String,
    pub topic_prefix: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Rest,
            url: String::new(),
            auth: None,
            timeout_s: 10,
            mqtt_host: "127.0.0.1".into(),
            mqtt_port: 1883,
            client_id: "greenhouse-controller".into(),
            topic_prefix: "greenhouse".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Main loop tick.
    pub cycle_ms: u64,
    /// Sensing + actuation + state push cadence.
    pub telemetry_s: u64,
    /// Health snapshot cadence.
    pub health_s: u64,
    /// Probe rail settle time before an ADC read.
    pub settle_ms: u64,
    /// Wait between clearing the reboot flag and restarting.
    pub reboot_flush_ms: u64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            cycle_ms: 1000,
            telemetry_s: 10,
            health_s: 60,
            settle_ms: 500,
            reboot_flush_ms: 1000,
        }
    }
}

impl TimingSettings {
    pub fn cycle(&self) -> Duration {
        Duration::from_millis(self.cycle_ms)
    }

    pub fn telemetry(&self) -> Duration {
        Duration::from_secs(self.telemetry_s)
    }

    pub fn health(&self) -> Duration {
        Duration::from_secs(self.health_s)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn reboot_flush(&self) -> Duration {
        Duration::from_millis(self.reboot_flush_ms)
    }
}

/// Thresholds in force at boot, until the remote store supplies others.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ThresholdSettings {
    pub temperature: i64,
    pub moisture: i64,
    pub light: i64,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        Self {
            temperature: 30,
            moisture: 40,
            light: 30,
        }
    }
}

impl ThresholdSettings {
    pub fn to_config(&self) -> ThresholdConfig {
        ThresholdConfig {
            temperature: self.temperature,
            moisture: self.moisture,
            light: self.light,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    pub adc_addr: u16,
    pub climate_addr: u16,
    pub soil_channel: usize,
    pub light_channel: usize,
    pub soil_power_pin: u8,
    pub light_power_pin: u8,
    /// Plausible temperature range; anything outside is a sensor fault.
    pub temperature_min: f32,
    pub temperature_max: f32,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            adc_addr: 0x48,
            climate_addr: 0x44,
            soil_channel: 0,
            light_channel: 1,
            soil_power_pin: 23,
            light_power_pin: 24,
            temperature_min: -40.0,
            temperature_max: 85.0,
        }
    }
}

#[cfg(feature = "gpio")]
impl SensorSettings {
    pub fn wiring(&self) -> greenhouse_sensors::board::BoardWiring {
        greenhouse_sensors::board::BoardWiring {
            adc_addr: self.adc_addr,
            climate_addr: self.climate_addr,
            soil_channel: self.soil_channel,
            light_channel: self.light_channel,
            soil_power_pin: self.soil_power_pin,
            light_power_pin: self.light_power_pin,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    pub fan: u8,
    pub pump: u8,
    pub light: u8,
    pub status_led: u8,
    /// Many common relay boards are active-low.
    pub active_low: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            fan: 17,
            pump: 27,
            light: 22,
            status_led: 5,
            active_low: true,
        }
    }
}

impl RelaySettings {
    pub fn pins(&self) -> [(Actuator, u8); 3] {
        [
            (Actuator::Fan, self.fan),
            (Actuator::Pump, self.pump),
            (Actuator::Light, self.light),
        ]
    }
}

/// Remote paths read by the loop.  Multi-entry lists are candidates in
/// priority order, one per schema generation.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    pub automation: Vec<String>,
    pub reboot_request: String,
    pub temperature_threshold: Vec<String>,
    pub moisture_threshold: Vec<String>,
    pub light_threshold: Vec<String>,
    pub fan_override: Vec<String>,
    pub pump_override: Vec<String>,
    pub light_override: Vec<String>,
}

fn paths(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            automation: paths(&["settings/automation"]),
            reboot_request: "system/reboot_request".into(),
            temperature_threshold: paths(&[
                "settings/temp_threshold",
                "system_thresholds/temp_thresh",
            ]),
            moisture_threshold: paths(&[
                "settings/moisture_threshold",
                "system_thresholds/moist_thresh",
            ]),
            light_threshold: paths(&[
                "settings/light_threshold",
                "system_thresholds/lum_thresh",
            ]),
            fan_override: paths(&["manual_control/fan", "actuator_status/fan"]),
            pump_override: paths(&["manual_control/pump", "actuator_status/pump"]),
            light_override: paths(&["manual_control/light", "actuator_status/light"]),
        }
    }
}

impl SchemaSettings {
    pub fn threshold_paths(&self, kind: ThresholdKind) -> &[String] {
        match kind {
            ThresholdKind::Temperature => &self.temperature_threshold,
            ThresholdKind::Moisture => &self.moisture_threshold,
            ThresholdKind::Light => &self.light_threshold,
        }
    }

    pub fn override_paths(&self, actuator: Actuator) -> &[String] {
        match actuator {
            Actuator::Fan => &self.fan_override,
            Actuator::Pump => &self.pump_override,
            Actuator::Light => &self.light_override,
        }
    }

    /// Every path the device reads, without leading or trailing slashes
    /// and without duplicates.
    pub fn read_paths(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.automation
            .iter()
            .chain(std::iter::once(&self.reboot_request))
            .chain(ThresholdKind::ALL.iter().flat_map(|k| self.threshold_paths(*k)))
            .chain(Actuator::ALL.iter().flat_map(|a| self.override_paths(*a)))
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RebootSettings {
    /// Command run just before the process exits, e.g.
    /// `["sudo", "systemctl", "reboot"]`.  Without one the process simply
    /// exits and its supervisor restarts it.
    pub command: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// GPIO whitelist
// ---------------------------------------------------------------------------

/// BCM GPIO pins available on the Raspberry Pi 40-pin header for general
/// use. GPIO 0-1 are reserved for the ID EEPROM and must never be used.
/// GPIO 28+ are not exposed on the standard header.
const VALID_GPIO_PINS: &[i64] = &[
    2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27,
];

/// GPIO 2/3 carry I2C bus 1, which the sensor board needs.
const I2C_PINS: &[i64] = &[2, 3];

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all sections. Returns `Ok(())` or an error describing every
    /// violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        self.validate_remote(&mut errors);
        self.validate_timing(&mut errors);
        self.validate_thresholds(&mut errors);
        self.validate_sensors(&mut errors);
        self.validate_pins(&mut errors);
        self.validate_schema(&mut errors);

        if let Some(cmd) = &self.reboot.command {
            if cmd.first().map_or(true, |c| c.trim().is_empty()) {
                errors.push("reboot.command: must name a program".into());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }

    fn validate_remote(&self, errors: &mut Vec<String>) {
        let r = &self.remote;
        match r.backend {
            Backend::Rest => {
                if r.url.trim().is_empty() {
                    errors.push("remote.url: required for the rest backend".into());
                } else if !(r.url.starts_with("http://") || r.url.starts_with("https://")) {
                    errors.push(format!("remote.url: '{}' is not an http(s) URL", r.url));
                }
            }
            Backend::Mqtt => {
                if r.mqtt_host.trim().is_empty() {
                    errors.push("remote.mqtt_host: required for the mqtt backend".into());
                }
                if r.mqtt_port == 0 {
                    errors.push("remote.mqtt_port: must be non-zero".into());
                }
                if r.client_id.trim().is_empty() {
                    errors.push("remote.client_id: is empty".into());
                }
                if r.topic_prefix.contains(['#', '+']) {
                    errors.push(format!(
                        "remote.topic_prefix: '{}' contains an mqtt wildcard",
                        r.topic_prefix
                    ));
                }
            }
        }
        if r.timeout_s == 0 {
            errors.push("remote.timeout_s: must be positive".into());
        }
    }

    fn validate_timing(&self, errors: &mut Vec<String>) {
        let t = &self.timing;
        for (name, v) in [
            ("cycle_ms", t.cycle_ms),
            ("telemetry_s", t.telemetry_s),
            ("health_s", t.health_s),
            ("reboot_flush_ms", t.reboot_flush_ms),
        ] {
            if v == 0 {
                errors.push(format!("timing.{name}: must be positive"));
            }
        }
        if t.settle_ms < 500 {
            errors.push(format!(
                "timing.settle_ms: {} is below the 500 ms probe settle minimum",
                t.settle_ms
            ));
        }
        if t.telemetry_s > 0 && t.cycle_ms > t.telemetry_s * 1000 {
            errors.push(format!(
                "timing.cycle_ms ({}) is longer than telemetry_s ({}s)",
                t.cycle_ms, t.telemetry_s
            ));
        }
    }

    fn validate_thresholds(&self, errors: &mut Vec<String>) {
        let cfg = self.thresholds.to_config();
        for kind in ThresholdKind::ALL {
            let v = cfg.get(kind);
            if !kind.accepts(v) {
                errors.push(format!(
                    "thresholds.{kind}: {v} out of range (0, {}]",
                    kind.max()
                ));
            }
        }
    }

    fn validate_sensors(&self, errors: &mut Vec<String>) {
        let s = &self.sensors;
        for (name, ch) in [("soil_channel", s.soil_channel), ("light_channel", s.light_channel)] {
            if ch > MAX_CHANNEL {
                errors.push(format!(
                    "sensors.{name}: {ch} exceeds ADS1115 maximum ({MAX_CHANNEL})"
                ));
            }
        }
        if s.soil_channel == s.light_channel {
            errors.push(format!(
                "sensors: soil and light probes share ADC channel {}",
                s.soil_channel
            ));
        }
        if s.adc_addr == s.climate_addr {
            errors.push(format!(
                "sensors: adc_addr and climate_addr are both 0x{:02x}",
                s.adc_addr
            ));
        }
        if s.temperature_min >= s.temperature_max {
            errors.push(format!(
                "sensors: temperature_min ({}) must be below temperature_max ({})",
                s.temperature_min, s.temperature_max
            ));
        }
    }

    /// Every output pin must be on the header whitelist, off the I2C bus,
    /// and used once.
    fn validate_pins(&self, errors: &mut Vec<String>) {
        let r = &self.relays;
        let s = &self.sensors;
        let pins: [(&str, i64); 6] = [
            ("relays.fan", r.fan.into()),
            ("relays.pump", r.pump.into()),
            ("relays.light", r.light.into()),
            ("relays.status_led", r.status_led.into()),
            ("sensors.soil_power_pin", s.soil_power_pin.into()),
            ("sensors.light_power_pin", s.light_power_pin.into()),
        ];

        let mut seen: HashSet<i64> = HashSet::new();
        for (name, pin) in pins {
            if !VALID_GPIO_PINS.contains(&pin) {
                errors.push(format!(
                    "{name}: {pin} is not a valid BCM GPIO pin (allowed: 2-27)"
                ));
            } else if I2C_PINS.contains(&pin) {
                errors.push(format!("{name}: gpio {pin} is reserved for I2C"));
            } else if !seen.insert(pin) {
                errors.push(format!("{name}: gpio {pin} is already used by another output"));
            }
        }
    }

    fn validate_schema(&self, errors: &mut Vec<String>) {
        let sc = &self.schema;
        let mut lists: Vec<(String, &[String])> = vec![("automation".into(), &sc.automation)];
        for kind in ThresholdKind::ALL {
            lists.push((format!("{kind}_threshold"), sc.threshold_paths(kind)));
        }
        for a in Actuator::ALL {
            lists.push((format!("{}_override", a.as_str()), sc.override_paths(a)));
        }

        for (name, list) in lists {
            if list.is_empty() {
                errors.push(format!("schema.{name}: needs at least one path"));
            }
            if list.iter().any(|p| p.trim_matches('/').trim().is_empty()) {
                errors.push(format!("schema.{name}: contains an empty path"));
            }
        }
        if sc.reboot_request.trim_matches('/').trim().is_empty() {
            errors.push("schema.reboot_request: is empty".into());
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read, parse, apply environment overrides, and validate a TOML config.
pub fn load(path: &str) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config: {path}"))?;
    let mut config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?;
    config.apply_env(|k| std::env::var(k).ok());
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

impl Config {
    /// `REMOTE_URL` and `REMOTE_AUTH` win over the file, so the token never
    /// has to live in it.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("REMOTE_URL").filter(|v| !v.is_empty()) {
            self.remote.url = url;
        }
        if let Some(auth) = var("REMOTE_AUTH").filter(|v| !v.is_empty()) {
            self.remote.auth = Some(auth);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Baseline config that passes validation.
    fn valid_config() -> Config {
        let mut cfg = Config::default();
        cfg.remote.url = "https://greenhouse.example.com".into();
        cfg
    }

    /// Assert validation fails and the error message contains `needle`.
    fn assert_validation_err(cfg: &Config, needle: &str) {
        let err = cfg.validate().unwrap_err();
        let msg = format!("{err:#}");
        assert!(
            msg.contains(needle),
            "expected error containing {needle:?}, got: {msg}"
        );
    }

    // -- Parsing ----------------------------------------------------------

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[remote]
backend = "mqtt"
mqtt_host = "10.0.0.2"
mqtt_port = 1884
topic_prefix = "gh1"

[timing]
telemetry_s = 5
health_s = 120

[thresholds]
temperature = 31
moisture = 20
light = 20

[relays]
fan = 6
active_low = false

[schema]
fan_override = ["actuator_status/fan"]

[reboot]
command = ["sudo", "systemctl", "reboot"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.remote.backend, Backend::Mqtt);
        assert_eq!(config.remote.mqtt_port, 1884);
        assert_eq!(config.timing.telemetry_s, 5);
        assert_eq!(config.timing.settle_ms, 500, "unset field keeps default");
        assert_eq!(config.thresholds.temperature, 31);
        assert_eq!(config.relays.fan, 6);
        assert_eq!(config.relays.pump, 27);
        assert!(!config.relays.active_low);
        assert_eq!(config.schema.fan_override, vec!["actuator_status/fan"]);
        assert_eq!(config.schema.pump_override.len(), 2);
        config.validate().unwrap();
    }

    #[test]
    fn shipped_config_is_valid() {
        let config: Config = toml::from_str(include_str!("../../../config.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.sensors.adc_addr, 0x48);
    }

    #[test]
    fn parse_empty_config_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.remote.backend, Backend::Rest);
        assert_eq!(config.timing.cycle_ms, 1000);
        assert_eq!(
            config.schema.temperature_threshold,
            vec!["settings/temp_threshold", "system_thresholds/temp_thresh"]
        );
        assert_eq!(config.thresholds.to_config().moisture, 40);
    }

    #[test]
    fn unknown_backend_rejected_at_parse() {
        let err = toml::from_str::<Config>("[remote]\nbackend = \"grpc\"").unwrap_err();
        assert!(err.to_string().contains("grpc"), "{err}");
    }

    // -- Validation: valid configs pass -----------------------------------

    #[test]
    fn valid_config_passes() {
        valid_config().validate().unwrap();
    }

    #[test]
    fn mqtt_backend_needs_no_url() {
        let mut cfg = Config::default();
        cfg.remote.backend = Backend::Mqtt;
        cfg.validate().unwrap();
    }

    // -- Remote -----------------------------------------------------------

    #[test]
    fn rest_without_url_rejected() {
        assert_validation_err(&Config::default(), "remote.url: required");
    }

    #[test]
    fn rest_url_must_be_http() {
        let mut cfg = valid_config();
        cfg.remote.url = "ftp://example.com".into();
        assert_validation_err(&cfg, "not an http(s) URL");
    }

    #[test]
    fn mqtt_prefix_wildcard_rejected() {
        let mut cfg = valid_config();
        cfg.remote.backend = Backend::Mqtt;
        cfg.remote.topic_prefix = "gh/#".into();
        assert_validation_err(&cfg, "mqtt wildcard");
    }

    #[test]
    fn env_overrides_url_and_auth() {
        let mut cfg = Config::default();
        cfg.apply_env(|k| match k {
            "REMOTE_URL" => Some("https://override.example.com".into()),
            "REMOTE_AUTH" => Some("secret".into()),
            _ => None,
        });
        assert_eq!(cfg.remote.url, "https://override.example.com");
        assert_eq!(cfg.remote.auth.as_deref(), Some("secret"));
    }

    #[test]
    fn empty_env_values_ignored() {
        let mut cfg = valid_config();
        cfg.apply_env(|_| Some(String::new()));
        assert_eq!(cfg.remote.url, "https://greenhouse.example.com");
        assert_eq!(cfg.remote.auth, None);
    }

    // -- Timing -----------------------------------------------------------

    #[test]
    fn settle_below_minimum_rejected() {
        let mut cfg = valid_config();
        cfg.timing.settle_ms = 100;
        assert_validation_err(&cfg, "below the 500 ms probe settle minimum");
    }

    #[test]
    fn zero_telemetry_interval_rejected() {
        let mut cfg = valid_config();
        cfg.timing.telemetry_s = 0;
        assert_validation_err(&cfg, "timing.telemetry_s: must be positive");
    }

    #[test]
    fn cycle_longer_than_telemetry_rejected() {
        let mut cfg = valid_config();
        cfg.timing.cycle_ms = 20_000;
        cfg.timing.telemetry_s = 10;
        assert_validation_err(&cfg, "longer than telemetry_s");
    }

    // -- Thresholds -------------------------------------------------------

    #[test]
    fn threshold_zero_rejected() {
        let mut cfg = valid_config();
        cfg.thresholds.moisture = 0;
        assert_validation_err(&cfg, "thresholds.moisture: 0 out of range (0, 100]");
    }

    #[test]
    fn temperature_threshold_above_40_rejected() {
        let mut cfg = valid_config();
        cfg.thresholds.temperature = 41;
        assert_validation_err(&cfg, "thresholds.temperature: 41 out of range (0, 40]");
    }

    #[test]
    fn threshold_boundaries_accepted() {
        let mut cfg = valid_config();
        cfg.thresholds.temperature = 40;
        cfg.thresholds.moisture = 100;
        cfg.thresholds.light = 1;
        cfg.validate().unwrap();
    }

    // -- Sensors ----------------------------------------------------------

    #[test]
    fn adc_channel_out_of_range_rejected() {
        let mut cfg = valid_config();
        cfg.sensors.light_channel = 4;
        assert_validation_err(&cfg, "sensors.light_channel: 4 exceeds ADS1115 maximum");
    }

    #[test]
    fn shared_adc_channel_rejected() {
        let mut cfg = valid_config();
        cfg.sensors.light_channel = 0;
        assert_validation_err(&cfg, "share ADC channel 0");
    }

    #[test]
    fn inverted_temperature_range_rejected() {
        let mut cfg = valid_config();
        cfg.sensors.temperature_min = 50.0;
        cfg.sensors.temperature_max = 10.0;
        assert_validation_err(&cfg, "must be below temperature_max");
    }

    // -- GPIO -------------------------------------------------------------

    #[test]
    fn relay_pin_0_rejected() {
        let mut cfg = valid_config();
        cfg.relays.fan = 0;
        assert_validation_err(&cfg, "relays.fan: 0 is not a valid BCM GPIO pin");
    }

    #[test]
    fn relay_pin_28_rejected() {
        let mut cfg = valid_config();
        cfg.relays.pump = 28;
        assert_validation_err(&cfg, "relays.pump: 28 is not a valid BCM GPIO pin");
    }

    #[test]
    fn i2c_pin_rejected() {
        let mut cfg = valid_config();
        cfg.relays.status_led = 3;
        assert_validation_err(&cfg, "reserved for I2C");
    }

    #[test]
    fn duplicate_pin_across_sections_rejected() {
        let mut cfg = valid_config();
        cfg.sensors.soil_power_pin = 17; // same as relays.fan
        assert_validation_err(&cfg, "sensors.soil_power_pin: gpio 17 is already used");
    }

    // -- Schema -----------------------------------------------------------

    #[test]
    fn empty_candidate_list_rejected() {
        let mut cfg = valid_config();
        cfg.schema.pump_override.clear();
        assert_validation_err(&cfg, "schema.pump_override: needs at least one path");
    }

    #[test]
    fn blank_candidate_path_rejected() {
        let mut cfg = valid_config();
        cfg.schema.light_threshold.push("/".into());
        assert_validation_err(&cfg, "schema.light_threshold: contains an empty path");
    }

    #[test]
    fn read_paths_cover_every_candidate() {
        let mut schema = SchemaSettings::default();
        schema.fan_override.push("/settings/automation/".into());
        let paths = schema.read_paths();

        assert!(paths.contains(&"settings/automation".to_string()));
        assert!(paths.contains(&"system/reboot_request".to_string()));
        assert!(paths.contains(&"system_thresholds/lum_thresh".to_string()));
        assert!(paths.contains(&"manual_control/pump".to_string()));
        assert_eq!(
            paths.iter().filter(|p| *p == "settings/automation").count(),
            1
        );
        assert!(!paths.iter().any(|p| p.starts_with("sensor_data/")));
    }

    #[test]
    fn empty_reboot_command_rejected() {
        let mut cfg = valid_config();
        cfg.reboot.command = Some(vec![]);
        assert_validation_err(&cfg, "reboot.command");
    }

    // -- Multiple errors reported at once ---------------------------------

    #[test]
    fn multiple_errors_collected() {
        let mut cfg = Config::default();
        cfg.timing.settle_ms = 0;
        cfg.thresholds.light = 500;
        cfg.relays.fan = 1;
        let msg = format!("{:#}", cfg.validate().unwrap_err());
        assert!(msg.contains("remote.url"), "missing url error in: {msg}");
        assert!(msg.contains("settle_ms"), "missing settle error in: {msg}");
        assert!(msg.contains("thresholds.light"), "missing threshold error in: {msg}");
        assert!(msg.contains("relays.fan"), "missing gpio error in: {msg}");
    }
}
