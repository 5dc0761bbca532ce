use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::Instant;

/// Wall-clock seconds since the Unix epoch.
pub fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_unix_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Monotonic device clock, zero at process start, anchored to the wall
/// clock reading taken at that moment.
#[derive(Debug, Clone, Copy)]
pub struct DeviceClock {
    started: Instant,
    boot_unix_ms: u64,
}

impl DeviceClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            boot_unix_ms: now_unix_ms().max(0) as u64,
        }
    }

    /// Boot time plus monotonic uptime.  Never goes backwards within one
    /// process, even if the wall clock is stepped.
    pub fn unix_ms(&self) -> u64 {
        self.boot_unix_ms + self.uptime_ms()
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn uptime_ms(&self) -> u64 {
        self.uptime().as_millis() as u64
    }
}

/// Fixed-period gate on top of the loop tick: due on the first check, then
/// once every `period`.
#[derive(Debug)]
pub struct Cadence {
    period: Duration,
    last: Option<Instant>,
}

impl Cadence {
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    pub fn due(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.period => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_unix_is_recent() {
        let ts = now_unix();
        // After 2024-01-01 and before 2040-01-01.
        assert!(ts > 1_704_067_200, "timestamp too old: {ts}");
        assert!(ts < 2_208_988_800, "timestamp too far in future: {ts}");
    }

    #[test]
    fn cadence_first_check_is_due() {
        let mut c = Cadence::new(Duration::from_secs(10));
        assert!(c.due(Instant::now()));
    }

    #[test]
    fn cadence_waits_full_period() {
        let mut c = Cadence::new(Duration::from_secs(10));
        let t0 = Instant::now();
        assert!(c.due(t0));
        assert!(!c.due(t0 + Duration::from_secs(3)));
        assert!(!c.due(t0 + Duration::from_millis(9_999)));
        assert!(c.due(t0 + Duration::from_secs(10)));
        assert!(!c.due(t0 + Duration::from_secs(15)));
        assert!(c.due(t0 + Duration::from_secs(21)));
    }

    #[test]
    fn now_unix_ms_matches_seconds() {
        let ms = now_unix_ms();
        let s = now_unix();
        assert!((ms / 1000 - s).abs() <= 1, "ms={ms} s={s}");
    }

    #[tokio::test(start_paused = true)]
    async fn device_clock_unix_ms_is_boot_plus_uptime() {
        let clock = DeviceClock::start();
        let boot = clock.unix_ms();
        assert!(boot > 1_704_067_200_000, "boot time too old: {boot}");
        tokio::time::advance(Duration::from_millis(2_500)).await;
        assert_eq!(clock.unix_ms(), boot + 2_500);
    }

    #[tokio::test(start_paused = true)]
    async fn device_clock_tracks_elapsed() {
        let clock = DeviceClock::start();
        tokio::time::advance(Duration::from_millis(1_250)).await;
        assert_eq!(clock.uptime_ms(), 1_250);
    }
}
