//! Remote-triggered restart.
//!
//! ```text
//! Idle ──[reboot_request == true]──▶ Rebooting ──▶ restart
//! ```
//!
//! The request flag is cleared before anything else so that the restarted
//! device does not see it again.  If that write fails the restart still
//! goes ahead and the request may be picked up a second time once the store
//! is reachable.

use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::clock::now_unix;
use crate::remote::{note_skipped, RemoteStore};

/// Where the restart timestamp is written.
const LAST_REBOOT_PATH: &str = "system/last_reboot";

pub trait Restarter {
    fn restart(&mut self);
}

/// Exits the process so the service manager starts it again, optionally
/// running a reboot command first.
pub struct ProcessRestart {
    command: Option<Vec<String>>,
}

impl ProcessRestart {
    pub fn new(command: Option<Vec<String>>) -> Self {
        Self { command }
    }
}

impl Restarter for ProcessRestart {
    fn restart(&mut self) {
        if let Some((program, args)) = self.command.as_ref().and_then(|c| c.split_first()) {
            info!(%program, ?args, "running reboot command");
            match std::process::Command::new(program).args(args).status() {
                Ok(status) if status.success() => {}
                Ok(status) => warn!(%program, %status, "reboot command failed"),
                Err(e) => error!(%program, "reboot command could not start: {e}"),
            }
        }
        info!("exiting for restart");
        std::process::exit(0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootPhase {
    Idle,
    Rebooting,
}

pub struct RebootCoordinator<R> {
    request_path: String,
    flush: Duration,
    phase: RebootPhase,
    restarter: R,
}

impl<R: Restarter> RebootCoordinator<R> {
    pub fn new(request_path: &str, flush: Duration, restarter: R) -> Self {
        Self {
            request_path: request_path.to_string(),
            flush,
            phase: RebootPhase::Idle,
            restarter,
        }
    }

    pub fn phase(&self) -> RebootPhase {
        self.phase
    }

    #[cfg(test)]
    pub(crate) fn restarter(&self) -> &R {
        &self.restarter
    }

    /// Poll the request flag.  Returns true once a restart has been issued;
    /// after that the coordinator never acts again.
    pub async fn check<S: RemoteStore>(&mut self, store: &mut S) -> bool {
        if self.phase == RebootPhase::Rebooting {
            return true;
        }

        match store.get_bool(&self.request_path).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                note_skipped(&self.request_path, &e);
                return false;
            }
        }

        self.phase = RebootPhase::Rebooting;
        info!(path = %self.request_path, "reboot requested");

        if let Err(e) = store.set(&self.request_path, json!(false)).await {
            warn!(
                path = %self.request_path,
                "could not clear reboot request, it may be processed again: {e}"
            );
        }
        if let Err(e) = store.set(LAST_REBOOT_PATH, json!(now_unix())).await {
            warn!("could not record reboot time: {e}");
        }

        sleep(self.flush).await;
        info!("restarting");
        self.restarter.restart();
        true
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::testing::{MockStore, RecordingRestarter};

    const REQUEST: &str = "system/reboot_request";

    fn coordinator() -> RebootCoordinator<RecordingRestarter> {
        RebootCoordinator::new(
            REQUEST,
            Duration::from_millis(1000),
            RecordingRestarter::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn request_clears_stamps_and_restarts_once() {
        let mut store = MockStore::new();
        store.put(REQUEST, json!(true));
        let mut rc = coordinator();

        let started = tokio::time::Instant::now();
        assert!(rc.check(&mut store).await);

        assert_eq!(store.writes_to(REQUEST), vec![&json!(false)]);
        assert_eq!(store.writes_to(LAST_REBOOT_PATH).len(), 1);
        assert_eq!(rc.restarter.restarts, 1);
        assert_eq!(rc.phase(), RebootPhase::Rebooting);
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_is_written_before_timestamp() {
        let mut store = MockStore::new();
        store.put(REQUEST, json!(true));
        let mut rc = coordinator();

        rc.check(&mut store).await;

        let paths: Vec<&str> = store.writes.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(paths, vec![REQUEST, LAST_REBOOT_PATH]);
    }

    #[tokio::test(start_paused = true)]
    async fn rebooting_never_restarts_again() {
        let mut store = MockStore::new();
        store.put(REQUEST, json!(true));
        store.failing_writes.insert(REQUEST.to_string());
        let mut rc = coordinator();

        rc.check(&mut store).await;
        // Flag could not be cleared and still reads true.
        assert!(rc.check(&mut store).await);
        assert!(rc.check(&mut store).await);

        assert_eq!(rc.restarter.restarts, 1);
        assert_eq!(
            store.reads.iter().filter(|p| *p == REQUEST).count(),
            1,
            "no polling once rebooting"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_clear_still_restarts() {
        let mut store = MockStore::new();
        store.put(REQUEST, json!(true));
        store.failing_writes.insert(REQUEST.to_string());
        let mut rc = coordinator();

        assert!(rc.check(&mut store).await);
        assert_eq!(rc.restarter.restarts, 1);
        assert!(store.writes_to(REQUEST).is_empty());
    }

    #[tokio::test]
    async fn false_or_missing_request_is_idle() {
        let mut store = MockStore::new();
        let mut rc = coordinator();
        assert!(!rc.check(&mut store).await);

        store.put(REQUEST, json!(false));
        assert!(!rc.check(&mut store).await);

        assert_eq!(rc.phase(), RebootPhase::Idle);
        assert_eq!(rc.restarter.restarts, 0);
        assert!(store.writes.is_empty());
    }

    #[tokio::test]
    async fn non_bool_request_ignored() {
        let mut store = MockStore::new();
        store.put(REQUEST, json!("true"));
        let mut rc = coordinator();

        assert!(!rc.check(&mut store).await);
        assert_eq!(rc.restarter.restarts, 0);
    }

    #[tokio::test]
    async fn offline_store_is_idle() {
        let mut store = MockStore::new();
        store.put(REQUEST, json!(true));
        store.offline = true;
        let mut rc = coordinator();

        assert!(!rc.check(&mut store).await);
        assert_eq!(rc.restarter.restarts, 0);
        assert!(matches!(
            store.get_bool(REQUEST).await,
            Err(RemoteError::Unavailable(_))
        ));
    }
}
