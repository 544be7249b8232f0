// tests/watchdog_reconnect.rs
//! Bounded-reconnect behavior of the connectivity watchdog, on virtual
//! time with a scripted link.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use transit_board::net::ConnectivityLink;
use transit_board::watchdog::{reconnect_until_up, run_watchdog, WatchdogPolicy};

/// Link whose probe only reports up once `succeed_on_attempt` reconnects
/// have been attempted. `None` never recovers.
struct StubLink {
    reconnects: AtomicU32,
    succeed_on_attempt: Option<u32>,
}

impl StubLink {
    fn new(succeed_on_attempt: Option<u32>) -> Self {
        Self {
            reconnects: AtomicU32::new(0),
            succeed_on_attempt,
        }
    }

    fn attempts(&self) -> u32 {
        self.reconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectivityLink for StubLink {
    async fn probe(&self) -> bool {
        match self.succeed_on_attempt {
            Some(n) => self.attempts() >= n,
            None => false,
        }
    }

    async fn reconnect(&self) -> anyhow::Result<()> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn exhausting_all_attempts_is_fatal() {
    let link = StubLink::new(None);
    let err = reconnect_until_up(&link, &WatchdogPolicy::default())
        .await
        .unwrap_err();
    assert_eq!(err.attempts, 20);
    assert_eq!(link.attempts(), 20, "no attempts beyond the maximum");
}

#[tokio::test(start_paused = true)]
async fn success_on_the_final_attempt_recovers() {
    // 19 consecutive failures, then the twentieth attempt brings it back
    let link = StubLink::new(Some(20));
    reconnect_until_up(&link, &WatchdogPolicy::default())
        .await
        .expect("recovery must not raise");
    assert_eq!(link.attempts(), 20);
}

#[tokio::test(start_paused = true)]
async fn watchdog_surfaces_exhaustion_as_its_return_value() {
    let link = StubLink::new(None);
    let exhausted = run_watchdog(&link, WatchdogPolicy::default()).await;
    assert_eq!(exhausted.attempts, 20);
}

#[tokio::test(start_paused = true)]
async fn watchdog_resumes_probing_after_recovery() {
    let link = StubLink::new(Some(3));
    let res = tokio::time::timeout(
        Duration::from_secs(600),
        run_watchdog(&link, WatchdogPolicy::default()),
    )
    .await;
    assert!(res.is_err(), "watchdog must keep probing, not return");
    assert_eq!(link.attempts(), 3, "no reconnects after recovery");
}
