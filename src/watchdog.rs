//! # Connectivity Watchdog
//! Two-state machine (connected / disconnected) with a bounded
//! reconnection procedure.
//!
//! Losing wifi silently would leave the board showing stale data with no
//! operator visibility, so running out of reconnect attempts is fatal
//! rather than an endless quiet loop.

use std::time::Duration;

use metrics::counter;
use tracing::{error, info};

use crate::error::ReconnectExhausted;
use crate::net::ConnectivityLink;

#[derive(Debug, Clone, Copy)]
pub struct WatchdogPolicy {
    /// Probe interval while connected.
    pub probe_interval: Duration,
    pub retry_delay: Duration,
    pub escalated_delay: Duration,
    /// Failed attempts after which the retry delay escalates.
    pub escalate_after: u32,
    /// Failed attempts after which reconnecting gives up.
    pub max_attempts: u32,
}

impl Default for WatchdogPolicy {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(30),
            retry_delay: Duration::from_secs(10),
            escalated_delay: Duration::from_secs(60),
            escalate_after: 10,
            max_attempts: 20,
        }
    }
}

impl WatchdogPolicy {
    /// Delay before the next attempt, given how many have failed so far.
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        if failed_attempts > self.escalate_after {
            self.escalated_delay
        } else {
            self.retry_delay
        }
    }
}

/// Bounded reconnection: attempt, re-probe, sleep, escalate. More than
/// `max_attempts` failed attempts gives up with [`ReconnectExhausted`].
pub async fn reconnect_until_up<L: ConnectivityLink + ?Sized>(
    link: &L,
    policy: &WatchdogPolicy,
) -> Result<(), ReconnectExhausted> {
    let mut attempts: u32 = 0;
    loop {
        if attempts >= policy.max_attempts {
            return Err(ReconnectExhausted { attempts });
        }
        attempts += 1;
        counter!("watchdog_reconnect_attempts_total").increment(1);
        error!(attempts, "wifi is down, attempting reconnect");

        if let Err(e) = link.reconnect().await {
            error!(error = %e, "reconnect attempt failed");
        }
        if link.probe().await {
            info!(attempts, "wifi connection reestablished");
            return Ok(());
        }
        tokio::time::sleep(policy.delay_for(attempts)).await;
    }
}

/// Watchdog loop. Returns only on the fatal condition.
pub async fn run_watchdog<L: ConnectivityLink + ?Sized>(
    link: &L,
    policy: WatchdogPolicy,
) -> ReconnectExhausted {
    loop {
        if !link.probe().await {
            error!("connectivity probe indicates lost connection");
            if let Err(exhausted) = reconnect_until_up(link, &policy).await {
                return exhausted;
            }
        }
        tokio::time::sleep(policy.probe_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_escalates_after_threshold() {
        let policy = WatchdogPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(10), Duration::from_secs(10));
        assert_eq!(policy.delay_for(11), Duration::from_secs(60));
    }
}
