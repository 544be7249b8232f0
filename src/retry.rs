//! # Retry Driver
//! Until-success retry around a fallible fetch.
//!
//! Upstream outages are expected to be transient and the daemon has no
//! better option than to keep trying, so this never gives up. It blocks
//! the calling task for its whole duration and must only run on the
//! producer task that owns the feed, never on the render loop.

use std::future::Future;
use std::time::Duration;

use metrics::counter;
use tracing::warn;

use crate::error::FetchError;

pub async fn fetch_until_success<T, F, Fut>(feed: &str, retry_delay: Duration, mut attempt: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    loop {
        match attempt().await {
            Ok(value) => return value,
            Err(e) => {
                counter!("feed_fetch_errors_total", "feed" => feed.to_string()).increment(1);
                warn!(
                    feed,
                    error = %e,
                    retry_in_secs = retry_delay.as_secs(),
                    "fetch failed, retrying"
                );
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn retries_until_the_fetch_succeeds() {
        let attempts = AtomicU32::new(0);
        let value = fetch_until_success("trips", Duration::from_secs(5), || async {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            if n < 3 {
                Err(FetchError::empty("stub"))
            } else {
                Ok(42u32)
            }
        })
        .await;
        assert_eq!(value, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_returns_without_sleeping() {
        let t0 = tokio::time::Instant::now();
        let value =
            fetch_until_success("weather", Duration::from_secs(15), || async { Ok(7u32) }).await;
        assert_eq!(value, 7);
        assert_eq!(t0.elapsed(), Duration::ZERO);
    }
}
