use crate::stats::StatsCollector;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::{fmt::Display, future::Future, num::NonZeroU32, sync::Arc, time::Instant};
use swarm_core::RequestOutcome;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Shared by every session of a run.
#[derive(Clone)]
pub(crate) struct TransactionData {
    pub limiter: Option<Arc<DefaultDirectRateLimiter>>,
    pub stats: Arc<StatsCollector>,
}

impl TransactionData {
    pub fn new(max_tps: Option<NonZeroU32>, stats: Arc<StatsCollector>) -> Self {
        Self {
            limiter: max_tps.map(|tps| Arc::new(rate_limiter(tps))),
            stats,
        }
    }
}

/// Wraps a single request: waits on the rate limiter, times the request, then classifies and
/// records the result. `func` resolves to the response status code.
pub(crate) async fn transaction_hook<T, E>(
    data: &TransactionData,
    name: &str,
    path: &str,
    func: T,
) -> RequestOutcome
where
    T: Future<Output = Result<u16, E>>,
    E: Display,
{
    if let Some(limiter) = &data.limiter {
        limiter.until_ready().await;
    }

    let start = Instant::now();
    let res = func.await;
    let elapsed = start.elapsed();

    let outcome = match res {
        Ok(status) => RequestOutcome::from_status(name, path, status, elapsed),
        Err(err) => RequestOutcome::transport_failure(name, path, err.to_string(), elapsed),
    };
    trace!(
        "GET {path} ({name}) -> {:?} in {elapsed:?}",
        outcome.status
    );

    #[cfg(feature = "metrics")]
    record_metrics(&outcome);

    data.stats.record(&outcome);
    outcome
}

#[cfg(feature = "metrics")]
fn record_metrics(outcome: &RequestOutcome) {
    use swarm_core::{FAILURES_METRIC, LATENCY_METRIC, NAME_LABEL, REQUESTS_METRIC};

    metrics::counter!(REQUESTS_METRIC, NAME_LABEL => outcome.name.clone()).increment(1);
    metrics::histogram!(LATENCY_METRIC, NAME_LABEL => outcome.name.clone())
        .record(outcome.elapsed.as_secs_f64());
    if !outcome.is_success() {
        metrics::counter!(FAILURES_METRIC, NAME_LABEL => outcome.name.clone()).increment(1);
    }
}

fn rate_limiter(tps_limit: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps_limit).allow_burst(NonZeroU32::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn data(max_tps: Option<NonZeroU32>) -> TransactionData {
        TransactionData::new(max_tps, Arc::new(StatsCollector::new()))
    }

    #[tokio::test]
    async fn records_success() {
        let data = data(None);
        let outcome =
            transaction_hook(&data, "/item", "/users/3", async { Ok::<_, String>(200) }).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.name, "/item");
        assert_eq!(outcome.path, "/users/3");
        assert_eq!(data.stats.counts().unwrap(), (1, 0));
    }

    #[tokio::test]
    async fn records_transport_failure() {
        let data = data(None);
        let outcome = transaction_hook(&data, "/item", "/users/3", async {
            Err::<u16, _>("connection refused")
        })
        .await;

        assert_eq!(outcome.error.as_deref(), Some("connection refused"));
        assert_eq!(data.stats.counts().unwrap(), (1, 1));
    }

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn limiter_spaces_requests() {
        let data = data(NonZeroU32::new(20));

        let start = Instant::now();
        for _ in 0..5 {
            transaction_hook(&data, "/item", "/users/1", async { Ok::<_, String>(200) }).await;
        }

        // First request passes immediately, the following four wait 50ms each.
        assert!(start.elapsed() >= Duration::from_millis(190));
        assert_eq!(data.stats.counts().unwrap(), (5, 0));
    }
}
