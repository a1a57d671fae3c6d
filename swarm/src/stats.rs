use crate::error::SwarmError;
use pdatastructs::tdigest::{TDigest, K1};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use swarm_core::{RequestOutcome, RequestStats, AGGREGATED_NAME};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

const TDIGEST_BACKLOG_SIZE: usize = 100;
const METHOD: &str = "GET";

/// Collects every request outcome of a run, grouped by request name.
pub(crate) struct StatsCollector {
    start: Instant,
    inner: Mutex<Inner>,
}

struct Inner {
    entries: BTreeMap<String, StatsEntry>,
    // NOTE: The TDigest can not be merged, so the aggregate keeps its own.
    total: StatsEntry,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            inner: Mutex::new(Inner {
                entries: BTreeMap::new(),
                total: StatsEntry::new(),
            }),
        }
    }

    pub fn record(&self, outcome: &RequestOutcome) {
        match self.inner.lock() {
            Ok(mut inner) => {
                inner
                    .entries
                    .entry(outcome.name.clone())
                    .or_insert_with(StatsEntry::new)
                    .record(outcome);
                inner.total.record(outcome);
            }
            Err(_) => error!("Statistics are poisoned, dropping request data."),
        }
    }

    /// Running totals of (requests, failures).
    pub fn counts(&self) -> Result<(u64, u64), SwarmError> {
        let inner = self.inner.lock()?;
        Ok((inner.total.num_requests, inner.total.num_failures))
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Per-name rows sorted by name, plus the aggregated row.
    pub fn snapshot(&self) -> Result<(Vec<RequestStats>, RequestStats), SwarmError> {
        let elapsed = self.elapsed();
        let inner = self.inner.lock()?;

        let rows = inner
            .entries
            .iter()
            .map(|(name, entry)| entry.to_stats(METHOD, name, elapsed))
            .collect();
        let total = inner.total.to_stats("", AGGREGATED_NAME, elapsed);

        Ok((rows, total))
    }
}

struct StatsEntry {
    num_requests: u64,
    num_failures: u64,
    total_response_time: Duration,
    min_response_time: Option<Duration>,
    max_response_time: Duration,
    latency: TDigest<K1>,
    status_codes: BTreeMap<u16, u64>,
    errors: BTreeMap<String, u64>,
}

impl StatsEntry {
    fn new() -> Self {
        Self {
            num_requests: 0,
            num_failures: 0,
            total_response_time: Duration::ZERO,
            min_response_time: None,
            max_response_time: Duration::ZERO,
            latency: default_tdigest(),
            status_codes: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    fn record(&mut self, outcome: &RequestOutcome) {
        self.num_requests += 1;
        self.total_response_time += outcome.elapsed;
        self.max_response_time = self.max_response_time.max(outcome.elapsed);
        self.min_response_time = Some(match self.min_response_time {
            Some(min) => min.min(outcome.elapsed),
            None => outcome.elapsed,
        });
        self.latency.insert(outcome.elapsed.as_secs_f64());

        if let Some(status) = outcome.status {
            *self.status_codes.entry(status).or_default() += 1;
        }

        if let Some(error) = &outcome.error {
            self.num_failures += 1;
            *self.errors.entry(error.clone()).or_default() += 1;
        }
    }

    fn latency(&self, quantile: f64) -> Duration {
        if self.num_requests == 0 {
            return Duration::ZERO;
        }

        let secs = self.latency.quantile(quantile);
        if secs.is_finite() && secs >= 0. {
            Duration::from_secs_f64(secs)
        } else {
            warn!("Non-finite latency quantile; reporting zero.");
            Duration::ZERO
        }
    }

    fn to_stats(&self, method: &str, name: &str, elapsed: Duration) -> RequestStats {
        let avg_response_time = if self.num_requests == 0 {
            Duration::ZERO
        } else {
            let nanos = self.total_response_time.as_nanos() / u128::from(self.num_requests);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        };

        let secs = elapsed.as_secs_f64();
        let requests_per_sec = if secs > 0. {
            self.num_requests as f64 / secs
        } else {
            0.
        };

        RequestStats {
            method: method.to_string(),
            name: name.to_string(),
            num_requests: self.num_requests,
            num_failures: self.num_failures,
            avg_response_time,
            min_response_time: self.min_response_time.unwrap_or_default(),
            max_response_time: self.max_response_time,
            latency_p50: self.latency(0.5),
            latency_p90: self.latency(0.9),
            latency_p99: self.latency(0.99),
            requests_per_sec,
            status_codes: self.status_codes.clone(),
            errors: self.errors.clone(),
        }
    }
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(name: &str, ms: u64) -> RequestOutcome {
        RequestOutcome::from_status(name, "/users/1", 200, Duration::from_millis(ms))
    }

    #[test]
    fn empty_snapshot() {
        let stats = StatsCollector::new();
        let (rows, total) = stats.snapshot().unwrap();
        assert!(rows.is_empty());
        assert_eq!(total.name, AGGREGATED_NAME);
        assert_eq!(total.num_requests, 0);
        assert_eq!(total.latency_p50, Duration::ZERO);
    }

    #[test]
    fn groups_by_name() {
        let stats = StatsCollector::new();
        stats.record(&ok("/item", 10));
        stats.record(&ok("/item", 30));
        stats.record(&RequestOutcome::from_status(
            "/other",
            "/other",
            500,
            Duration::from_millis(20),
        ));

        let (rows, total) = stats.snapshot().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "/item");
        assert_eq!(rows[1].name, "/other");

        let item = &rows[0];
        assert_eq!(item.method, "GET");
        assert_eq!(item.num_requests, 2);
        assert_eq!(item.num_failures, 0);
        assert_eq!(item.min_response_time, Duration::from_millis(10));
        assert_eq!(item.max_response_time, Duration::from_millis(30));
        assert_eq!(item.avg_response_time, Duration::from_millis(20));
        assert_eq!(item.status_codes.get(&200), Some(&2));

        let other = &rows[1];
        assert_eq!(other.num_failures, 1);
        assert_eq!(other.errors.get("HTTP 500"), Some(&1));

        assert_eq!(total.num_requests, 3);
        assert_eq!(total.num_failures, 1);
        assert_eq!(stats.counts().unwrap(), (3, 1));
    }

    #[test]
    fn transport_failures_have_no_status_code() {
        let stats = StatsCollector::new();
        stats.record(&RequestOutcome::transport_failure(
            "/item",
            "/users/5",
            "connection refused".to_string(),
            Duration::from_millis(1),
        ));

        let (rows, _) = stats.snapshot().unwrap();
        assert!(rows[0].status_codes.is_empty());
        assert_eq!(rows[0].errors.get("connection refused"), Some(&1));
    }

    #[test]
    fn average_survives_huge_request_counts() {
        let mut entry = StatsEntry::new();
        entry.num_requests = 1 << 32;
        entry.total_response_time = Duration::from_millis(3) * (1 << 31);
        entry.latency.insert(0.0015);

        let row = entry.to_stats(METHOD, "/item", Duration::from_secs(1));
        assert_eq!(row.avg_response_time, Duration::from_micros(1_500));
    }

    #[test]
    fn latency_quantiles_are_ordered() {
        let stats = StatsCollector::new();
        for ms in 1..=200 {
            stats.record(&ok("/item", ms));
        }

        let (rows, _) = stats.snapshot().unwrap();
        let item = &rows[0];
        assert!(item.latency_p50 <= item.latency_p90);
        assert!(item.latency_p90 <= item.latency_p99);
        assert!(item.latency_p99 <= Duration::from_millis(201));
        assert!(item.latency_p50 >= Duration::from_millis(80));
        assert!(item.latency_p50 <= Duration::from_millis(120));
    }
}
