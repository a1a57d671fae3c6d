use crate::{RunConfig, AGGREGATED_NAME};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Statistics for every request recorded under one grouping name.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestStats {
    pub method: String,
    pub name: String,
    pub num_requests: u64,
    pub num_failures: u64,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub avg_response_time: Duration,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub min_response_time: Duration,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub max_response_time: Duration,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub latency_p50: Duration,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub latency_p90: Duration,
    #[serde_as(as = "DurationMilliSeconds<f64>")]
    pub latency_p99: Duration,
    pub requests_per_sec: f64,
    pub status_codes: BTreeMap<u16, u64>,
    pub errors: BTreeMap<String, u64>,
}

impl RequestStats {
    pub fn failure_rate(&self) -> f64 {
        if self.num_requests == 0 {
            0.
        } else {
            self.num_failures as f64 / self.num_requests as f64
        }
    }
}

/// Summary of a finished load test.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunStatistics {
    pub config: RunConfig,
    /// Peak number of simulated users.
    pub users: usize,
    #[serde_as(as = "DurationSeconds<f64>")]
    pub elapsed: Duration,
    /// One row per grouping name, sorted by name.
    pub requests: Vec<RequestStats>,
    pub total: RequestStats,
}

impl RunStatistics {
    pub fn get(&self, name: &str) -> Option<&RequestStats> {
        self.requests.iter().find(|r| r.name == name)
    }

    pub fn error_rate(&self) -> f64 {
        self.total.failure_rate()
    }

    pub fn has_failures(&self) -> bool {
        self.total.num_failures > 0
    }
}

fn ms(dur: Duration) -> f64 {
    dur.as_secs_f64() * 1e3
}

fn write_row(f: &mut fmt::Formatter<'_>, row: &RequestStats) -> fmt::Result {
    writeln!(
        f,
        "{:<6} {:<30} {:>9} {:>9} | {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8.1} {:>8.1} | {:>8.2}",
        row.method,
        row.name,
        row.num_requests,
        row.num_failures,
        ms(row.avg_response_time),
        ms(row.min_response_time),
        ms(row.max_response_time),
        ms(row.latency_p50),
        ms(row.latency_p90),
        ms(row.latency_p99),
        row.requests_per_sec,
    )
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<6} {:<30} {:>9} {:>9} | {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} | {:>8}",
            "Type", "Name", "# reqs", "# fails", "Avg", "Min", "Max", "p50", "p90", "p99", "req/s",
        )?;
        writeln!(f, "{}", "-".repeat(129))?;
        for row in &self.requests {
            write_row(f, row)?;
        }
        writeln!(f, "{}", "-".repeat(129))?;
        write_row(f, &self.total)?;

        if self.has_failures() {
            writeln!(f)?;
            writeln!(f, "Errors:")?;
            for row in &self.requests {
                for (error, count) in &row.errors {
                    writeln!(f, "{count:>9} {} {}: {error}", row.method, row.name)?;
                }
            }
        }

        write!(
            f,
            "\n{} users ran for {} (response times in ms)",
            self.users,
            humantime::format_duration(Duration::from_secs(self.elapsed.as_secs())),
        )
    }
}

impl RequestStats {
    /// An empty row, used before any request has been recorded.
    pub fn empty(method: &str, name: &str) -> Self {
        Self {
            method: method.to_string(),
            name: name.to_string(),
            num_requests: 0,
            num_failures: 0,
            avg_response_time: Duration::ZERO,
            min_response_time: Duration::ZERO,
            max_response_time: Duration::ZERO,
            latency_p50: Duration::ZERO,
            latency_p90: Duration::ZERO,
            latency_p99: Duration::ZERO,
            requests_per_sec: 0.,
            status_codes: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        self.name == AGGREGATED_NAME
    }
}
