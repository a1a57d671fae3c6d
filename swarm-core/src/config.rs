use crate::{
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_SPAWN_RATE, DEFAULT_STATS_INTERVAL, DEFAULT_USERS,
    MAX_SPAWN_INTERVAL,
};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use std::num::NonZeroU32;
use std::time::Duration;

/// Run-time parameters of a load test.
///
/// None of these belong to the tasks themselves; they are supplied when the load test is
/// launched (usually through the command line, see `Swarm::with_args`).
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Base URL every request path is appended to, e.g. `http://localhost:3000`.
    pub host: Option<String>,
    pub users: usize,
    /// Users started per second until `users` are running.
    pub spawn_rate: f64,
    /// Stop after this long. `None` runs until interrupted.
    #[serde_as(as = "Option<DurationSeconds<f64>>")]
    pub run_time: Option<Duration>,
    /// Upper bound on requests per second across all users.
    pub max_tps: Option<NonZeroU32>,
    pub wait_time: WaitTime,
    #[serde_as(as = "DurationSeconds<f64>")]
    pub stats_interval: Duration,
    #[serde_as(as = "DurationSeconds<f64>")]
    pub request_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            host: None,
            users: DEFAULT_USERS,
            spawn_rate: DEFAULT_SPAWN_RATE,
            run_time: None,
            max_tps: None,
            wait_time: WaitTime::None,
            stats_interval: DEFAULT_STATS_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl RunConfig {
    /// Delay between two user spawns.
    ///
    /// `None` when the spawn rate is not positive, or so slow that the delay exceeds
    /// [`MAX_SPAWN_INTERVAL`].
    pub fn spawn_interval(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(1. / self.spawn_rate)
            .ok()
            .filter(|interval| *interval <= MAX_SPAWN_INTERVAL)
            .map(|interval| interval.max(Duration::from_nanos(1)))
    }
}

/// Pause a simulated user takes after each task.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum WaitTime {
    /// Run the next task straight away.
    #[default]
    None,
    Constant(#[serde_as(as = "DurationSeconds<f64>")] Duration),
    /// Uniformly distributed in `[min, max]`.
    Between(
        #[serde_as(as = "DurationSeconds<f64>")] Duration,
        #[serde_as(as = "DurationSeconds<f64>")] Duration,
    ),
}

impl WaitTime {
    pub fn between(a: Duration, b: Duration) -> Self {
        if a <= b {
            WaitTime::Between(a, b)
        } else {
            WaitTime::Between(b, a)
        }
    }
}

impl std::fmt::Display for WaitTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WaitTime::None => write!(f, "none"),
            WaitTime::Constant(d) => write!(f, "{}", humantime::format_duration(*d)),
            WaitTime::Between(a, b) => write!(
                f,
                "{}..{}",
                humantime::format_duration(*a),
                humantime::format_duration(*b)
            ),
        }
    }
}
