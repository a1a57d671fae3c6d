use std::time::Duration;

/// Number of simulated users when none is configured.
pub const DEFAULT_USERS: usize = 1;

/// Users spawned per second when no spawn rate is configured.
pub const DEFAULT_SPAWN_RATE: f64 = 1.0;

/// Slowest accepted spawn rate, expressed as the delay between two spawns.
pub const MAX_SPAWN_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// How often the runner logs a progress line.
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(2);

/// Per-request timeout handed to the HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Name of the statistics row summing every request group.
pub const AGGREGATED_NAME: &str = "Aggregated";
