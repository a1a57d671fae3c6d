/// Counter incremented once per request, labelled by grouping name.
pub const REQUESTS_METRIC: &str = "swarm_requests_total";

/// Counter incremented once per failed request, labelled by grouping name.
pub const FAILURES_METRIC: &str = "swarm_failures_total";

/// Histogram of request latency in seconds, labelled by grouping name.
pub const LATENCY_METRIC: &str = "swarm_request_latency_seconds";

/// Gauge of currently running simulated users.
pub const USERS_METRIC: &str = "swarm_users";

/// Label key carrying the grouping name on every request metric.
pub const NAME_LABEL: &str = "name";
