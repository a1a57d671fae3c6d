use std::time::Duration;

/// Result of a single request issued through the managed client.
///
/// Failures are plain data here: the engine classifies them and records them in the statistics,
/// the task that issued the request never has to look at them.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    /// Grouping name the request was recorded under.
    pub name: String,
    pub path: String,
    /// `None` when no response was received at all.
    pub status: Option<u16>,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl RequestOutcome {
    /// Classify a received response. Any status of 400 or above counts as a failure.
    pub fn from_status(name: &str, path: &str, status: u16, elapsed: Duration) -> Self {
        let error = if status >= 400 {
            Some(format!("HTTP {status}"))
        } else {
            None
        };

        Self {
            name: name.to_string(),
            path: path.to_string(),
            status: Some(status),
            elapsed,
            error,
        }
    }

    /// A request which never produced a response (connect failure, DNS, timeout, ...).
    pub fn transport_failure(name: &str, path: &str, error: String, elapsed: Duration) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            status: None,
            elapsed,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
