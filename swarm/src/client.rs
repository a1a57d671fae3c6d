//! The HTTP client handed to tasks.
use crate::transaction::{transaction_hook, TransactionData};
use std::sync::Arc;
use swarm_core::RequestOutcome;

/// Issue requests and have their outcome recorded.
///
/// `name` groups statistics for requests whose paths differ only by a variable part (an id in the
/// path, say). Without one, the literal path is used.
///
/// Implement [`HttpClient`] to substitute the client, e.g. with a fake that records calls.
#[trait_variant::make(HttpClient: Send)]
pub trait LocalHttpClient {
    async fn get(&self, path: &str, name: Option<&str>) -> RequestOutcome;
}

/// Client used by every simulated user of a run.
///
/// Cheap to clone: all clones share one connection pool, rate limiter and statistics collector.
#[derive(Clone)]
pub struct Session {
    client: reqwest::Client,
    host: Arc<str>,
    transaction: TransactionData,
}

impl Session {
    pub(crate) fn new(client: reqwest::Client, host: &str, transaction: TransactionData) -> Self {
        Self {
            client,
            host: Arc::from(host.trim_end_matches('/')),
            transaction,
        }
    }

    /// Base URL paths are appended to.
    pub fn host(&self) -> &str {
        &self.host
    }
}

impl HttpClient for Session {
    async fn get(&self, path: &str, name: Option<&str>) -> RequestOutcome {
        let url = format!("{}{path}", self.host);
        let name = name.unwrap_or(path);

        transaction_hook(&self.transaction, name, path, async {
            let res = self.client.get(&url).send().await?;
            let status = res.status().as_u16();
            // Drain the body so the timing covers the whole response.
            res.bytes().await?;
            Ok::<_, reqwest::Error>(status)
        })
        .await
    }
}
