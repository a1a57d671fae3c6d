use mock_service::Recorder;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_ADDR: &str = "0.0.0.0:3002";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mock_service=info")),
        )
        .init();

    let addr: SocketAddr = std::env::args()
        .nth(1)
        .as_deref()
        .unwrap_or(DEFAULT_ADDR)
        .parse()?;

    let recorder = Arc::new(Recorder::default());
    tokio::spawn(mock_service::tps_measure_task(recorder.clone()));
    mock_service::run(addr, recorder).await
}
