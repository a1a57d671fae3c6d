use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let _ = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::new("swarm=debug,user_load=trace,mock_service=info"))
            .with_test_writer()
            .try_init();
    });
}
