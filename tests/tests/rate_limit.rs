mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;
    use anyhow::Context;
    use std::num::NonZeroU32;
    use std::time::Duration;
    use swarm::prelude::*;
    use user_load::REQUEST_NAME;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn max_tps_caps_request_rate() -> anyhow::Result<()> {
        init();
        let (addr, _recorder) = mock_service::spawn().await?;

        let mut swarm = Swarm::new()
            .host(&format!("http://{addr}"))
            .users(50)
            .spawn_rate(50.)
            .max_tps(NonZeroU32::new(200).context("zero tps")?)
            .run_time(Duration::from_secs(15));
        user_load::register::<_, Session>(&mut swarm)?;

        let stats = swarm.run().await?;
        let item = stats.get(REQUEST_NAME).context("no statistics for /item")?;

        assert!(dbg!(item.requests_per_sec) <= 210.);
        assert!(item.requests_per_sec >= 150.);
        Ok(())
    }
}
