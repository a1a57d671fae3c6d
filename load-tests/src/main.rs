use std::process::ExitCode;
use swarm::{Session, Swarm};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_LOG_FILTER: &str = "swarm=info,user_load=info";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let mut swarm = Swarm::new().with_args();
    user_load::register::<_, Session>(&mut swarm)?;

    let stats = swarm.run().await?;
    println!("{stats}");

    Ok(ExitCode::from(user_load::exit_code(&stats)))
}
