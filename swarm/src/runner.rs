use crate::{
    cli::SwarmCli,
    client::Session,
    error::SwarmError,
    stats::StatsCollector,
    task::{Task, TaskRegistry, TaskSet},
    timer::Timer,
    transaction::TransactionData,
    user::UserPool,
};
use clap::Parser;
use std::{
    ffi::OsString, net::SocketAddr, num::NonZeroU32, path::PathBuf, sync::Arc, time::Duration,
};
use swarm_core::{RunConfig, RunStatistics, WaitTime};
use tokio::time::{interval, MissedTickBehavior};
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

/// A load test: the registered tasks and the parameters to run them with.
///
/// # Example
///
/// ```ignore
/// use swarm::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut swarm = Swarm::new().with_args();
///     swarm.register_task(Task::new("index", 1, |session: Session| async move {
///         session.get("/", None).await;
///     })?);
///
///     let stats = swarm.run().await?;
///     println!("{stats}");
///     Ok(())
/// }
/// ```
pub struct Swarm {
    config: RunConfig,
    tasks: Vec<Task<Session>>,
    json_report: Option<PathBuf>,
    prometheus: Option<SocketAddr>,
}

impl Default for Swarm {
    fn default() -> Self {
        Self::new()
    }
}

impl Swarm {
    pub fn new() -> Self {
        Self {
            config: RunConfig::default(),
            tasks: vec![],
            json_report: None,
            prometheus: None,
        }
    }

    /// Take run parameters from the command line.
    ///
    /// `-H`, `--host` target host
    ///
    /// `-u`, `--users` peak number of users
    ///
    /// `-r`, `--spawn-rate` users started per second
    ///
    /// `-t`, `--run-time` how long to run for
    ///
    /// See `--help` for the remaining options.
    ///
    /// # Example
    /// ```ignore
    /// $ ./user-load -H http://localhost:3000 -u 100 -r 10 -t 5m
    /// ```
    pub fn with_args(self) -> Self {
        self.apply(SwarmCli::parse())
    }

    /// Like [`Swarm::with_args`] but parses the given arguments and returns parse errors.
    pub fn try_with_args_from<I, T>(self, args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(self.apply(SwarmCli::try_parse_from(args)?))
    }

    fn apply(mut self, args: SwarmCli) -> Self {
        if args.host.is_some() {
            self.config.host = args.host;
        }
        if let Some(users) = args.users {
            self.config.users = users;
        }
        if let Some(spawn_rate) = args.spawn_rate {
            self.config.spawn_rate = spawn_rate;
        }
        if args.run_time.is_some() {
            self.config.run_time = args.run_time;
        }
        if args.max_tps.is_some() {
            self.config.max_tps = args.max_tps;
        }
        if let Some(stats_interval) = args.stats_interval {
            self.config.stats_interval = stats_interval;
        }
        if let Some(request_timeout) = args.request_timeout {
            self.config.request_timeout = request_timeout;
        }
        if args.json_report.is_some() {
            self.json_report = args.json_report;
        }
        if args.prometheus.is_some() {
            self.prometheus = args.prometheus;
        }
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.config.host = Some(host.to_string());
        self
    }

    pub fn users(mut self, users: usize) -> Self {
        self.config.users = users;
        self
    }

    pub fn spawn_rate(mut self, spawn_rate: f64) -> Self {
        self.config.spawn_rate = spawn_rate;
        self
    }

    pub fn run_time(mut self, run_time: Duration) -> Self {
        self.config.run_time = Some(run_time);
        self
    }

    pub fn max_tps(mut self, max_tps: NonZeroU32) -> Self {
        self.config.max_tps = Some(max_tps);
        self
    }

    pub fn wait_time(mut self, wait_time: WaitTime) -> Self {
        self.config.wait_time = wait_time;
        self
    }

    pub fn stats_interval(mut self, stats_interval: Duration) -> Self {
        self.config.stats_interval = stats_interval;
        self
    }

    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.config.request_timeout = request_timeout;
        self
    }

    pub fn json_report(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_report = Some(path.into());
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn tasks(&self) -> &[Task<Session>] {
        &self.tasks
    }

    /// Checks the configuration, returning the host and the delay between user spawns.
    fn validate(&self) -> Result<(&str, Duration), SwarmError> {
        let host = self.config.host.as_deref().ok_or(SwarmError::MissingHost)?;
        let url = url::Url::parse(host)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SwarmError::UnsupportedScheme(url.scheme().to_string()));
        }

        let spawn_interval = self
            .config
            .spawn_interval()
            .ok_or(SwarmError::InvalidSpawnRate(self.config.spawn_rate))?;

        if self.config.stats_interval.is_zero() {
            return Err(SwarmError::ZeroStatsInterval);
        }

        if self.tasks.is_empty() {
            return Err(SwarmError::NoTasks);
        }

        Ok((host, spawn_interval))
    }

    /// Run the load test until the run time elapses or Ctrl-C is received.
    #[instrument(
        name = "swarm",
        skip_all,
        fields(host = self.config.host.as_deref(), users = self.config.users)
    )]
    pub async fn run(self) -> Result<RunStatistics, SwarmError> {
        let (host, spawn_interval) = self.validate()?;
        let host = host.to_string();
        let Swarm {
            config,
            tasks,
            json_report,
            prometheus,
        } = self;

        if let Some(addr) = prometheus {
            install_exporter(addr)?;
        }

        let tasks = TaskSet::new(tasks)?;
        info!(
            "Running {} task(s) against {host} with config {:?}",
            tasks.len(),
            &config
        );

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let stats = Arc::new(StatsCollector::new());
        let session = Session::new(
            client,
            &host,
            TransactionData::new(config.max_tps, stats.clone()),
        );

        let mut pool = UserPool::new(tasks, session, config.wait_time);
        let mut peak_users = 0;

        let mut spawner = interval(spawn_interval);
        spawner.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut reporter = Timer::new(config.stats_interval).await;
        let mut last_requests = 0;
        debug!("Reporting progress every {reporter}.");

        let run_time = config.run_time;
        let deadline = async move {
            match run_time {
                Some(run_time) => tokio::time::sleep(run_time).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        let mut listening = true;

        loop {
            tokio::select! {
                _ = spawner.tick(), if pool.len() < config.users => {
                    pool.set_concurrency(pool.len() + 1);
                    peak_users = peak_users.max(pool.len());
                    debug!("Spawned user {}/{}.", pool.len(), config.users);
                    if pool.len() == config.users {
                        info!("All {} users spawned.", config.users);
                    }
                }
                elapsed = reporter.tick() => {
                    let (requests, failures) = stats.counts()?;
                    let rps = (requests - last_requests) as f64 / elapsed.as_secs_f64();
                    last_requests = requests;
                    info!(
                        "users={} requests={requests} failures={failures} rps={rps:.2}",
                        pool.len()
                    );
                }
                _ = &mut deadline => {
                    info!("Run time elapsed, stopping.");
                    break;
                }
                res = &mut shutdown, if listening => {
                    match res {
                        Ok(()) => {
                            info!("Interrupted, stopping.");
                            break;
                        }
                        Err(err) => {
                            warn!("Unable to listen for Ctrl-C: {err}");
                            listening = false;
                        }
                    }
                }
            }
        }

        pool.shutdown();

        let (requests, total) = stats.snapshot()?;
        let statistics = RunStatistics {
            config,
            users: peak_users,
            elapsed: stats.elapsed(),
            requests,
            total,
        };
        info!(
            "Load test complete: {} requests, {:.2}% failed.",
            statistics.total.num_requests,
            statistics.error_rate() * 100.
        );

        if let Some(path) = json_report {
            std::fs::write(&path, serde_json::to_vec_pretty(&statistics)?)?;
            info!("Wrote report to {}.", path.display());
        }

        Ok(statistics)
    }
}

impl TaskRegistry<Session> for Swarm {
    fn register_task(&mut self, task: Task<Session>) -> &mut Self {
        debug!("Registered task {} (weight {}).", task.name(), task.weight());
        self.tasks.push(task);
        self
    }
}

#[cfg(feature = "metrics")]
fn install_exporter(addr: SocketAddr) -> Result<(), SwarmError> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!("Serving metrics on {addr}.");
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_exporter(addr: SocketAddr) -> Result<(), SwarmError> {
    warn!("Ignoring metrics address {addr}; built without the `metrics` feature.");
    Ok(())
}
