use clap::Parser;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

/// Command line arguments understood by `Swarm::with_args`.
///
/// Every value is optional so that anything set in code before `with_args` is only replaced
/// when given on the command line.
#[derive(Parser, Debug)]
#[command(version, about = "Run a weighted HTTP load test.")]
pub(crate) struct SwarmCli {
    /// Host to load test, e.g. `http://localhost:3000`
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Peak number of concurrent users [default: 1]
    #[arg(short, long)]
    pub users: Option<usize>,

    /// Users to start per second [default: 1]
    #[arg(short = 'r', long)]
    pub spawn_rate: Option<f64>,

    /// Stop after this long, e.g. `30s`, `5m`, `1h 30m`. Runs until Ctrl-C otherwise
    #[arg(short = 't', long, value_parser = humantime::parse_duration)]
    pub run_time: Option<Duration>,

    /// Cap on requests per second across all users
    #[arg(long)]
    pub max_tps: Option<NonZeroU32>,

    /// Interval between progress lines [default: 2s]
    #[arg(long, value_parser = humantime::parse_duration)]
    pub stats_interval: Option<Duration>,

    /// Timeout of a single request [default: 60s]
    #[arg(long, value_parser = humantime::parse_duration)]
    pub request_timeout: Option<Duration>,

    /// Write the final statistics to this file as JSON
    #[arg(long)]
    pub json_report: Option<PathBuf>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub prometheus: Option<SocketAddr>,
}
