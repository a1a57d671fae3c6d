//! A small load generator.
//!
//! Tasks are registered with a weight on a [`Swarm`]. Each simulated user repeatedly picks a task
//! by weight and runs it with a [`Session`], the managed HTTP client which times, classifies and
//! records every request under its grouping name.
mod cli;
mod client;
mod error;
mod runner;
mod stats;
mod task;
mod timer;
mod transaction;
mod user;

pub use client::{HttpClient, LocalHttpClient, Session};
pub use error::SwarmError;
pub use runner::Swarm;
pub use task::{BoxedFut, Task, TaskRegistry};

pub use swarm_core::{RequestOutcome, RequestStats, RunConfig, RunStatistics, WaitTime};

pub mod prelude {
    pub use crate::{HttpClient, Session, Swarm, SwarmError, Task, TaskRegistry};
    pub use swarm_core::{RequestOutcome, RequestStats, RunStatistics, WaitTime};
}
