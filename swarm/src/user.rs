use crate::task::TaskSet;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use swarm_core::WaitTime;
use tokio::task::JoinHandle;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn, Instrument};

/// The simulated users of a run.
pub(crate) struct UserPool<C> {
    tasks: Arc<TaskSet<C>>,
    client: C,
    wait_time: WaitTime,
    users: Vec<JoinHandle<()>>,
    spawned: usize,
}

impl<C> UserPool<C>
where
    C: Clone + Send + 'static,
{
    pub fn new(tasks: TaskSet<C>, client: C, wait_time: WaitTime) -> Self {
        Self {
            tasks: Arc::new(tasks),
            client,
            wait_time,
            users: vec![],
            spawned: 0,
        }
    }

    /// Start or abort users until exactly `concurrency` are running.
    pub fn set_concurrency(&mut self, concurrency: usize) {
        if self.users.len() == concurrency {
            return;
        } else if self.users.len() > concurrency {
            for handle in self.users.drain(concurrency..) {
                handle.abort();
            }
        } else {
            while self.users.len() < concurrency {
                self.spawned += 1;
                let id = self.spawned;
                let tasks = self.tasks.clone();
                let client = self.client.clone();
                let wait_time = self.wait_time;

                self.users.push(tokio::spawn(
                    user_loop(tasks, client, wait_time)
                        .instrument(tracing::debug_span!("user", id)),
                ));
            }
        }

        #[cfg(feature = "metrics")]
        metrics::gauge!(swarm_core::USERS_METRIC).set(self.users.len() as f64);
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn shutdown(mut self) {
        self.set_concurrency(0);
    }
}

impl<C> Drop for UserPool<C> {
    fn drop(&mut self) {
        for handle in self.users.drain(..) {
            handle.abort();
        }
    }
}

async fn user_loop<C: Clone>(tasks: Arc<TaskSet<C>>, client: C, wait_time: WaitTime) {
    let mut rng = SmallRng::from_entropy();
    debug!("User started.");

    loop {
        let task = tasks.pick(&mut rng).run(client.clone());
        task.await;

        match sample_wait(&wait_time, &mut rng) {
            Some(wait) => tokio::time::sleep(wait).await,
            // NOTE: Tasks which never yield would otherwise starve the runtime.
            None => tokio::task::yield_now().await,
        }
    }
}

fn sample_wait<R: Rng + ?Sized>(wait_time: &WaitTime, rng: &mut R) -> Option<Duration> {
    match *wait_time {
        WaitTime::None => None,
        WaitTime::Constant(wait) => Some(wait),
        WaitTime::Between(min, max) if min >= max => Some(min),
        WaitTime::Between(min, max) => Some(rng.gen_range(min..=max)),
    }
}
