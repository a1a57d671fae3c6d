//! Load test for the user profile endpoint.
//!
//! Each invocation of [`get_user`] fetches one random user profile. All requests are recorded
//! under the single name [`REQUEST_NAME`] so statistics aggregate across identifiers.
use rand::Rng;
use std::ops::Range;
use swarm::{HttpClient, RunStatistics, SwarmError, Task, TaskRegistry};
#[allow(unused)]
use tracing::{debug, trace};

/// Relative frequency of [`get_user`] among the registered tasks.
pub const GET_USER_WEIGHT: u32 = 3;

/// Identifiers are drawn uniformly from this range (upper bound exclusive).
pub const USER_ID_RANGE: Range<u32> = 1..10_000;

/// Statistics name shared by every user request.
pub const REQUEST_NAME: &str = "/item";

/// Source of user identifiers.
///
/// Any `Fn(Range<u32>) -> u32` is an `IdSource`, which makes deterministic sequences easy to
/// inject.
pub trait IdSource {
    fn next_id(&self, range: Range<u32>) -> u32;
}

impl<F> IdSource for F
where
    F: Fn(Range<u32>) -> u32,
{
    fn next_id(&self, range: Range<u32>) -> u32 {
        self(range)
    }
}

/// Uniform identifiers from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&self, range: Range<u32>) -> u32 {
        rand::thread_rng().gen_range(range)
    }
}

pub fn user_path(id: u32) -> String {
    format!("/users/{id}")
}

/// Fetch one random user.
///
/// The outcome is deliberately ignored: the client records and classifies it.
pub async fn get_user<C, I>(client: &C, ids: &I)
where
    C: HttpClient,
    I: IdSource + ?Sized,
{
    let id = ids.next_id(USER_ID_RANGE);
    trace!("Fetching user {id}");
    client.get(&user_path(id), Some(REQUEST_NAME)).await;
}

/// Register [`get_user`] with its weight.
pub fn register<R, C>(registry: &mut R) -> Result<(), SwarmError>
where
    R: TaskRegistry<C>,
    C: HttpClient + Send + Sync + 'static,
{
    let task = Task::new("get_user", GET_USER_WEIGHT, |client: C| async move {
        get_user(&client, &RandomIds).await;
    })?;
    registry.register_task(task);
    Ok(())
}

/// Process exit code for a finished run: `1` if any request failed, `0` otherwise.
pub fn exit_code(stats: &RunStatistics) -> u8 {
    u8::from(stats.has_failures())
}
