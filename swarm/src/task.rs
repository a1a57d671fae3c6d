//! Weighted tasks and the registry they are attached to.
use crate::error::SwarmError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::{fmt, future::Future, num::NonZeroU32, pin::Pin, sync::Arc};

pub type BoxedFut = Pin<Box<dyn Future<Output = ()> + Send>>;
type TaskFn<C> = Arc<dyn Fn(C) -> BoxedFut + Send + Sync>;

/// A unit of work a simulated user picks by weight.
///
/// `C` is the client handed to the task on every invocation. The engine runs tasks with a
/// [`Session`](crate::Session); tests may run them with anything else.
///
/// # Example
/// ```ignore
/// let task = Task::new("index", 3, |session: Session| async move {
///     session.get("/", None).await;
/// })?;
/// ```
pub struct Task<C> {
    name: String,
    weight: NonZeroU32,
    func: TaskFn<C>,
}

impl<C: 'static> Task<C> {
    pub fn new<T, F>(name: &str, weight: u32, func: T) -> Result<Self, SwarmError>
    where
        T: Fn(C) -> F + Send + Sync + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        let weight =
            NonZeroU32::new(weight).ok_or_else(|| SwarmError::ZeroWeight(name.to_string()))?;
        let func: TaskFn<C> = Arc::new(move |client: C| -> BoxedFut { Box::pin(func(client)) });

        Ok(Self {
            name: name.to_string(),
            weight,
            func,
        })
    }
}

impl<C> Task<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> u32 {
        self.weight.get()
    }

    pub fn run(&self, client: C) -> BoxedFut {
        (self.func)(client)
    }
}

impl<C> Clone for Task<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            weight: self.weight,
            func: self.func.clone(),
        }
    }
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Anything tasks can be registered with. Implemented by [`Swarm`](crate::Swarm).
pub trait TaskRegistry<C> {
    fn register_task(&mut self, task: Task<C>) -> &mut Self;
}

/// The registered tasks, ready for weighted selection.
pub(crate) struct TaskSet<C> {
    tasks: Vec<Task<C>>,
    index: WeightedIndex<u32>,
}

impl<C> TaskSet<C> {
    pub fn new(tasks: Vec<Task<C>>) -> Result<Self, SwarmError> {
        if tasks.is_empty() {
            return Err(SwarmError::NoTasks);
        }

        let index = WeightedIndex::new(tasks.iter().map(Task::weight))?;
        Ok(Self { tasks, index })
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &Task<C> {
        &self.tasks[self.index.sample(rng)]
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop(name: &str, weight: u32) -> Task<()> {
        Task::new(name, weight, |_: ()| async {}).unwrap()
    }

    #[test]
    fn zero_weight_is_rejected() {
        let res = Task::new("never", 0, |_: ()| async {});
        assert!(matches!(res, Err(SwarmError::ZeroWeight(name)) if name == "never"));
    }

    #[test]
    fn empty_task_set_is_rejected() {
        let res = TaskSet::<()>::new(vec![]);
        assert!(matches!(res, Err(SwarmError::NoTasks)));
    }

    #[test]
    fn single_task_is_always_picked() {
        let set = TaskSet::new(vec![noop("only", 3)]).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(set.pick(&mut rng).name(), "only");
        }
    }

    #[test]
    fn selection_follows_weights() {
        let set = TaskSet::new(vec![noop("heavy", 3), noop("light", 1)]).unwrap();
        assert_eq!(set.len(), 2);

        let mut rng = SmallRng::seed_from_u64(42);
        let draws = 20_000;
        let heavy = (0..draws)
            .filter(|_| set.pick(&mut rng).name() == "heavy")
            .count();

        let ratio = heavy as f64 / draws as f64;
        assert!(ratio > 0.72 && ratio < 0.78, "ratio was {ratio}");
    }

    #[tokio::test]
    async fn run_hands_client_to_task() {
        let calls = Arc::new(AtomicUsize::new(0));
        let task = Task::new("count", 1, |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();

        task.run(calls.clone()).await;
        task.clone().run(calls.clone()).await;

        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert_eq!(task.weight(), 1);
    }
}
