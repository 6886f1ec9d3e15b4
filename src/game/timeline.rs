use std::future::Future;
use std::time::Duration;

/// An ordered list of `(delay, action)` steps.
///
/// Each delay is measured from the previous step. [`Timeline::run`] is the
/// single driver: it sleeps on the tokio clock and hands every action to a
/// callback, so tests can run a whole sequence on a paused clock.
#[derive(Debug, Clone)]
pub struct Timeline<A> {
    steps: Vec<(Duration, A)>,
}

impl<A> Default for Timeline<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Timeline<A> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn then(mut self, delay: Duration, action: A) -> Self {
        self.steps.push((delay, action));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|(delay, _)| *delay).sum()
    }

    pub async fn run<F, Fut>(self, mut apply: F)
    where
        F: FnMut(A) -> Fut,
        Fut: Future<Output = ()>,
    {
        for (delay, action) in self.steps {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            apply(action).await;
        }
    }
}
