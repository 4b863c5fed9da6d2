use futures::{future::BoxFuture, stream::FuturesUnordered, StreamExt};

/// A join group: every future pushed into the scope runs concurrently on the
/// current task, and `join_all` resolves once all of them completed.
/// Dropping the scope drops (cancels) the futures that did not complete.
pub struct ConcurrencyScope<'exec, T> {
    jobs: FuturesUnordered<BoxFuture<'exec, T>>,
}

impl<'exec, T> Default for ConcurrencyScope<'exec, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'exec, T> ConcurrencyScope<'exec, T> {
    pub fn new() -> Self {
        Self {
            jobs: FuturesUnordered::new(),
        }
    }

    pub fn spawn(&mut self, future: BoxFuture<'exec, T>) {
        self.jobs.push(future);
    }

    /// Results are returned in completion order.
    pub async fn join_all(mut self) -> Vec<T> {
        let mut results = Vec::with_capacity(self.jobs.len());
        while let Some(result) = self.jobs.next().await {
            results.push(result);
        }
        results
    }
}
