//! Bounded-concurrency task pool
//!
//! Shared by the component compiler and the reconciler: a fixed number of
//! tasks in flight over a backlog, each completion starting the next queued
//! item. A single task's outcome never tears down the pool; callers observe
//! per-task success or failure inside the task itself.

use futures::stream::{self, StreamExt};
use std::future::Future;

/// Run `task` over every item with at most `concurrency` futures in flight.
///
/// Results are collected in completion order, not submission order. A
/// `concurrency` of zero is treated as one.
pub async fn run_bounded<I, T, F, Fut>(concurrency: usize, items: I, task: F) -> Vec<T>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    stream::iter(items)
        .map(task)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_items_processed() {
        let results = run_bounded(4, 0..20, |n| async move { n * 2 }).await;
        assert_eq!(results.len(), 20);
        let mut sorted = results.clone();
        sorted.sort();
        assert_eq!(sorted, (0..20).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_bound() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);

        run_bounded(3, 0..30, |_| {
            let in_flight = &in_flight;
            let peak = &peak;
            async move {
                let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_pool() {
        let results: Vec<Result<usize, String>> = run_bounded(2, 0..10, |n| async move {
            if n == 4 {
                Err(format!("task {n} failed"))
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(results.len(), 10);
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 9);
    }

    #[tokio::test]
    async fn test_zero_concurrency_clamps_to_one() {
        let results = run_bounded(0, 0..3, |n| async move { n }).await;
        // Sequential with a window of one, still drains everything
        assert_eq!(results, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let results: Vec<u32> = run_bounded(4, Vec::<u32>::new(), |n| async move { n }).await;
        assert!(results.is_empty());
    }
}
