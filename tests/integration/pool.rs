//! Worker pool tests.
//!
//! These tests verify that every task yields exactly one result whatever
//! the pool size, and that a pool as wide as the workload never deadlocks.

use std::sync::{Arc, Barrier};
use std::time::Duration;

use diagdump::engine::{task_stream, Aggregator, Task, WorkerPool};
use diagdump::engine::aggregate::{PROGRESS_FAILED, PROGRESS_OK};
use diagdump::Error;

fn feed(k: usize, make: impl Fn(usize) -> Task + Send + 'static) -> crossbeam_channel::Receiver<Task> {
    let (tx, rx) = task_stream(0);
    std::thread::spawn(move || {
        for i in 0..k {
            tx.send(make(i));
        }
    });
    rx
}

/// Test: Single worker
/// Given N=1 and k tasks
/// When the pool drains the stream
/// Then exactly k results arrive before the results stream closes
#[test]
fn test_single_worker_runs_all_tasks() {
    let k = 25;
    let pool = WorkerPool::new(1).unwrap();
    let results = pool
        .start(feed(k, |i| Task::new(format!("t{}", i), || Ok(()))))
        .unwrap();

    let outcomes: Vec<_> = results.iter().collect();
    assert_eq!(outcomes.len(), k);
    assert!(outcomes.iter().all(|o| o.is_ok()));
}

/// Test: As many workers as tasks
/// Given N=k tasks that each wait for all the others
/// When the pool runs
/// Then all k run at once without deadlock
#[test]
fn test_pool_as_wide_as_workload() {
    let k = 6;
    let barrier = Arc::new(Barrier::new(k));
    let pool = WorkerPool::new(k).unwrap();
    let results = pool
        .start(feed(k, move |i| {
            let barrier = barrier.clone();
            Task::new(format!("t{}", i), move || {
                barrier.wait();
                Ok(())
            })
        }))
        .unwrap();

    let outcomes: Vec<_> = results.iter().collect();
    assert_eq!(outcomes.len(), k);
}

/// Test: Result accounting
/// Given a mix of succeeding, failing and panicking tasks
/// When pools of several sizes run them
/// Then results always equal tasks
#[test]
fn test_results_equal_tasks_for_any_pool_size() {
    for workers in [1, 2, 3, 8, 32] {
        let pool = WorkerPool::new(workers).unwrap();
        let results = pool
            .start(feed(40, |i| match i % 4 {
                0 => Task::failing(format!("t{}", i), Error::NoProjects),
                1 => Task::new(format!("t{}", i), || panic!("task bug")),
                2 => Task::new(format!("t{}", i), || {
                    std::thread::sleep(Duration::from_millis(1));
                    Ok(())
                }),
                _ => Task::new(format!("t{}", i), || Ok(())),
            }))
            .unwrap();

        let mut progress = Vec::new();
        let summary = Aggregator::new(&mut progress).consume(results);
        assert_eq!(summary.total, 40, "workers={}", workers);
        assert_eq!(summary.failed(), 20, "workers={}", workers);

        let progress = String::from_utf8(progress).unwrap();
        assert_eq!(progress.matches(PROGRESS_OK).count(), 20);
        assert_eq!(progress.matches(PROGRESS_FAILED).count(), 20);
    }
}

#[test]
fn test_zero_workers_rejected() {
    assert!(matches!(WorkerPool::new(0), Err(Error::Validation(_))));
}
