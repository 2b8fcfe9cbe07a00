//! Bounded worker pool for independent trials.
//!
//! Trial indices are fed through a bounded channel to named worker threads;
//! results come back tagged with their index and are re-ordered, so the output
//! does not depend on scheduling.

use std::thread;

use crossbeam_channel::{bounded, unbounded};
use tracing::debug;

use crate::error::{ExecutionError, FacLocResult};

/// Maximum queued trial indices per worker.
const QUEUE_PER_WORKER: usize = 4;

/// Runs `job(0..jobs)` on up to `workers` threads and returns results in index order.
///
/// With one worker (or fewer than two jobs) everything runs on the calling
/// thread. The first failing job, in index order, aborts the whole batch.
pub(crate) fn run_indexed<T, F>(jobs: usize, workers: usize, job: F) -> FacLocResult<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> FacLocResult<T> + Sync,
{
    let workers = workers.max(1).min(jobs.max(1));
    if workers == 1 {
        return (0..jobs).map(&job).collect();
    }

    thread::scope(|scope| -> FacLocResult<Vec<T>> {
        let (job_tx, job_rx) = bounded::<usize>(workers * QUEUE_PER_WORKER);
        let (reply_tx, reply_rx) = unbounded::<(usize, FacLocResult<T>)>();

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx = job_rx.clone();
            let tx = reply_tx.clone();
            let job = &job;
            let handle = thread::Builder::new()
                .name(format!("facloc-trial-{idx}"))
                .spawn_scoped(scope, move || {
                    for trial in rx {
                        if tx.send((trial, job(trial))).is_err() {
                            break;
                        }
                    }
                })
                .map_err(|e| ExecutionError::WorkerSpawn {
                    message: e.to_string(),
                })?;
            handles.push(handle);
        }
        drop(job_rx);
        drop(reply_tx);
        debug!(workers, jobs, "trial pool started");

        for trial in 0..jobs {
            // Workers only hang up early if they all died; joining below reports it.
            if job_tx.send(trial).is_err() {
                break;
            }
        }
        drop(job_tx);

        let mut slots: Vec<Option<FacLocResult<T>>> = (0..jobs).map(|_| None).collect();
        for (trial, result) in reply_rx {
            slots[trial] = Some(result);
        }

        let panicked = handles
            .into_iter()
            .map(thread::ScopedJoinHandle::join)
            .filter(Result::is_err)
            .count();
        if panicked > 0 {
            return Err(ExecutionError::WorkerPanicked.into());
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(trial, slot)| slot.unwrap_or_else(|| Err(ExecutionError::Disconnected { trial }.into())))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::{FacLocError, ValidationError};

    #[test]
    fn sequential_and_parallel_agree() {
        let square = |i: usize| -> FacLocResult<usize> { Ok(i * i) };
        let seq = run_indexed(50, 1, square).unwrap();
        let par = run_indexed(50, 4, square).unwrap();
        assert_eq!(seq, par);
        assert_eq!(par[7], 49);
    }

    #[test]
    fn every_job_runs_once() {
        let calls = AtomicUsize::new(0);
        let out = run_indexed(33, 3, |i| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(i)
        })
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 33);
        assert_eq!(out, (0..33).collect::<Vec<_>>());
    }

    #[test]
    fn zero_jobs_is_empty() {
        let out = run_indexed(0, 8, |i| Ok(i)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn first_error_in_index_order_wins() {
        let err = run_indexed(20, 4, |i| {
            if i == 5 || i == 12 {
                Err(FacLocError::from(ValidationError::NonPositiveIterations {
                    field: format!("job-{i}"),
                }))
            } else {
                Ok(i)
            }
        })
        .unwrap_err();
        let FacLocError::InvalidConfiguration(ValidationError::NonPositiveIterations { field }) = err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(field, "job-5");
    }

    #[test]
    fn panicking_worker_is_reported() {
        let err = run_indexed(8, 2, |i| {
            assert!(i != 3, "boom");
            Ok(i)
        })
        .unwrap_err();
        assert!(matches!(err, FacLocError::Execution(ExecutionError::WorkerPanicked)));
    }
}
