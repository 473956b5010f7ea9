//! The worker pool itself: one FIFO queue per (pool, role), N reader threads
//! and M writer threads each owning their own connection, with per-worker
//! error budgets and automatic respawn. See spec §4.3 "Worker pool" and §5
//! "Concurrency & Resource Model".

use crate::error::PoolError;
use crate::job::{make_job, Job, JobHandle};
use crate::role::Role;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;

/// How a pool opens a fresh connection for a newly (re)spawned worker.
pub trait ConnFactory<Conn>: Send + Sync + 'static {
    fn open(&self) -> Result<Conn, PoolError>;
}

impl<Conn, F> ConnFactory<Conn> for F
where
    F: Fn() -> Result<Conn, PoolError> + Send + Sync + 'static,
{
    fn open(&self) -> Result<Conn, PoolError> {
        self()
    }
}

struct RoleQueue<Conn> {
    tx: SyncSender<Box<dyn Job<Conn>>>,
    shared_rx: Arc<Mutex<Receiver<Box<dyn Job<Conn>>>>>,
    depth: Arc<AtomicUsize>,
    cap: Option<usize>,
}

/// A pool of workers for a single store, split into a reader role and a
/// writer role, each with its own FIFO queue and worker count.
pub struct Pool<Conn> {
    name: String,
    queues: std::collections::HashMap<Role, RoleQueue<Conn>>,
    shutdown: Arc<AtomicBool>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl<Conn: Send + 'static> Pool<Conn> {
    /// Spin up `readers` reader workers and `writers` writer workers, each
    /// opened via `factory`. `queue_cap` enforces the optional backpressure
    /// cap from spec §9's Open Question; `None` keeps the original's
    /// unbounded behavior.
    pub fn new(
        name: impl Into<String>,
        readers: usize,
        writers: usize,
        factory: Arc<dyn ConnFactory<Conn>>,
        max_worker_errors: u32,
        queue_cap: Option<usize>,
    ) -> Self {
        let name = name.into();
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut queues = std::collections::HashMap::new();
        let mut workers = Vec::new();

        for (role, count) in [(Role::Reader, readers), (Role::Writer, writers)] {
            if count == 0 {
                continue;
            }
            let bound = queue_cap.unwrap_or(usize::MAX / 2);
            let (tx, rx) = sync_channel(bound);
            let shared_rx = Arc::new(Mutex::new(rx));
            let depth = Arc::new(AtomicUsize::new(0));

            for worker_idx in 0..count {
                let label = format!("{name}-{role_str}-{worker_idx}", role_str = role.as_str());
                let handle = spawn_supervised_worker(
                    label,
                    Arc::clone(&shared_rx),
                    Arc::clone(&factory),
                    Arc::clone(&shutdown),
                    Arc::clone(&depth),
                    max_worker_errors,
                );
                workers.push(handle);
            }

            queues.insert(
                role,
                RoleQueue {
                    tx,
                    shared_rx,
                    depth,
                    cap: queue_cap,
                },
            );
        }

        Pool {
            name,
            queues,
            shutdown,
            workers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submit a job to the given role's FIFO queue. Dispatch order is
    /// preserved per-role; completion order is not (spec §5 "Ordering
    /// guarantees").
    pub fn submit<T, F>(&self, role: Role, f: F) -> Result<JobHandle<T>, PoolError>
    where
        Conn: 'static,
        F: FnOnce(&mut Conn) -> Result<T, PoolError> + Send + 'static,
        T: Send + 'static,
    {
        let queue = self
            .queues
            .get(&role)
            .ok_or_else(|| PoolError::StoreUnavailable(format!("{} has no {:?} workers", self.name, role)))?;

        if let Some(cap) = queue.cap {
            let depth = queue.depth.load(Ordering::Acquire);
            if depth >= cap {
                return Err(PoolError::Backpressure { depth, cap });
            }
        }

        let (job, rx) = make_job(f);
        queue.depth.fetch_add(1, Ordering::AcqRel);
        let depth_counter = Arc::clone(&queue.depth);
        queue
            .tx
            .try_send(Box::new(CountedJob {
                inner: job,
                depth: depth_counter,
            }))
            .map_err(|_| PoolError::ShuttingDown)?;
        Ok(JobHandle { rx })
    }

    /// Enqueue a terminate message on every worker and wait for them to
    /// exit. Matches spec §4.3's shutdown contract.
    pub fn shutdown(self) {
        self.shutdown.store(true, Ordering::Release);
        drop(self.queues); // dropping senders wakes blocked recv() calls
        for handle in self.workers {
            let _ = handle.join();
        }
    }
}

/// Wraps a job so the queue depth counter is decremented the instant a
/// worker picks it up, regardless of how the job finishes.
struct CountedJob<Conn> {
    inner: Box<dyn Job<Conn>>,
    depth: Arc<AtomicUsize>,
}

impl<Conn> Job<Conn> for CountedJob<Conn> {
    fn run(self: Box<Self>, conn: &mut Conn) {
        self.depth.fetch_sub(1, Ordering::AcqRel);
        self.inner.run(conn);
    }
}

fn spawn_supervised_worker<Conn: Send + 'static>(
    label: String,
    shared_rx: Arc<Mutex<Receiver<Box<dyn Job<Conn>>>>>,
    factory: Arc<dyn ConnFactory<Conn>>,
    shutdown: Arc<AtomicBool>,
    _depth: Arc<AtomicUsize>,
    max_worker_errors: u32,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name(label.clone())
        .spawn(move || {
            while !shutdown.load(Ordering::Acquire) {
                run_worker_generation(&label, &shared_rx, factory.as_ref(), max_worker_errors);
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                tracing::warn!(worker = %label, "worker exhausted its error budget, respawning");
            }
            tracing::info!(worker = %label, "worker terminated");
        })
        .expect("failed to spawn pool worker thread")
}

/// Runs one "life" of a worker: open a connection, then pull and run jobs
/// until either the queue is closed (pool shutting down), or the running
/// error count exceeds `max_worker_errors` (spec §4.3: "the worker exits
/// and is respawned by the pool").
fn run_worker_generation<Conn>(
    label: &str,
    shared_rx: &Arc<Mutex<Receiver<Box<dyn Job<Conn>>>>>,
    factory: &dyn ConnFactory<Conn>,
    max_worker_errors: u32,
) {
    let mut conn = match factory.open() {
        Ok(conn) => conn,
        Err(err) => {
            tracing::error!(worker = %label, error = %err, "failed to open store connection");
            thread::sleep(std::time::Duration::from_millis(100));
            return;
        }
    };

    let mut error_count: u32 = 0;
    loop {
        let job = {
            let rx = shared_rx.lock().expect("worker queue mutex poisoned");
            rx.recv()
        };
        let job = match job {
            Ok(job) => job,
            Err(_) => return, // channel closed: pool is shutting down
        };

        let ran_ok = catch_unwind(AssertUnwindSafe(|| job.run(&mut conn))).is_ok();
        if !ran_ok {
            error_count += 1;
            tracing::error!(worker = %label, error_count, "job panicked");
        }
        if error_count > max_worker_errors {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn counting_factory() -> Arc<dyn ConnFactory<AtomicU32>> {
        Arc::new(|| Ok(AtomicU32::new(0)))
    }

    #[tokio::test]
    async fn reader_jobs_run_and_reply() {
        let pool = Pool::new("test", 2, 1, counting_factory(), 100, None);
        let handle = pool
            .submit(Role::Reader, |conn: &mut AtomicU32| {
                conn.fetch_add(1, Ordering::SeqCst);
                Ok(conn.load(Ordering::SeqCst))
            })
            .unwrap();
        assert_eq!(handle.wait().await.unwrap(), 1);
        pool.shutdown();
    }

    #[tokio::test]
    async fn writer_jobs_are_serialized_per_connection() {
        let pool = Pool::new("test-writer", 0, 1, counting_factory(), 100, None);
        let mut handles = Vec::new();
        for _ in 0..10 {
            handles.push(
                pool.submit(Role::Writer, |conn: &mut AtomicU32| {
                    Ok(conn.fetch_add(1, Ordering::SeqCst))
                })
                .unwrap(),
            );
        }
        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.wait().await.unwrap());
        }
        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        pool.shutdown();
    }

    #[tokio::test]
    async fn backpressure_rejects_over_capacity_submissions() {
        let pool = Pool::new("test-cap", 0, 1, counting_factory(), 100, Some(1));
        // Fill the single writer thread with a job that blocks until we say so.
        let (unblock_tx, unblock_rx) = std::sync::mpsc::channel::<()>();
        let _first = pool
            .submit(Role::Writer, move |_conn: &mut AtomicU32| {
                let _ = unblock_rx.recv();
                Ok(())
            })
            .unwrap();
        // Give the worker a moment to pick up the blocking job so the queue is
        // actually empty-but-in-flight before we probe capacity.
        std::thread::sleep(std::time::Duration::from_millis(20));
        let _second = pool.submit(Role::Writer, |_: &mut AtomicU32| Ok(())).unwrap();
        let third = pool.submit(Role::Writer, |_: &mut AtomicU32| Ok(()));
        assert!(matches!(third, Err(PoolError::Backpressure { .. })));
        let _ = unblock_tx.send(());
        pool.shutdown();
    }
}
