use thiserror::Error;

/// Errors the pool surfaces to a job submitter.
///
/// `WorkerDied` and `Backpressure` correspond to the `worker-fatal`/
/// `worker-died` and (optional) queue-cap entries of the error taxonomy
/// in spec §7; `StoreUnavailable` covers `store-transient` when the
/// underlying connection factory itself fails.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker died while running this job")]
    WorkerDied,

    #[error("pool queue is at capacity ({depth}/{cap})")]
    Backpressure { depth: usize, cap: usize },

    #[error("pool is shutting down")]
    ShuttingDown,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}
