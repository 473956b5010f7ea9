//! Generic read/write worker pool: one FIFO job queue per (pool, role),
//! each worker thread owning its own connection. See spec §4.3 and §5.

mod error;
mod job;
mod pool;
mod role;

pub use error::PoolError;
pub use job::JobHandle;
pub use pool::{ConnFactory, Pool};
pub use role::Role;
