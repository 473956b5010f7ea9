//! Type-erased jobs so one `std::sync::mpsc` channel per pool+role can carry
//! arbitrarily-typed read/write operations while still handing the caller
//! back a strongly-typed result.

use crate::error::PoolError;
use tokio::sync::oneshot;

/// A unit of work a worker thread runs against its owned connection.
pub(crate) trait Job<Conn>: Send {
    fn run(self: Box<Self>, conn: &mut Conn);
}

struct JobImpl<Conn, T, F>
where
    F: FnOnce(&mut Conn) -> Result<T, PoolError> + Send,
    T: Send,
{
    f: F,
    reply: oneshot::Sender<Result<T, PoolError>>,
}

impl<Conn, T, F> Job<Conn> for JobImpl<Conn, T, F>
where
    F: FnOnce(&mut Conn) -> Result<T, PoolError> + Send,
    T: Send,
{
    fn run(self: Box<Self>, conn: &mut Conn) {
        let result = (self.f)(conn);
        // The receiver may already be gone if the submitter dropped the
        // handle; that's fine, the job still ran to completion.
        let _ = self.reply.send(result);
    }
}

pub(crate) fn make_job<Conn, T, F>(f: F) -> (Box<dyn Job<Conn>>, oneshot::Receiver<Result<T, PoolError>>)
where
    Conn: 'static,
    F: FnOnce(&mut Conn) -> Result<T, PoolError> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    (Box::new(JobImpl { f, reply: tx }), rx)
}

/// A handle to a job submitted to a pool. Resolves once the worker that
/// picked it up replies, or with `PoolError::WorkerDied` if that worker
/// crashed mid-job and the pool had to respawn it without a reply.
pub struct JobHandle<T> {
    pub(crate) rx: oneshot::Receiver<Result<T, PoolError>>,
}

impl<T> JobHandle<T> {
    pub async fn wait(self) -> Result<T, PoolError> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(PoolError::WorkerDied),
        }
    }
}
