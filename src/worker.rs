use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tokio::sync::{mpsc, oneshot};

use crate::config::EngineConfig;
use crate::error::HashError;
use crate::hasher::Hasher;
use crate::params::HashParameters;

const QUEUE_DEPTH: usize = 64;

struct Job {
    password: Vec<u8>,
    salt: Vec<u8>,
    params: Option<HashParameters>,
    reply: oneshot::Sender<Result<Vec<u8>, HashError>>,
}

type Queue = Arc<Mutex<mpsc::Receiver<Job>>>;

/// Submits jobs to the pool. Cheap to clone; the pool stops once every
/// handle has been dropped.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<Job>,
}

pub struct WorkerPool {
    threads: Vec<JoinHandle<()>>,
}

/// Start `worker_count` OS threads, each owning its own engine instance and
/// pulling jobs from one shared queue.
pub fn run_pool(
    config: &EngineConfig,
    worker_count: usize,
) -> Result<(WorkerHandle, WorkerPool), HashError> {
    let worker_count = worker_count.max(1);
    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
    let queue: Queue = Arc::new(Mutex::new(rx));

    let mut threads = Vec::with_capacity(worker_count);
    for id in 0..worker_count {
        let hasher = Hasher::new(config)?;
        let queue = Arc::clone(&queue);
        let thread = std::thread::Builder::new()
            .name(format!("argon2-worker-{id}"))
            .spawn(move || run(id, hasher, queue))
            .map_err(|e| HashError::Unavailable(format!("Failed to spawn hash worker: {e}")))?;
        threads.push(thread);
    }

    tracing::info!("Hash worker pool started ({worker_count} workers)");

    Ok((WorkerHandle { tx }, WorkerPool { threads }))
}

/// A single worker loop. Exits when the queue closes.
fn run(id: usize, mut hasher: Hasher, queue: Queue) {
    tracing::debug!("Hash worker {id} started");

    loop {
        let job = match queue.lock() {
            Ok(mut rx) => rx.blocking_recv(),
            Err(_) => {
                tracing::error!("Hash worker {id} found the queue lock poisoned");
                break;
            }
        };
        let Some(job) = job else {
            break;
        };

        let result = hasher.hash(&job.password, &job.salt, job.params.as_ref());
        if let Err(e) = &result {
            tracing::debug!("Hash worker {id} job failed: {e}");
        }
        let _ = job.reply.send(result);
    }

    tracing::debug!("Hash worker {id} stopped");
}

impl WorkerHandle {
    pub async fn hash(
        &self,
        password: &[u8],
        salt: &[u8],
        params: Option<HashParameters>,
    ) -> Result<Vec<u8>, HashError> {
        let (job, reply) = job(password, salt, params);
        self.tx.send(job).await.map_err(|_| closed())?;
        reply.await.map_err(|_| closed())?
    }

    /// Blocking variant of [`WorkerHandle::hash`]. Must not be called from
    /// inside an async runtime.
    pub fn blocking_hash(
        &self,
        password: &[u8],
        salt: &[u8],
        params: Option<HashParameters>,
    ) -> Result<Vec<u8>, HashError> {
        let (job, reply) = job(password, salt, params);
        self.tx.blocking_send(job).map_err(|_| closed())?;
        reply.blocking_recv().map_err(|_| closed())?
    }
}

impl WorkerPool {
    pub fn size(&self) -> usize {
        self.threads.len()
    }

    /// Waits for every worker to exit. Returns only after all
    /// [`WorkerHandle`]s have been dropped.
    pub fn join(self) {
        for thread in self.threads {
            if thread.join().is_err() {
                tracing::error!("Hash worker thread panicked");
            }
        }
        tracing::info!("Hash worker pool stopped");
    }
}

fn job(
    password: &[u8],
    salt: &[u8],
    params: Option<HashParameters>,
) -> (Job, oneshot::Receiver<Result<Vec<u8>, HashError>>) {
    let (reply, rx) = oneshot::channel();
    let job = Job {
        password: password.to_vec(),
        salt: salt.to_vec(),
        params,
        reply,
    };
    (job, rx)
}

fn closed() -> HashError {
    HashError::Unavailable("hash worker pool has shut down".to_string())
}
