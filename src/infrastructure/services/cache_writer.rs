//! Background write-through of resolved prompts into the semantic cache
//!
//! Writes are at-most-once: a full queue drops the write, a failed write is
//! logged and never retried.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::SemanticCacheService;

const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug)]
enum CacheWriteMsg {
    Store {
        vector: Vec<f32>,
        prompt: String,
        sql: String,
    },
    /// Answered once every write queued before it has been attempted
    Flush { respond_to: oneshot::Sender<()> },
}

/// Handle used by the pipeline to queue cache writes
#[derive(Debug, Clone)]
pub struct CacheWriter {
    tx: mpsc::Sender<CacheWriteMsg>,
}

impl CacheWriter {
    /// Start the worker. It stops once every handle has been dropped.
    pub fn spawn(service: Arc<SemanticCacheService>) -> (Self, JoinHandle<()>) {
        Self::spawn_with_capacity(service, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn spawn_with_capacity(
        service: Arc<SemanticCacheService>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = CacheWriterActor { rx, service };
        let handle = tokio::spawn(worker.run());

        (Self { tx }, handle)
    }

    /// Queue a write. Returns false when the write was dropped.
    pub fn enqueue(&self, vector: Vec<f32>, prompt: impl Into<String>, sql: impl Into<String>) -> bool {
        let msg = CacheWriteMsg::Store {
            vector,
            prompt: prompt.into(),
            sql: sql.into(),
        };

        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Dropping semantic cache write");
                false
            }
        }
    }

    /// Wait until every previously queued write has been attempted
    pub async fn flush(&self) {
        let (respond_to, done) = oneshot::channel();

        if self.tx.send(CacheWriteMsg::Flush { respond_to }).await.is_ok() {
            let _ = done.await;
        }
    }
}

struct CacheWriterActor {
    rx: mpsc::Receiver<CacheWriteMsg>,
    service: Arc<SemanticCacheService>,
}

impl CacheWriterActor {
    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                CacheWriteMsg::Store { vector, prompt, sql } => {
                    match self.service.store(vector, &prompt, &sql).await {
                        Ok(id) => debug!(id = %id, "Cache write-through completed"),
                        Err(e) => warn!(error = %e, prompt = %prompt, "Cache write-through failed"),
                    }
                }
                CacheWriteMsg::Flush { respond_to } => {
                    let _ = respond_to.send(());
                }
            }
        }

        debug!("Cache writer stopped");
    }
}
