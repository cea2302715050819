//! # Write-Through Sink
//!
//! Carries cache mutations to the durable store in the background.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Write-Through Flow                                │
//! │                                                                         │
//! │  Repository call (sync)                                                │
//! │       │  mutate cache under lock                                       │
//! │       │  enqueue ReplaceAll{collection, snapshot}  ← still under lock  │
//! │       ▼                                                                 │
//! │  return to caller  ◄── does not wait for the disk                      │
//! │                                                                         │
//! │  ┌──────────────── unbounded mpsc (FIFO) ─────────────────┐            │
//! │  │ ReplaceAll(products) │ ReplaceAll(transactions) │ ...  │            │
//! │  └──────────────────────────────┬──────────────────────────┘           │
//! │                                 ▼                                       │
//! │  WriteThroughWorker::run  (one task)                                   │
//! │       • applies ops strictly in enqueue order                          │
//! │       • one adapter call per op, no coalescing                         │
//! │       • failure → error! + counted, never retried                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Enqueueing under the cache lock is what makes the durable order match
//! the in-memory order. A failed write is not retried: the next mutation of
//! the same collection rewrites it whole and repairs the store.

use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use stockbook_core::Collection;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::adapter::DurableStore;
use crate::error::{StoreError, StoreResult};

// =============================================================================
// Operations
// =============================================================================

/// One queued unit of work for the worker.
#[derive(Debug)]
pub enum SinkOp {
    ReplaceAll {
        collection: Collection,
        records: Vec<Value>,
    },
    SetMeta {
        key: String,
        value: String,
    },
    /// Resolves once every earlier op has been attempted.
    Flush(oneshot::Sender<()>),
    /// Like `Flush`, then the worker exits.
    Shutdown(oneshot::Sender<()>),
}

/// Outcome counters for the worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Adapter calls that succeeded.
    pub applied: u64,
    /// Adapter calls that failed (or ops that could not be enqueued).
    pub failed: u64,
    pub last_error: Option<String>,
}

impl SinkStats {
    fn record_failure(&mut self, message: String) {
        self.failed += 1;
        self.last_error = Some(message);
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Sending side of the write-through queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WriteThrough {
    tx: mpsc::UnboundedSender<SinkOp>,
    stats: Arc<Mutex<SinkStats>>,
}

impl WriteThrough {
    /// Creates a handle and its worker. The worker must be spawned by the
    /// caller (see [`WriteThrough::spawn`]).
    pub fn new(store: Arc<dyn DurableStore>) -> (Self, WriteThroughWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(Mutex::new(SinkStats::default()));

        let worker = WriteThroughWorker {
            store,
            rx,
            stats: Arc::clone(&stats),
        };

        (WriteThrough { tx, stats }, worker)
    }

    /// Creates a handle and spawns its worker on the current tokio runtime.
    pub fn spawn(store: Arc<dyn DurableStore>) -> Self {
        let (handle, worker) = Self::new(store);
        tokio::spawn(worker.run());
        handle
    }

    /// Queues a whole-collection write. Never blocks.
    pub fn replace_all(&self, collection: Collection, records: Vec<Value>) {
        debug!(%collection, count = records.len(), "Queueing write-through");
        self.send(SinkOp::ReplaceAll {
            collection,
            records,
        });
    }

    /// Queues a metadata write. Never blocks.
    pub fn set_meta(&self, key: &str, value: String) {
        debug!(key, "Queueing metadata write");
        self.send(SinkOp::SetMeta {
            key: key.to_string(),
            value,
        });
    }

    /// Waits until every operation queued before this call has been attempted.
    pub async fn flush(&self) -> StoreResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(SinkOp::Flush(done_tx))
            .map_err(|_| StoreError::SinkClosed)?;
        done_rx.await.map_err(|_| StoreError::SinkClosed)
    }

    /// Drains the queue and stops the worker.
    pub async fn shutdown(&self) -> StoreResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.tx
            .send(SinkOp::Shutdown(done_tx))
            .map_err(|_| StoreError::SinkClosed)?;
        done_rx.await.map_err(|_| StoreError::SinkClosed)
    }

    pub fn stats(&self) -> SinkStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, op: SinkOp) {
        if self.tx.send(op).is_err() {
            warn!("Write-through worker stopped; mutation will not be persisted");
            self.stats
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .record_failure(StoreError::SinkClosed.to_string());
        }
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Receiving side: applies queued operations to the durable store.
pub struct WriteThroughWorker {
    store: Arc<dyn DurableStore>,
    rx: mpsc::UnboundedReceiver<SinkOp>,
    stats: Arc<Mutex<SinkStats>>,
}

impl WriteThroughWorker {
    /// Runs until shutdown is requested or every handle is dropped.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!(store = self.store.name(), "Write-through worker starting");

        while let Some(op) = self.rx.recv().await {
            match op {
                SinkOp::ReplaceAll {
                    collection,
                    records,
                } => {
                    let count = records.len();
                    let result = self.store.replace_all(collection, records).await;
                    self.record(result, || format!("replace_all({collection}, {count})"));
                }

                SinkOp::SetMeta { key, value } => {
                    let result = self.store.set_meta(&key, value).await;
                    self.record(result, || format!("set_meta({key})"));
                }

                SinkOp::Flush(done) => {
                    let _ = done.send(());
                }

                SinkOp::Shutdown(done) => {
                    info!("Write-through worker shutting down");
                    let _ = done.send(());
                    break;
                }
            }
        }

        info!("Write-through worker stopped");
    }

    fn record(&self, result: StoreResult<()>, describe: impl FnOnce() -> String) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);

        match result {
            Ok(()) => stats.applied += 1,
            Err(e) => {
                let op = describe();
                error!(op = %op, error = %e, "Write-through failed; in-memory state remains authoritative");
                stats.record_failure(format!("{op}: {e}"));
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_ops_applied_in_order() {
        let store = Arc::new(MemoryStore::new());
        let sink = WriteThrough::spawn(store.clone());

        sink.replace_all(Collection::Products, vec![json!({"id": "1"})]);
        sink.replace_all(Collection::Products, vec![json!({"id": "1"}), json!({"id": "2"})]);
        sink.flush().await.unwrap();

        assert_eq!(store.records(Collection::Products).len(), 2);
        assert_eq!(store.replace_count(), 2);
        assert_eq!(sink.stats().applied, 2);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_retried() {
        let store = Arc::new(MemoryStore::new());
        let sink = WriteThrough::spawn(store.clone());

        store.set_failing(true);
        sink.replace_all(Collection::Invoices, vec![json!({"id": "1"})]);
        sink.flush().await.unwrap();
        store.set_failing(false);
        sink.flush().await.unwrap();

        let stats = sink.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.applied, 0);
        assert!(stats.last_error.unwrap().contains("invoices"));
        assert!(store.records(Collection::Invoices).is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_drains_then_stops() {
        let store = Arc::new(MemoryStore::new());
        let sink = WriteThrough::spawn(store.clone());

        sink.set_meta("first_run_complete", "true".into());
        sink.shutdown().await.unwrap();

        assert_eq!(
            store.get_meta("first_run_complete").await.unwrap().as_deref(),
            Some("true")
        );

        // Give the worker a moment to drop its receiver.
        tokio::task::yield_now().await;
        sink.replace_all(Collection::Products, vec![]);
        assert!(sink.flush().await.is_err());
    }
}
