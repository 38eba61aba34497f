//! Background persistence with per-project write ordering
//!
//! Every project id owns a FIFO queue drained by its own task, so saves for
//! one project land in the order they were issued while other projects are
//! written independently. Each queued save carries a version stamp; when a
//! newer save for the same id is already queued the older one is skipped.
//! Deleting a project retires its queue; a later queue for the same id waits
//! for the retired one to finish before writing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info};

use super::{ProjectStore, StoreError};
use crate::core::model::Project;

/// Outcome of a background write, drained by the UI every frame
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceEvent {
    Saved { id: String },
    Deleted { id: String },
    Cleared,
    Failed { id: String, error: String },
}

enum WriteCommand {
    Put { project: Project, version: u64 },
    Delete { id: String, version: u64 },
    Barrier(oneshot::Sender<()>),
}

/// Handle to one project's queue
struct ProjectQueue {
    tx: mpsc::UnboundedSender<WriteCommand>,
    latest: Arc<AtomicU64>,
    /// Flips to true once the drain task has exited
    closed: watch::Receiver<bool>,
}

struct QueueState {
    id: String,
    store: Arc<dyn ProjectStore>,
    latest: Arc<AtomicU64>,
    events: mpsc::UnboundedSender<PersistenceEvent>,
    closed: watch::Sender<bool>,
}

impl QueueState {
    async fn run(
        self,
        mut rx: mpsc::UnboundedReceiver<WriteCommand>,
        previous: Option<watch::Receiver<bool>>,
    ) {
        if let Some(mut previous) = previous {
            let _ = previous.wait_for(|closed| *closed).await;
        }
        debug!("Write queue started for project {}", self.id);

        while let Some(cmd) = rx.recv().await {
            match cmd {
                WriteCommand::Put { project, version } => {
                    if version < self.latest.load(Ordering::Acquire) {
                        debug!("Skipping superseded save v{} of {}", version, self.id);
                        continue;
                    }
                    let store = Arc::clone(&self.store);
                    let result = blocking(move || store.put(&project)).await;
                    self.report(result, PersistenceEvent::Saved { id: self.id.clone() });
                }
                WriteCommand::Delete { id, version } => {
                    if version < self.latest.load(Ordering::Acquire) {
                        debug!("Skipping superseded delete v{} of {}", version, id);
                        continue;
                    }
                    let store = Arc::clone(&self.store);
                    let target = id.clone();
                    let result = blocking(move || store.delete(&target)).await;
                    self.report(result, PersistenceEvent::Deleted { id });
                }
                WriteCommand::Barrier(done) => {
                    let _ = done.send(());
                }
            }
        }

        debug!("Write queue closed for project {}", self.id);
        let _ = self.closed.send(true);
    }

    fn report(&self, result: Result<(), StoreError>, success: PersistenceEvent) {
        let event = match result {
            Ok(()) => success,
            Err(e) => {
                error!("Failed to persist project {}: {}", self.id, e);
                PersistenceEvent::Failed {
                    id: self.id.clone(),
                    error: e.to_string(),
                }
            }
        };
        let _ = self.events.send(event);
    }
}

/// Run a store call off the async workers
async fn blocking<F>(call: F) -> Result<(), StoreError>
where
    F: FnOnce() -> Result<(), StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
}

/// Queues project writes onto a tokio runtime
pub struct PersistenceWriter {
    runtime: Handle,
    store: Arc<dyn ProjectStore>,
    queues: HashMap<String, ProjectQueue>,
    /// Queues of deleted projects that may still be draining
    retired: HashMap<String, watch::Receiver<bool>>,
    next_version: u64,
    events: mpsc::UnboundedSender<PersistenceEvent>,
}

impl PersistenceWriter {
    /// Create a writer and the receiving end of its event channel
    pub fn new(
        runtime: Handle,
        store: Arc<dyn ProjectStore>,
    ) -> (Self, mpsc::UnboundedReceiver<PersistenceEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let writer = Self {
            runtime,
            store,
            queues: HashMap::new(),
            retired: HashMap::new(),
            next_version: 1,
            events,
        };
        (writer, rx)
    }

    fn queue(&mut self, id: &str) -> &ProjectQueue {
        let runtime = &self.runtime;
        let store = &self.store;
        let events = &self.events;
        let retired = &mut self.retired;
        self.queues.entry(id.to_string()).or_insert_with(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            let (closed_tx, closed) = watch::channel(false);
            let latest = Arc::new(AtomicU64::new(0));
            let state = QueueState {
                id: id.to_string(),
                store: Arc::clone(store),
                latest: Arc::clone(&latest),
                events: events.clone(),
                closed: closed_tx,
            };
            runtime.spawn(state.run(rx, retired.remove(id)));
            ProjectQueue { tx, latest, closed }
        })
    }

    fn stamp(&mut self) -> u64 {
        let version = self.next_version;
        self.next_version += 1;
        version
    }

    fn enqueue(&mut self, id: &str, version: u64, cmd: WriteCommand) {
        let queue = self.queue(id);
        queue.latest.store(version, Ordering::Release);
        if queue.tx.send(cmd).is_err() {
            error!("Write queue for project {} is gone", id);
            let _ = self.events.send(PersistenceEvent::Failed {
                id: id.to_string(),
                error: "write queue closed".to_string(),
            });
        }
    }

    /// Queue a full save of `project`
    pub fn save(&mut self, project: &Project) {
        let version = self.stamp();
        debug!("Queue save v{} of {}", version, project.id);
        self.enqueue(
            &project.id,
            version,
            WriteCommand::Put {
                project: project.clone(),
                version,
            },
        );
    }

    /// Queue removal of a project's record
    pub fn delete(&mut self, id: &str) {
        let version = self.stamp();
        debug!("Queue delete v{} of {}", version, id);
        self.enqueue(
            id,
            version,
            WriteCommand::Delete {
                id: id.to_string(),
                version,
            },
        );

        // Dropping the sender lets the drain task finish the delete and exit.
        if let Some(queue) = self.queues.remove(id) {
            self.retired.retain(|_, closed| !*closed.borrow());
            self.retired.insert(id.to_string(), queue.closed);
        }
    }

    /// Wait until every write queued so far has finished
    pub async fn flush(&self) {
        let mut barriers = Vec::with_capacity(self.queues.len());
        for queue in self.queues.values() {
            let (done, wait) = oneshot::channel();
            if queue.tx.send(WriteCommand::Barrier(done)).is_ok() {
                barriers.push(wait);
            }
        }
        for wait in barriers {
            let _ = wait.await;
        }
        for closed in self.retired.values() {
            let _ = closed.clone().wait_for(|closed| *closed).await;
        }
    }

    /// Drain pending writes, then remove every stored record
    pub async fn clear(&mut self) -> Result<(), StoreError> {
        self.flush().await;
        // Dropping the senders ends the drain tasks.
        self.queues.clear();
        self.retired.clear();

        let store = Arc::clone(&self.store);
        match blocking(move || store.clear()).await {
            Ok(()) => {
                info!("Cleared project store");
                let _ = self.events.send(PersistenceEvent::Cleared);
                Ok(())
            }
            Err(e) => {
                error!("Failed to clear project store: {}", e);
                Err(e)
            }
        }
    }
}
