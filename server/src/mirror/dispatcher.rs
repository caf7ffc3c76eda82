// server/src/mirror/dispatcher.rs
use log::{debug, warn};
use rocket::serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};

use super::record_mirror::{MirrorError, MirrorRow, RecordMirror};
use crate::record::Record;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const MIRROR_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct MirrorHealth {
    pub configured: bool,
    pub reachable: bool,
    pub rows: Option<usize>,
    pub error: Option<String>,
}

#[derive(Clone)]
struct MirrorQueue {
    mirror: Arc<dyn RecordMirror>,
    sender: Sender<MirrorRow>,
    // Taken by the first forward, which spawns the worker on the runtime
    // it runs in. The node may be built before any runtime exists.
    receiver: Arc<Mutex<Option<Receiver<MirrorRow>>>>,
}

impl MirrorQueue {
    fn new(mirror: Arc<dyn RecordMirror>, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            mirror,
            sender,
            receiver: Arc::new(Mutex::new(Some(receiver))),
        }
    }

    fn ensure_worker(&self) {
        let receiver = match self.receiver.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(receiver) = receiver {
            tokio::spawn(drain(self.mirror.clone(), receiver));
        }
    }

    fn push(&self, row: MirrorRow) {
        match self.sender.try_send(row) {
            Ok(()) => {}
            Err(TrySendError::Full(row)) => warn!(
                "Mirror queue full; dropping record {} for {}",
                row.id,
                self.mirror.describe()
            ),
            Err(TrySendError::Closed(row)) => warn!(
                "Mirror worker stopped; dropping record {} for {}",
                row.id,
                self.mirror.describe()
            ),
        }
    }
}

async fn drain(mirror: Arc<dyn RecordMirror>, mut receiver: Receiver<MirrorRow>) {
    debug!("Mirror worker started for {}", mirror.describe());
    while let Some(row) = receiver.recv().await {
        match mirror.insert_row(&row).await {
            Ok(()) => debug!("Mirrored record {} to {}", row.id, mirror.describe()),
            Err(e) => warn!(
                "Failed to mirror record {} to {}: {}",
                row.id,
                mirror.describe(),
                e
            ),
        }
    }
}

/// Hands written records to the configured mirror without waiting on it.
///
/// Rows go through a bounded queue drained in order by a single worker task;
/// when the queue is full the row is dropped with a warning, and mirror
/// failures are logged and dropped. Callers must not hold the store lock
/// across `forward`.
#[derive(Clone)]
pub struct MirrorDispatcher {
    queue: Option<MirrorQueue>,
}

impl MirrorDispatcher {
    pub fn new(mirror: Option<Arc<dyn RecordMirror>>) -> Self {
        Self::with_capacity(mirror, MIRROR_QUEUE_CAPACITY)
    }

    pub fn with_capacity(mirror: Option<Arc<dyn RecordMirror>>, capacity: usize) -> Self {
        Self {
            queue: mirror.map(|mirror| MirrorQueue::new(mirror, capacity)),
        }
    }

    pub fn disabled() -> Self {
        Self { queue: None }
    }

    pub fn is_configured(&self) -> bool {
        self.queue.is_some()
    }

    pub fn forward(&self, record: &Record) {
        self.forward_all(std::slice::from_ref(record));
    }

    pub fn forward_all(&self, records: &[Record]) {
        let queue = match &self.queue {
            Some(queue) => queue,
            None => return,
        };
        if records.is_empty() {
            return;
        }
        queue.ensure_worker();
        for record in records {
            queue.push(MirrorRow::from_record(record));
        }
    }

    pub async fn fetch_rows(&self) -> Result<Vec<MirrorRow>, MirrorError> {
        let mirror = self
            .queue
            .as_ref()
            .map(|queue| &queue.mirror)
            .ok_or_else(|| MirrorError::Unavailable(String::from("no mirror configured")))?;
        match tokio::time::timeout(PROBE_TIMEOUT, mirror.fetch_rows()).await {
            Ok(result) => result,
            Err(_) => Err(MirrorError::Timeout(PROBE_TIMEOUT.as_millis() as u64)),
        }
    }

    pub async fn probe(&self) -> MirrorHealth {
        if !self.is_configured() {
            return MirrorHealth {
                configured: false,
                reachable: false,
                rows: None,
                error: None,
            };
        }
        match self.fetch_rows().await {
            Ok(rows) => MirrorHealth {
                configured: true,
                reachable: true,
                rows: Some(rows.len()),
                error: None,
            },
            Err(e) => {
                warn!("Mirror health probe failed: {}", e);
                MirrorHealth {
                    configured: true,
                    reachable: false,
                    rows: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
