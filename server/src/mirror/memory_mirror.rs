// server/src/mirror/memory_mirror.rs
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::record_mirror::{MirrorError, MirrorRow, RecordMirror};

/// In-process mirror that keeps every row it receives.
///
/// Used with `--use-memory-mirror` and as a capturing fake in tests. It can
/// be made slow (`with_delay`) or made to reject writes (`set_failing`).
pub struct MemoryMirror {
    rows: Mutex<Vec<MirrorRow>>,
    delay: Option<Duration>,
    failing: AtomicBool,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            delay: None,
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn rows(&self) -> Vec<MirrorRow> {
        self.rows.lock().await.clone()
    }

    fn check_available(&self) -> Result<(), MirrorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MirrorError::Unavailable(String::from(
                "memory mirror set to fail",
            )));
        }
        Ok(())
    }
}

impl Default for MemoryMirror {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordMirror for MemoryMirror {
    async fn insert_row(&self, row: &MirrorRow) -> Result<(), MirrorError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.check_available()?;
        self.rows.lock().await.push(row.clone());
        Ok(())
    }

    async fn fetch_rows(&self) -> Result<Vec<MirrorRow>, MirrorError> {
        self.check_available()?;
        Ok(self.rows().await)
    }

    fn describe(&self) -> String {
        String::from("in-memory table")
    }
}
