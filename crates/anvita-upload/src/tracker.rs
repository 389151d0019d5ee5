//! Synthetic upload progress.
//!
//! The transport gives no byte-level progress, so the tracker advances each
//! in-flight upload by a fixed step on a timer, capped below 100 until the
//! transfer actually settles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Highest value synthetic ticks may reach.
pub const SYNTHETIC_CEILING: u8 = 90;

/// Tick cadence and step for one kind of upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSchedule {
    pub interval: Duration,
    pub step: u8,
}

/// Direct uploads (file picker, drag and drop): +10 every 200 ms.
pub const DIRECT_TICKS: TickSchedule = TickSchedule {
    interval: Duration::from_millis(200),
    step: 10,
};

/// Remote-URL uploads: +15 every 300 ms.
pub const REMOTE_TICKS: TickSchedule = TickSchedule {
    interval: Duration::from_millis(300),
    step: 15,
};

const EVENT_CAPACITY: usize = 256;

/// Change to the progress table. `percent` is `None` when the entry was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub id: String,
    pub percent: Option<u8>,
}

/// Owns the progress table: upload id -> percent, one entry per in-flight upload.
pub struct UploadTracker {
    table: Mutex<HashMap<String, u8>>,
    events: broadcast::Sender<ProgressEvent>,
}

impl Default for UploadTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadTracker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            table: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Receives every change made to the table from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    fn publish(&self, id: &str, percent: Option<u8>) {
        // No subscribers is fine.
        let _ = self.events.send(ProgressEvent {
            id: id.to_string(),
            percent,
        });
    }

    /// Registers `id` at 0%.
    pub fn begin(&self, id: &str) {
        {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            table.insert(id.to_string(), 0);
        }
        self.publish(id, Some(0));
    }

    /// Advances `id` by `step`, never past [`SYNTHETIC_CEILING`].
    ///
    /// Returns the new value, or `None` when `id` is not tracked (a late tick
    /// after removal is a no-op).
    pub fn tick(&self, id: &str, step: u8) -> Option<u8> {
        let (value, changed) = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            let current = table.get_mut(id)?;
            if *current >= SYNTHETIC_CEILING {
                (*current, false)
            } else {
                *current = current.saturating_add(step).min(SYNTHETIC_CEILING);
                (*current, true)
            }
        };
        if changed {
            tracing::debug!(upload_id = %id, percent = value, "Progress tick");
            self.publish(id, Some(value));
        }
        Some(value)
    }

    /// Sets `id` to exactly 100%. No-op when `id` is not tracked.
    pub fn complete(&self, id: &str) {
        let updated = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            match table.get_mut(id) {
                Some(value) => {
                    *value = 100;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.publish(id, Some(100));
        }
    }

    /// Deletes the entry for `id`, returning its last value.
    pub fn remove(&self, id: &str) -> Option<u8> {
        let removed = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            table.remove(id)
        };
        if removed.is_some() {
            self.publish(id, None);
        }
        removed
    }

    /// Removes `id` after `grace` so observers can show 100% briefly.
    ///
    /// Callers must have applied `complete(id)` first.
    pub fn schedule_removal(self: &Arc<Self>, id: String, grace: Duration) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            tracker.remove(&id);
        })
    }

    pub fn get(&self, id: &str) -> Option<u8> {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.get(id).copied()
    }

    /// Copy of the current table.
    pub fn snapshot(&self) -> HashMap<String, u8> {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.clone()
    }

    pub fn len(&self) -> usize {
        let table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
