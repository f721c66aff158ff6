//! The ordered download queue shared between the engine and background jobs

use crate::queue::item::QueueItem;
use crate::utils::config::PLACEHOLDER_ITEM_SIZE;
use crate::utils::error::TubeQueueError;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// FIFO queue of pending items.
///
/// Cloning gives another handle to the same queue. Every operation takes the
/// lock once, so readers never see a half-applied change.
#[derive(Debug, Clone)]
pub struct DownloadQueue {
    items: Arc<Mutex<VecDeque<QueueItem>>>,
    placeholder_size: u64,
}

impl Default for DownloadQueue {
    fn default() -> Self {
        Self::new(PLACEHOLDER_ITEM_SIZE)
    }
}

impl DownloadQueue {
    /// Create an empty queue; `placeholder_size` is counted for items of unknown size
    pub fn new(placeholder_size: u64) -> Self {
        Self {
            items: Arc::new(Mutex::new(VecDeque::new())),
            placeholder_size,
        }
    }

    /// Add item at the back
    pub async fn append(&self, item: QueueItem) {
        let mut queue = self.items.lock().await;
        debug!("Queued {} ({})", item.title(), item.id());
        queue.push_back(item);
    }

    /// Add several items at the back, keeping their order
    pub async fn append_all(&self, items: Vec<QueueItem>) -> usize {
        let count = items.len();
        let mut queue = self.items.lock().await;
        queue.extend(items);
        info!("Added {} items to queue ({} total)", count, queue.len());
        count
    }

    /// Remove every item whose id is listed; returns how many were removed
    pub async fn remove_ids(&self, ids: &[Uuid]) -> usize {
        self.remove_where(|item| ids.contains(&item.id())).await
    }

    /// Remove every item matching `predicate`
    pub async fn remove_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&QueueItem) -> bool,
    {
        let mut queue = self.items.lock().await;
        let before = queue.len();
        queue.retain(|item| !predicate(item));
        let removed = before - queue.len();
        if removed > 0 {
            info!("Removed {} items from queue", removed);
        }
        removed
    }

    /// Move the item at `from` so that it ends up at position `to` (drag reorder)
    pub async fn move_item(&self, from: usize, to: usize) -> Result<(), TubeQueueError> {
        let mut queue = self.items.lock().await;
        let len = queue.len();
        if from >= len || to >= len {
            return Err(TubeQueueError::Input(format!(
                "Queue position out of range: {} -> {} (queue has {} items)",
                from, to, len
            )));
        }
        if let Some(item) = queue.remove(from) {
            queue.insert(to, item);
        }
        Ok(())
    }

    /// Drop all pending items; returns how many were dropped
    pub async fn clear(&self) -> usize {
        let mut queue = self.items.lock().await;
        let count = queue.len();
        queue.clear();
        info!("Cleared {} items from queue", count);
        count
    }

    pub async fn peek_front(&self) -> Option<QueueItem> {
        self.items.lock().await.front().cloned()
    }

    /// Take the next item to download
    pub async fn pop_front(&self) -> Option<QueueItem> {
        self.items.lock().await.pop_front()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Snapshot of the current order
    pub async fn items(&self) -> Vec<QueueItem> {
        self.items.lock().await.iter().cloned().collect()
    }

    /// Sum of known item sizes, counting the placeholder for items without one
    pub async fn estimated_total_size(&self) -> u64 {
        self.items
            .lock()
            .await
            .iter()
            .map(|item| item.estimated_size().unwrap_or(self.placeholder_size))
            .sum()
    }
}
