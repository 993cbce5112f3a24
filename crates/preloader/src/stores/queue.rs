#![forbid(unsafe_code)]

use crate::domain::{PreloadItem, Priority, QueueId, ResourceUrl};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use std::cmp::Reverse;

/// One priority bucket of a processing pass, in stable enqueue order.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub priority: Priority,
    pub entries: Vec<(QueueId, PreloadItem)>,
}

/// Pending preload requests in enqueue order.
///
/// Entries stay here while their batch is in flight and are removed by id
/// once they settle.
#[derive(Debug, Default)]
pub struct PreloadQueue {
    items: SlotMap<QueueId, PreloadItem>,
    order: Vec<QueueId>,
    by_url: FxHashMap<ResourceUrl, QueueId>,
}

impl PreloadQueue {
    /// Append an item. Returns `None` when the url is already pending.
    pub fn push(&mut self, item: PreloadItem) -> Option<QueueId> {
        if self.by_url.contains_key(&item.url) {
            return None;
        }
        let url = item.url.clone();
        let id = self.items.insert(item);
        self.order.push(id);
        self.by_url.insert(url, id);
        Some(id)
    }

    pub fn remove(&mut self, id: QueueId) -> Option<PreloadItem> {
        let item = self.items.remove(id)?;
        self.order.retain(|queued| *queued != id);
        self.by_url.remove(&item.url);
        Some(item)
    }

    pub fn get(&self, id: QueueId) -> Option<&PreloadItem> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
        self.by_url.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (QueueId, &PreloadItem)> {
        self.order
            .iter()
            .filter_map(|id| self.items.get(*id).map(|item| (*id, item)))
    }

    /// Snapshot of the current contents, stable-sorted by priority and split
    /// into buckets in processing order (high, medium, low). Empty buckets
    /// are omitted.
    pub fn buckets(&self) -> Vec<Bucket> {
        let mut sorted: Vec<(QueueId, PreloadItem)> = self
            .iter()
            .map(|(id, item)| (id, item.clone()))
            .collect();
        sorted.sort_by_key(|(_, item)| Reverse(item.priority.rank()));

        Priority::ORDERED
            .iter()
            .map(|priority| Bucket {
                priority: *priority,
                entries: sorted
                    .iter()
                    .filter(|(_, item)| item.priority == *priority)
                    .cloned()
                    .collect(),
            })
            .filter(|bucket| !bucket.entries.is_empty())
            .collect()
    }
}
