use async_trait::async_trait;
use std::fmt;
use tokio::sync::watch;
use tracing::debug;

use crate::error::Result;
use crate::models::{EventRecord, Group, GroupId, GroupPatch, HistoryRecord, RecordId};

/// The three live channels a group exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Group,
    Events,
    History,
}

impl Feed {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Events => "events",
            Self::History => "history",
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract with the remote document store.
///
/// Collection updates are whole-document replacements. Feeds deliver full
/// snapshots: events ordered by date ascending, history by date descending.
/// Failures are returned as-is; nothing here retries.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    async fn subscribe_group(&self, group_id: &GroupId) -> Result<Subscription<Option<Group>>>;

    async fn subscribe_events(&self, group_id: &GroupId) -> Result<Subscription<Vec<EventRecord>>>;

    async fn subscribe_history(
        &self,
        group_id: &GroupId,
    ) -> Result<Subscription<Vec<HistoryRecord>>>;

    /// Add `member` to the group, founding it first when `create_if_missing`.
    async fn join_group(
        &self,
        group_id: &GroupId,
        member: &str,
        create_if_missing: bool,
    ) -> Result<Group>;

    async fn write_group(&self, group_id: &GroupId, patch: &GroupPatch) -> Result<()>;

    async fn create_event(&self, group_id: &GroupId, record: &EventRecord) -> Result<RecordId>;

    async fn replace_event(
        &self,
        group_id: &GroupId,
        id: &RecordId,
        record: &EventRecord,
    ) -> Result<()>;

    async fn delete_event(&self, group_id: &GroupId, id: &RecordId) -> Result<()>;

    async fn create_history(&self, group_id: &GroupId, record: &HistoryRecord)
    -> Result<RecordId>;

    async fn replace_history(
        &self,
        group_id: &GroupId,
        id: &RecordId,
        record: &HistoryRecord,
    ) -> Result<()>;

    async fn delete_history(&self, group_id: &GroupId, id: &RecordId) -> Result<()>;
}

/// A live view on one feed.
///
/// The first call to [`Subscription::next`] yields the snapshot current at
/// subscribe time; later calls wait for the next change. Intermediate
/// snapshots may be skipped since every snapshot is complete.
pub struct Subscription<T> {
    feed: Feed,
    receiver: Option<watch::Receiver<T>>,
    initial_pending: bool,
}

impl<T: Clone> Subscription<T> {
    pub fn new(feed: Feed, receiver: watch::Receiver<T>) -> Self {
        Self {
            feed,
            receiver: Some(receiver),
            initial_pending: true,
        }
    }

    pub fn feed(&self) -> Feed {
        self.feed
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    /// Wait for the next snapshot. `None` once unsubscribed or the store
    /// closed the feed.
    pub async fn next(&mut self) -> Option<T> {
        let receiver = self.receiver.as_mut()?;

        if self.initial_pending {
            self.initial_pending = false;
            return Some(receiver.borrow_and_update().clone());
        }

        let changed = receiver.changed().await;
        match changed {
            Ok(()) => Some(receiver.borrow_and_update().clone()),
            Err(_) => {
                debug!(feed = %self.feed, "feed closed by store");
                self.receiver = None;
                None
            }
        }
    }

    /// Take a snapshot only if one is waiting.
    pub fn try_next(&mut self) -> Option<T> {
        let receiver = self.receiver.as_mut()?;

        if self.initial_pending {
            self.initial_pending = false;
            return Some(receiver.borrow_and_update().clone());
        }

        let changed = receiver.has_changed();
        match changed {
            Ok(true) => Some(receiver.borrow_and_update().clone()),
            Ok(false) => None,
            Err(_) => {
                self.receiver = None;
                None
            }
        }
    }

    /// Release the listener. Safe to call any number of times.
    pub fn unsubscribe(&mut self) {
        if self.receiver.take().is_some() {
            debug!(feed = %self.feed, "unsubscribed");
        }
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("feed", &self.feed)
            .field("active", &self.receiver.is_some())
            .finish()
    }
}
