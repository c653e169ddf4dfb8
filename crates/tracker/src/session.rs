use std::sync::Arc;

use storage::models::{EventRecord, Group, GroupId, HistoryRecord, RecordId};
use storage::{Feed, StoreGateway, Subscription};
use tracing::{debug, error, info};

use crate::config::TrackerConfig;
use crate::coordinator::MutationCoordinator;
use crate::derive::checklist_key;
use crate::error::{Result, TrackerError};
use crate::state::{Action, TrackerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    /// Subscriptions requested; waiting for the first group snapshot.
    Subscribing,
    Live,
    TornDown,
}

struct Feeds {
    group: Subscription<Option<Group>>,
    events: Subscription<Vec<EventRecord>>,
    history: Subscription<Vec<HistoryRecord>>,
}

impl Feeds {
    fn release(&mut self) {
        self.group.unsubscribe();
        self.events.unsubscribe();
        self.history.unsubscribe();
    }
}

/// One client's live view of a group.
///
/// Owns the three feed subscriptions and the [`TrackerState`] they feed.
/// Snapshots are applied one at a time through [`TrackerState::apply`], so
/// the feeds may arrive in any order.
pub struct SyncSession<G: StoreGateway + ?Sized> {
    gateway: Arc<G>,
    config: TrackerConfig,
    group_id: Option<GroupId>,
    feeds: Option<Feeds>,
    state: TrackerState,
    phase: SessionPhase,
}

impl<G: StoreGateway + ?Sized> SyncSession<G> {
    pub fn new(gateway: Arc<G>, config: TrackerConfig) -> Self {
        Self {
            gateway,
            config,
            group_id: None,
            feeds: None,
            state: TrackerState::default(),
            phase: SessionPhase::Uninitialized,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn group_id(&self) -> Option<&GroupId> {
        self.group_id.as_ref()
    }

    /// Release any current subscriptions, then open all three feeds of
    /// `group_id` concurrently.
    ///
    /// On failure the session stays in `Subscribing` with `loading` set; no
    /// reconnect is attempted.
    pub async fn connect(&mut self, group_id: GroupId) -> Result<()> {
        self.teardown();
        self.state.apply(Action::Reset);
        self.phase = SessionPhase::Subscribing;
        self.group_id = Some(group_id.clone());
        info!(group_id = %group_id, "subscribing");

        let opened = tokio::try_join!(
            self.gateway.subscribe_group(&group_id),
            self.gateway.subscribe_events(&group_id),
            self.gateway.subscribe_history(&group_id),
        );

        match opened {
            Ok((group, events, history)) => {
                self.feeds = Some(Feeds {
                    group,
                    events,
                    history,
                });
                Ok(())
            }
            Err(e) => {
                error!(group_id = %group_id, error = %e, "failed to subscribe");
                Err(e.into())
            }
        }
    }

    /// Wait for the next snapshot on any feed and apply it. Returns the feed
    /// it came from, or `None` once every feed has closed.
    pub async fn next_update(&mut self) -> Result<Option<Feed>> {
        let feeds = self.feeds.as_mut().ok_or(TrackerError::NotConnected)?;

        let (feed, action) = tokio::select! {
            Some(group) = feeds.group.next(), if feeds.group.is_active() => {
                (Feed::Group, Action::GroupSnapshot(group))
            }
            Some(events) = feeds.events.next(), if feeds.events.is_active() => {
                (Feed::Events, Action::EventsSnapshot(events))
            }
            Some(history) = feeds.history.next(), if feeds.history.is_active() => {
                (Feed::History, Action::HistorySnapshot(history))
            }
            else => return Ok(None),
        };

        self.apply_snapshot(feed, action);
        Ok(Some(feed))
    }

    /// Apply every snapshot already waiting, without blocking. Returns how
    /// many were applied.
    pub fn drain(&mut self) -> Result<usize> {
        let feeds = self.feeds.as_mut().ok_or(TrackerError::NotConnected)?;

        let mut pending = Vec::new();
        if let Some(group) = feeds.group.try_next() {
            pending.push((Feed::Group, Action::GroupSnapshot(group)));
        }
        if let Some(events) = feeds.events.try_next() {
            pending.push((Feed::Events, Action::EventsSnapshot(events)));
        }
        if let Some(history) = feeds.history.try_next() {
            pending.push((Feed::History, Action::HistorySnapshot(history)));
        }

        let applied = pending.len();
        for (feed, action) in pending {
            self.apply_snapshot(feed, action);
        }
        Ok(applied)
    }

    /// Apply a local action such as a selection change or optimistic echo.
    pub fn dispatch(&mut self, action: Action) {
        self.state.apply(action);
    }

    /// Release all three subscriptions. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if let Some(mut feeds) = self.feeds.take() {
            feeds.release();
            info!(group_id = ?self.group_id, "session torn down");
        }
        if self.phase != SessionPhase::Uninitialized {
            self.phase = SessionPhase::TornDown;
        }
    }

    /// Stop following the group on this client. Nothing in the store changes.
    pub fn leave(&mut self) {
        self.teardown();
        self.state.apply(Action::Reset);
        self.group_id = None;
    }

    pub fn coordinator(&self) -> Result<MutationCoordinator<G>> {
        let group_id = self.group_id.clone().ok_or(TrackerError::NotConnected)?;
        Ok(MutationCoordinator::new(self.gateway.clone(), group_id))
    }

    /// Toggle a checklist item and echo the new value locally before the
    /// store's own snapshot arrives.
    pub async fn toggle_checklist_item(
        &mut self,
        event_id: &RecordId,
        category: &str,
        item: &str,
    ) -> Result<bool> {
        let value = self
            .coordinator()?
            .toggle_checklist_item(&self.state.checklist, event_id, category, item)
            .await?;
        self.dispatch(Action::ChecklistOptimistic {
            key: checklist_key(event_id, category, item),
            value,
        });
        Ok(value)
    }

    fn apply_snapshot(&mut self, feed: Feed, action: Action) {
        debug!(%feed, "snapshot received");
        self.state.apply(action);

        if feed == Feed::Group && self.phase == SessionPhase::Subscribing {
            self.phase = SessionPhase::Live;
            info!(group_id = ?self.group_id, "session live");
        }
    }
}
