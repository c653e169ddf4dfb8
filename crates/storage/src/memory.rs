use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::gateway::{Feed, StoreGateway, Subscription};
use crate::models::{
    EventRecord, Group, GroupId, GroupPatch, GroupSnapshot, HistoryRecord, RecordId, StoredRecord,
};

/// Store operations that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Subscribe,
    JoinGroup,
    WriteGroup,
    CreateEvent,
    ReplaceEvent,
    DeleteEvent,
    CreateHistory,
    ReplaceHistory,
    DeleteHistory,
}

struct GroupSlot {
    group: Option<Group>,
    events: BTreeMap<RecordId, EventRecord>,
    history: BTreeMap<RecordId, HistoryRecord>,
    group_tx: watch::Sender<Option<Group>>,
    events_tx: watch::Sender<Vec<EventRecord>>,
    history_tx: watch::Sender<Vec<HistoryRecord>>,
}

impl GroupSlot {
    fn new() -> Self {
        let (group_tx, _) = watch::channel(None);
        let (events_tx, _) = watch::channel(Vec::new());
        let (history_tx, _) = watch::channel(Vec::new());

        Self {
            group: None,
            events: BTreeMap::new(),
            history: BTreeMap::new(),
            group_tx,
            events_tx,
            history_tx,
        }
    }

    fn require_group(&mut self) -> Result<&mut Group> {
        self.group.as_mut().ok_or(StorageError::NotFound)
    }

    fn publish_group(&self) {
        self.group_tx.send_replace(self.group.clone());
    }

    fn publish_events(&self) {
        let mut events = with_ids(&self.events);
        events.sort_by(|a, b| {
            a.details
                .date
                .cmp(&b.details.date)
                .then_with(|| a.id.cmp(&b.id))
        });
        self.events_tx.send_replace(events);
    }

    fn publish_history(&self) {
        let mut history = with_ids(&self.history);
        history.sort_by(|a, b| {
            b.details
                .date
                .cmp(&a.details.date)
                .then_with(|| a.id.cmp(&b.id))
        });
        self.history_tx.send_replace(history);
    }
}

fn with_ids<R: StoredRecord>(records: &BTreeMap<RecordId, R>) -> Vec<R> {
    records
        .iter()
        .map(|(id, record)| {
            let mut record = record.clone();
            record.set_id(Some(id.clone()));
            record
        })
        .collect()
}

fn without_id<R: StoredRecord>(record: &R) -> R {
    let mut body = record.clone();
    body.set_id(None);
    body
}

/// In-process document store with live feeds.
///
/// Every mutation republishes the affected feed to all current subscribers,
/// including the writer. Record replacement upserts and deletion of a missing
/// record succeeds, matching document-store semantics.
pub struct MemoryStore {
    slots: Mutex<HashMap<GroupId, GroupSlot>>,
    faults: Mutex<HashSet<StoreOperation>>,
    offline: Mutex<bool>,
    read_only: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            faults: Mutex::new(HashSet::new()),
            offline: Mutex::new(false),
            read_only: Mutex::new(false),
        }
    }

    /// Build a store holding one group loaded from a snapshot. Records without
    /// an id get a generated one.
    pub fn seeded(group_id: &GroupId, snapshot: GroupSnapshot) -> Result<Self> {
        let store = Self::new();
        {
            let mut slots = store.lock_slots()?;
            let slot = slots.entry(group_id.clone()).or_insert_with(GroupSlot::new);
            slot.group = Some(snapshot.group);

            for record in snapshot.events {
                let id = record.id.clone().unwrap_or_else(RecordId::generate);
                slot.events.insert(id, without_id(&record));
            }
            for record in snapshot.history {
                let id = record.id.clone().unwrap_or_else(RecordId::generate);
                slot.history.insert(id, without_id(&record));
            }

            slot.publish_group();
            slot.publish_events();
            slot.publish_history();

            info!(
                group_id = %group_id,
                events = slot.events.len(),
                history = slot.history.len(),
                "seeded store from snapshot"
            );
        }
        Ok(store)
    }

    /// Dump one group, with record ids attached.
    pub fn snapshot(&self, group_id: &GroupId) -> Result<GroupSnapshot> {
        let slots = self.lock_slots()?;
        let slot = slots.get(group_id).ok_or(StorageError::NotFound)?;

        Ok(GroupSnapshot {
            group: slot.group.clone().ok_or(StorageError::NotFound)?,
            events: slot.events_tx.borrow().clone(),
            history: slot.history_tx.borrow().clone(),
        })
    }

    /// Make the next call of `operation` fail with [`StorageError::Unavailable`].
    pub fn fail_next(&self, operation: StoreOperation) {
        if let Ok(mut faults) = self.faults.lock() {
            faults.insert(operation);
        }
    }

    /// While offline every operation fails with [`StorageError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut flag) = self.offline.lock() {
            *flag = offline;
        }
    }

    /// While read-only, subscriptions still deliver but every write fails with
    /// [`StorageError::PermissionDenied`].
    pub fn set_read_only(&self, read_only: bool) {
        if let Ok(mut flag) = self.read_only.lock() {
            *flag = read_only;
        }
    }

    /// Number of live listeners on one feed of a group.
    pub fn listener_count(&self, group_id: &GroupId, feed: Feed) -> usize {
        let Ok(slots) = self.slots.lock() else {
            return 0;
        };
        slots.get(group_id).map_or(0, |slot| match feed {
            Feed::Group => slot.group_tx.receiver_count(),
            Feed::Events => slot.events_tx.receiver_count(),
            Feed::History => slot.history_tx.receiver_count(),
        })
    }

    fn lock_slots(&self) -> Result<MutexGuard<'_, HashMap<GroupId, GroupSlot>>> {
        self.slots
            .lock()
            .map_err(|_| StorageError::Unavailable("store lock poisoned".to_string()))
    }

    fn check(&self, operation: StoreOperation) -> Result<()> {
        let offline = self.offline.lock().map(|flag| *flag).unwrap_or(false);
        if offline {
            return Err(StorageError::Unavailable("store is offline".to_string()));
        }

        let read_only = self.read_only.lock().map(|flag| *flag).unwrap_or(false);
        if read_only && operation != StoreOperation::Subscribe {
            return Err(StorageError::PermissionDenied(format!(
                "{:?} not allowed on a read-only store",
                operation
            )));
        }

        let injected = self
            .faults
            .lock()
            .map(|mut faults| faults.remove(&operation))
            .unwrap_or(false);
        if injected {
            debug!(?operation, "injected failure");
            return Err(StorageError::Unavailable(format!(
                "injected failure on {:?}",
                operation
            )));
        }

        Ok(())
    }

    fn with_slot<T>(
        &self,
        operation: StoreOperation,
        group_id: &GroupId,
        f: impl FnOnce(&mut GroupSlot) -> Result<T>,
    ) -> Result<T> {
        self.check(operation)?;
        let mut slots = self.lock_slots()?;
        let slot = slots.entry(group_id.clone()).or_insert_with(GroupSlot::new);
        f(slot)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn subscribe_group(&self, group_id: &GroupId) -> Result<Subscription<Option<Group>>> {
        self.with_slot(StoreOperation::Subscribe, group_id, |slot| {
            Ok(Subscription::new(Feed::Group, slot.group_tx.subscribe()))
        })
    }

    async fn subscribe_events(&self, group_id: &GroupId) -> Result<Subscription<Vec<EventRecord>>> {
        self.with_slot(StoreOperation::Subscribe, group_id, |slot| {
            Ok(Subscription::new(Feed::Events, slot.events_tx.subscribe()))
        })
    }

    async fn subscribe_history(
        &self,
        group_id: &GroupId,
    ) -> Result<Subscription<Vec<HistoryRecord>>> {
        self.with_slot(StoreOperation::Subscribe, group_id, |slot| {
            Ok(Subscription::new(Feed::History, slot.history_tx.subscribe()))
        })
    }

    async fn join_group(
        &self,
        group_id: &GroupId,
        member: &str,
        create_if_missing: bool,
    ) -> Result<Group> {
        self.with_slot(StoreOperation::JoinGroup, group_id, |slot| {
            if slot.group.is_none() {
                if !create_if_missing {
                    return Err(StorageError::NotFound);
                }
                info!(group_id = %group_id, "founding group");
                slot.group = Some(Group::founded_by(member));
            } else if let Some(group) = slot.group.as_mut() {
                group.apply(&GroupPatch::add_member(member));
            }
            slot.publish_group();
            slot.group.clone().ok_or(StorageError::NotFound)
        })
    }

    async fn write_group(&self, group_id: &GroupId, patch: &GroupPatch) -> Result<()> {
        self.with_slot(StoreOperation::WriteGroup, group_id, |slot| {
            slot.require_group()?.apply(patch);
            slot.publish_group();
            Ok(())
        })
    }

    async fn create_event(&self, group_id: &GroupId, record: &EventRecord) -> Result<RecordId> {
        self.with_slot(StoreOperation::CreateEvent, group_id, |slot| {
            slot.require_group()?;
            let id = RecordId::generate();
            slot.events.insert(id.clone(), without_id(record));
            slot.publish_events();
            Ok(id)
        })
    }

    async fn replace_event(
        &self,
        group_id: &GroupId,
        id: &RecordId,
        record: &EventRecord,
    ) -> Result<()> {
        self.with_slot(StoreOperation::ReplaceEvent, group_id, |slot| {
            slot.require_group()?;
            slot.events.insert(id.clone(), without_id(record));
            slot.publish_events();
            Ok(())
        })
    }

    async fn delete_event(&self, group_id: &GroupId, id: &RecordId) -> Result<()> {
        self.with_slot(StoreOperation::DeleteEvent, group_id, |slot| {
            slot.require_group()?;
            if slot.events.remove(id).is_some() {
                slot.publish_events();
            }
            Ok(())
        })
    }

    async fn create_history(
        &self,
        group_id: &GroupId,
        record: &HistoryRecord,
    ) -> Result<RecordId> {
        self.with_slot(StoreOperation::CreateHistory, group_id, |slot| {
            slot.require_group()?;
            let id = RecordId::generate();
            slot.history.insert(id.clone(), without_id(record));
            slot.publish_history();
            Ok(id)
        })
    }

    async fn replace_history(
        &self,
        group_id: &GroupId,
        id: &RecordId,
        record: &HistoryRecord,
    ) -> Result<()> {
        self.with_slot(StoreOperation::ReplaceHistory, group_id, |slot| {
            slot.require_group()?;
            slot.history.insert(id.clone(), without_id(record));
            slot.publish_history();
            Ok(())
        })
    }

    async fn delete_history(&self, group_id: &GroupId, id: &RecordId) -> Result<()> {
        self.with_slot(StoreOperation::DeleteHistory, group_id, |slot| {
            slot.require_group()?;
            if slot.history.remove(id).is_some() {
                slot.publish_history();
            }
            Ok(())
        })
    }
}
