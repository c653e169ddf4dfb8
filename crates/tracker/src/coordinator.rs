use std::sync::Arc;

use storage::StoreGateway;
use storage::models::{ChecklistState, GroupId, GroupPatch, RecordId};
use tracing::{info, warn};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::canonical::{CanonicalEvent, CanonicalHistory};
use crate::derive::{checklist_key, event_key_prefix};
use crate::error::{Result, TrackerError};
use crate::export::ImagePayload;

/// Turns user intents into store writes for one group.
///
/// Methods that depend on current state (roster, checklist) take it from the
/// caller's [`TrackerState`](crate::state::TrackerState) rather than reading
/// it back from the store. Validation always happens before the first store
/// call. Nothing is retried.
pub struct MutationCoordinator<G: StoreGateway + ?Sized> {
    gateway: Arc<G>,
    group_id: GroupId,
}

impl<G: StoreGateway + ?Sized> MutationCoordinator<G> {
    pub fn new(gateway: Arc<G>, group_id: GroupId) -> Self {
        Self { gateway, group_id }
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    /// Replace the roster. Returns `false` without writing when a name is
    /// blank or appears twice.
    pub async fn set_roster(&self, names: Vec<String>) -> Result<bool> {
        if let Some(reason) = roster_problem(&names) {
            warn!(group_id = %self.group_id, reason, "roster update rejected");
            return Ok(false);
        }

        self.gateway
            .write_group(&self.group_id, &GroupPatch::roster(names))
            .await?;
        Ok(true)
    }

    pub async fn add_participant(&self, roster: &[String], name: &str) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() || roster.iter().any(|n| n == name) {
            warn!(group_id = %self.group_id, name, "participant not added");
            return Ok(false);
        }

        let mut names = roster.to_vec();
        names.push(name.to_string());
        let added = self.set_roster(names).await?;
        if added {
            info!(group_id = %self.group_id, name, "participant added");
        }
        Ok(added)
    }

    /// Drop a participant from the roster. Stored records keep their entries;
    /// readers hide them through the roster filter.
    pub async fn remove_participant(&self, roster: &[String], name: &str) -> Result<bool> {
        if !roster.iter().any(|n| n == name) {
            return Ok(false);
        }

        let names = roster.iter().filter(|n| *n != name).cloned().collect();
        self.gateway
            .write_group(&self.group_id, &GroupPatch::roster(names))
            .await?;
        info!(group_id = %self.group_id, name, "participant removed");
        Ok(true)
    }

    /// Create the event, or replace it whole when `is_edit`.
    pub async fn save_event(&self, event: &CanonicalEvent, is_edit: bool) -> Result<RecordId> {
        event.details.validate()?;
        let record = event.to_record();

        if is_edit {
            let id = require_id(event.id.as_ref())?;
            self.gateway
                .replace_event(&self.group_id, id, &record)
                .await?;
            info!(group_id = %self.group_id, event_id = %id, "event replaced");
            Ok(id.clone())
        } else {
            let id = self.gateway.create_event(&self.group_id, &record).await?;
            info!(group_id = %self.group_id, event_id = %id, "event created");
            Ok(id)
        }
    }

    /// Purge the event's checklist keys, then delete the event. The purge is
    /// by prefix on the stored document, so flags ticked by other clients go
    /// too.
    pub async fn delete_event(&self, id: &RecordId) -> Result<()> {
        self.gateway
            .write_group(&self.group_id, &GroupPatch::clear_prefix(event_key_prefix(id)))
            .await?;

        self.gateway.delete_event(&self.group_id, id).await?;
        info!(group_id = %self.group_id, event_id = %id, "event deleted");
        Ok(())
    }

    pub async fn save_history(&self, history: &CanonicalHistory, is_edit: bool) -> Result<RecordId> {
        history.details.validate()?;
        let record = history.to_record();

        if is_edit {
            let id = require_id(history.id.as_ref())?;
            self.gateway
                .replace_history(&self.group_id, id, &record)
                .await?;
            info!(group_id = %self.group_id, history_id = %id, "history entry replaced");
            Ok(id.clone())
        } else {
            let id = self.gateway.create_history(&self.group_id, &record).await?;
            info!(group_id = %self.group_id, history_id = %id, "history entry created");
            Ok(id)
        }
    }

    pub async fn delete_history(&self, id: &RecordId) -> Result<()> {
        self.gateway.delete_history(&self.group_id, id).await?;
        info!(group_id = %self.group_id, history_id = %id, "history entry deleted");
        Ok(())
    }

    /// Create a history entry seeded from the event, then delete the event.
    ///
    /// The two steps are separate writes. If the second one fails the new
    /// history entry stays and [`TrackerError::PartialMove`] names it; the
    /// event is left in place.
    pub async fn move_event_to_history(&self, event: &CanonicalEvent) -> Result<RecordId> {
        let event_id = require_id(event.id.as_ref())?;
        let seeded = CanonicalHistory::seeded_from(event);
        seeded.details.validate()?;

        let history_id = self
            .gateway
            .create_history(&self.group_id, &seeded.to_record())
            .await?;

        match self.delete_event(event_id).await {
            Ok(()) => {
                info!(
                    group_id = %self.group_id,
                    event_id = %event_id,
                    history_id = %history_id,
                    "event moved to history"
                );
                Ok(history_id)
            }
            Err(TrackerError::Storage(source)) => {
                warn!(
                    group_id = %self.group_id,
                    event_id = %event_id,
                    history_id = %history_id,
                    error = %source,
                    "history entry created but event not deleted"
                );
                Err(TrackerError::PartialMove { history_id, source })
            }
            Err(other) => Err(other),
        }
    }

    /// Flip one checklist flag and return its new value for local echo.
    pub async fn toggle_checklist_item(
        &self,
        checklist: &ChecklistState,
        event_id: &RecordId,
        category: &str,
        item: &str,
    ) -> Result<bool> {
        let key = checklist_key(event_id, category, item);
        let value = !checklist.get(&key).copied().unwrap_or(false);

        self.gateway
            .write_group(&self.group_id, &GroupPatch::check(key, value))
            .await?;
        Ok(value)
    }

    /// Append an already encoded image to a history entry. `photo` must be a
    /// base64 data URL, as produced by [`prepare_photo`](crate::export::prepare_photo).
    pub async fn save_photo(&self, history: &CanonicalHistory, photo: String) -> Result<()> {
        let id = require_id(history.id.as_ref())?;
        ImagePayload::from_data_url(&photo)?;
        let mut updated = history.clone();
        updated.photos.push(photo);

        self.gateway
            .replace_history(&self.group_id, id, &updated.to_record())
            .await?;
        info!(
            group_id = %self.group_id,
            history_id = %id,
            photos = updated.photos.len(),
            "photo added"
        );
        Ok(())
    }

    /// Returns `false` when `index` is out of range.
    pub async fn remove_photo(&self, history: &CanonicalHistory, index: usize) -> Result<bool> {
        let id = require_id(history.id.as_ref())?;
        if index >= history.photos.len() {
            return Ok(false);
        }

        let mut updated = history.clone();
        updated.photos.remove(index);
        self.gateway
            .replace_history(&self.group_id, id, &updated.to_record())
            .await?;
        Ok(true)
    }
}

fn roster_problem(names: &[String]) -> Option<&'static str> {
    if names.iter().any(|n| n.trim().is_empty()) {
        return Some("blank name");
    }
    let mut seen = std::collections::HashSet::new();
    if !names.iter().all(|n| seen.insert(n.as_str())) {
        return Some("duplicate name");
    }
    None
}

fn require_id(id: Option<&RecordId>) -> Result<&RecordId> {
    id.ok_or_else(|| {
        let mut errors = ValidationErrors::new();
        let mut error = ValidationError::new("required");
        error.message = Some("Record has no id".into());
        errors.add("id", error);
        TrackerError::Validation(errors)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{CanonicalDetails, Entry, Normalize, ParticipantEntry};
    use storage::{MemoryStore, StoreOperation};

    async fn setup() -> (Arc<MemoryStore>, MutationCoordinator<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let group_id = GroupId::new("fam-test");
        store
            .join_group(&group_id, "parent@example.com", true)
            .await
            .unwrap();
        let coordinator = MutationCoordinator::new(store.clone(), group_id);
        (store, coordinator)
    }

    fn spring_cup() -> CanonicalEvent {
        let mut details = CanonicalDetails::new("Spring Cup", "2025-04-01");
        details.event_class = "C".to_string();
        details.participant_entries.push(ParticipantEntry::new(
            "Mia",
            vec![Entry::new("C", "Latin").with_disciplines(["Samba", "Jive"])],
        ));
        CanonicalEvent::new(details)
    }

    fn roster(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn checklist(store: &MemoryStore, coordinator: &MutationCoordinator<MemoryStore>) -> ChecklistState {
        store
            .snapshot(coordinator.group_id())
            .unwrap()
            .group
            .checklist_state
    }

    fn keys_with_prefix(state: &ChecklistState, id: &RecordId) -> usize {
        let prefix = event_key_prefix(id);
        state.keys().filter(|key| key.starts_with(&prefix)).count()
    }

    #[tokio::test]
    async fn test_add_participant_rejects_blank_and_duplicate() {
        let (store, coordinator) = setup().await;
        store.set_offline(true);

        assert!(!coordinator.add_participant(&[], "   ").await.unwrap());
        assert!(!coordinator.add_participant(&roster(&["Mia"]), "Mia").await.unwrap());

        store.set_offline(false);
        assert!(coordinator.add_participant(&roster(&["Mia"]), " Leo ").await.unwrap());
        let group = store.snapshot(coordinator.group_id()).unwrap().group;
        assert_eq!(group.roster, roster(&["Mia", "Leo"]));
    }

    #[tokio::test]
    async fn test_set_roster_rejects_duplicates() {
        let (_store, coordinator) = setup().await;

        assert!(!coordinator.set_roster(roster(&["Mia", "Mia"])).await.unwrap());
        assert!(!coordinator.set_roster(roster(&["Mia", ""])).await.unwrap());
        assert!(coordinator.set_roster(roster(&["Mia", "mia"])).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_participant_keeps_records() {
        let (store, coordinator) = setup().await;
        coordinator.set_roster(roster(&["Mia", "Leo"])).await.unwrap();
        coordinator.save_event(&spring_cup(), false).await.unwrap();

        assert!(coordinator.remove_participant(&roster(&["Mia", "Leo"]), "Mia").await.unwrap());
        assert!(!coordinator.remove_participant(&roster(&["Leo"]), "Mia").await.unwrap());

        let snapshot = store.snapshot(coordinator.group_id()).unwrap();
        assert_eq!(snapshot.group.roster, roster(&["Leo"]));
        assert_eq!(snapshot.events[0].details.participant_entries[0].participant, "Mia");
    }

    #[tokio::test]
    async fn test_invalid_event_never_reaches_store() {
        let (store, coordinator) = setup().await;
        store.set_offline(true);

        let blank = CanonicalEvent::new(CanonicalDetails::new("", "2025-04-01"));
        let undated = CanonicalEvent::new(CanonicalDetails::new("Cup", ""));

        assert!(matches!(
            coordinator.save_event(&blank, false).await,
            Err(TrackerError::Validation(_))
        ));
        assert!(matches!(
            coordinator.save_event(&undated, true).await,
            Err(TrackerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_save_event_create_then_replace() {
        let (store, coordinator) = setup().await;

        let id = coordinator.save_event(&spring_cup(), false).await.unwrap();
        let mut edited = spring_cup().with_id(id.clone());
        edited.details.venue = Some("Town Hall".to_string());
        edited.details.participant_entries.clear();
        coordinator.save_event(&edited, true).await.unwrap();

        let events = store.snapshot(coordinator.group_id()).unwrap().events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].normalize(), edited);
    }

    #[tokio::test]
    async fn test_edit_without_id_is_rejected() {
        let (_store, coordinator) = setup().await;

        let result = coordinator.save_event(&spring_cup(), true).await;

        assert!(matches!(result, Err(TrackerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_event_purges_its_keys_only() {
        let (store, coordinator) = setup().await;
        let first = coordinator.save_event(&spring_cup(), false).await.unwrap();
        let second = coordinator.save_event(&spring_cup(), false).await.unwrap();

        for id in [&first, &second] {
            let state = checklist(&store, &coordinator);
            coordinator
                .toggle_checklist_item(&state, id, "Grooming", "Mirror")
                .await
                .unwrap();
        }

        coordinator.delete_event(&first).await.unwrap();

        let snapshot = store.snapshot(coordinator.group_id()).unwrap();
        assert_eq!(keys_with_prefix(&snapshot.group.checklist_state, &first), 0);
        assert_eq!(keys_with_prefix(&snapshot.group.checklist_state, &second), 1);
        assert_eq!(snapshot.events.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_event_purges_keys_ticked_elsewhere() {
        let (store, first) = setup().await;
        let second = MutationCoordinator::new(store.clone(), first.group_id().clone());
        let id = first.save_event(&spring_cup(), false).await.unwrap();
        let seen_by_first = checklist(&store, &first);

        second
            .toggle_checklist_item(&ChecklistState::new(), &id, "Grooming", "Mirror")
            .await
            .unwrap();
        assert!(seen_by_first.is_empty());
        first.delete_event(&id).await.unwrap();

        let snapshot = store.snapshot(first.group_id()).unwrap();
        assert_eq!(keys_with_prefix(&snapshot.group.checklist_state, &id), 0);
        assert!(snapshot.events.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_flips_and_returns_value() {
        let (store, coordinator) = setup().await;
        let id = RecordId::new("e1");

        let on = coordinator
            .toggle_checklist_item(&ChecklistState::new(), &id, "Essentials", "Cash")
            .await
            .unwrap();
        let off = coordinator
            .toggle_checklist_item(&checklist(&store, &coordinator), &id, "Essentials", "Cash")
            .await
            .unwrap();

        assert!(on);
        assert!(!off);
        assert_eq!(checklist(&store, &coordinator).get("e1:Essentials:Cash"), Some(&false));
    }

    #[tokio::test]
    async fn test_concurrent_toggles_on_different_keys_both_land() {
        let (store, first) = setup().await;
        let second = MutationCoordinator::new(store.clone(), first.group_id().clone());
        let id = RecordId::new("e1");
        let stale = ChecklistState::new();

        let (a, b) = tokio::join!(
            first.toggle_checklist_item(&stale, &id, "Grooming", "Mirror"),
            second.toggle_checklist_item(&stale, &id, "Essentials", "Cash"),
        );
        a.unwrap();
        b.unwrap();

        let state = checklist(&store, &first);
        assert_eq!(state.get("e1:Grooming:Mirror"), Some(&true));
        assert_eq!(state.get("e1:Essentials:Cash"), Some(&true));
    }

    #[tokio::test]
    async fn test_move_to_history_seeds_and_deletes() {
        let (store, coordinator) = setup().await;
        let id = coordinator.save_event(&spring_cup(), false).await.unwrap();
        let event = spring_cup().with_id(id.clone());
        coordinator
            .toggle_checklist_item(&ChecklistState::new(), &id, "Grooming", "Mirror")
            .await
            .unwrap();

        let history_id = coordinator.move_event_to_history(&event).await.unwrap();

        let snapshot = store.snapshot(coordinator.group_id()).unwrap();
        assert!(snapshot.events.is_empty());
        assert!(snapshot.group.checklist_state.is_empty());
        let history = snapshot.history[0].normalize();
        assert_eq!(history.id, Some(history_id));
        assert!(history.photos.is_empty());
        let mia = history.details.participant("Mia").unwrap();
        assert!(mia.results.is_empty());
        assert_eq!(mia.entries, event.details.participant_entries[0].entries);
    }

    #[tokio::test]
    async fn test_failed_delete_reports_partial_move() {
        let (store, coordinator) = setup().await;
        let id = coordinator.save_event(&spring_cup(), false).await.unwrap();
        let event = spring_cup().with_id(id);
        store.fail_next(StoreOperation::DeleteEvent);

        let result = coordinator.move_event_to_history(&event).await;

        let history_id = match result {
            Err(TrackerError::PartialMove { history_id, .. }) => history_id,
            other => panic!("expected partial move, got {other:?}"),
        };
        let snapshot = store.snapshot(coordinator.group_id()).unwrap();
        assert_eq!(snapshot.events.len(), 1);
        assert_eq!(snapshot.history[0].id, Some(history_id));
    }

    #[tokio::test]
    async fn test_failed_create_leaves_event() {
        let (store, coordinator) = setup().await;
        let id = coordinator.save_event(&spring_cup(), false).await.unwrap();
        store.fail_next(StoreOperation::CreateHistory);

        let result = coordinator
            .move_event_to_history(&spring_cup().with_id(id))
            .await;

        assert!(matches!(result, Err(TrackerError::Storage(_))));
        let snapshot = store.snapshot(coordinator.group_id()).unwrap();
        assert_eq!(snapshot.events.len(), 1);
        assert!(snapshot.history.is_empty());
    }

    #[tokio::test]
    async fn test_photos_append_and_remove() {
        let (store, coordinator) = setup().await;
        let seeded = CanonicalHistory::seeded_from(&spring_cup());
        let id = coordinator.save_history(&seeded, false).await.unwrap();
        let history = seeded.with_id(id);

        coordinator
            .save_photo(&history, "data:image/jpeg;base64,AAAA".to_string())
            .await
            .unwrap();
        let stored = store.snapshot(coordinator.group_id()).unwrap().history[0].normalize();
        assert_eq!(stored.photos.len(), 1);

        assert!(!coordinator.remove_photo(&stored, 3).await.unwrap());
        assert!(coordinator.remove_photo(&stored, 0).await.unwrap());
        let stored = store.snapshot(coordinator.group_id()).unwrap().history[0].normalize();
        assert!(stored.photos.is_empty());
    }

    #[tokio::test]
    async fn test_denied_write_is_not_retryable() {
        let (store, coordinator) = setup().await;
        store.set_read_only(true);

        let result = coordinator
            .toggle_checklist_item(&ChecklistState::new(), &RecordId::new("e1"), "Essentials", "Cash")
            .await;

        match result {
            Err(TrackerError::Storage(error)) => {
                assert!(matches!(error, storage::StorageError::PermissionDenied(_)));
                assert!(!error.is_transient());
            }
            other => panic!("expected permission error, got {other:?}"),
        }
        assert!(checklist(&store, &coordinator).is_empty());
    }

    #[tokio::test]
    async fn test_photo_must_be_data_url() {
        let (store, coordinator) = setup().await;
        let seeded = CanonicalHistory::seeded_from(&spring_cup());
        let id = coordinator.save_history(&seeded, false).await.unwrap();
        store.set_offline(true);

        let result = coordinator
            .save_photo(&seeded.with_id(id), "https://example.com/a.jpg".to_string())
            .await;

        assert!(matches!(result, Err(TrackerError::Image(_))));
    }

    #[tokio::test]
    async fn test_store_failure_is_surfaced() {
        let (store, coordinator) = setup().await;
        let seeded = CanonicalHistory::seeded_from(&spring_cup());
        let id = coordinator.save_history(&seeded, false).await.unwrap();
        store.fail_next(StoreOperation::DeleteHistory);

        assert!(matches!(
            coordinator.delete_history(&id).await,
            Err(TrackerError::Storage(_))
        ));
        coordinator.delete_history(&id).await.unwrap();
        assert!(store.snapshot(coordinator.group_id()).unwrap().history.is_empty());
    }
}
