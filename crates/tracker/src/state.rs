//! The single authoritative client-side state container.
//!
//! Each feed owns one slice. Applying an [`Action`] from one feed never
//! touches another feed's slice; derived values are recomputed on demand.

use chrono::NaiveDateTime;
use storage::models::{ChecklistState, EventRecord, Group, HistoryRecord, RecordId};
use tracing::debug;

use crate::canonical::{CanonicalEvent, CanonicalHistory, Normalize};
use crate::catalog::ChecklistCatalog;
use crate::derive::{self, ChecklistProgress, Countdown, MedalTally, YearStatistics};

#[derive(Debug, Clone)]
pub enum Action {
    GroupSnapshot(Option<Group>),
    EventsSnapshot(Vec<EventRecord>),
    HistorySnapshot(Vec<HistoryRecord>),
    /// Local echo of a checklist toggle until the next group snapshot.
    ChecklistOptimistic { key: String, value: bool },
    SelectParticipant(Option<String>),
    Reset,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    /// True until the first group document snapshot arrives.
    pub loading: bool,
    /// False when the store reported the group document as missing.
    pub group_exists: bool,
    pub members: Vec<String>,
    pub roster: Vec<String>,
    pub checklist: ChecklistState,
    pub events: Vec<CanonicalEvent>,
    pub history: Vec<CanonicalHistory>,
    pub selected_participant: Option<String>,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            loading: true,
            group_exists: false,
            members: Vec::new(),
            roster: Vec::new(),
            checklist: ChecklistState::new(),
            events: Vec::new(),
            history: Vec::new(),
            selected_participant: None,
        }
    }
}

impl TrackerState {
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::GroupSnapshot(group) => {
                let group = match group {
                    Some(group) => {
                        self.group_exists = true;
                        group
                    }
                    None => {
                        self.group_exists = false;
                        Group::default()
                    }
                };
                debug!(
                    roster = group.roster.len(),
                    checks = group.checklist_state.len(),
                    "group snapshot applied"
                );
                self.members = group.members;
                self.roster = group.roster;
                self.checklist = group.checklist_state;
                self.loading = false;

                if let Some(selected) = &self.selected_participant
                    && !self.roster.contains(selected)
                {
                    self.selected_participant = None;
                }
            }
            Action::EventsSnapshot(records) => {
                debug!(count = records.len(), "events snapshot applied");
                self.events = records.iter().map(|r| r.normalize()).collect();
            }
            Action::HistorySnapshot(records) => {
                debug!(count = records.len(), "history snapshot applied");
                self.history = records.iter().map(|r| r.normalize()).collect();
            }
            Action::ChecklistOptimistic { key, value } => {
                self.checklist.insert(key, value);
            }
            Action::SelectParticipant(participant) => {
                self.selected_participant =
                    participant.filter(|name| self.roster.contains(name));
            }
            Action::Reset => *self = Self::default(),
        }
    }

    pub fn event(&self, id: &RecordId) -> Option<&CanonicalEvent> {
        self.events.iter().find(|e| e.id.as_ref() == Some(id))
    }

    pub fn upcoming_events(&self, now: NaiveDateTime) -> Vec<&CanonicalEvent> {
        derive::partition_events(&self.events, now).0
    }

    pub fn past_events(&self, now: NaiveDateTime) -> Vec<&CanonicalEvent> {
        derive::partition_events(&self.events, now).1
    }

    pub fn countdown(&self, event: &CanonicalEvent, now: NaiveDateTime) -> Option<Countdown> {
        derive::countdown(event, now)
    }

    pub fn progress(&self, event_id: &RecordId, catalog: &ChecklistCatalog) -> ChecklistProgress {
        derive::checklist_progress(event_id, &self.checklist, catalog)
    }

    /// History narrowed to the selected participant, or all of it.
    pub fn visible_history(&self) -> Vec<&CanonicalHistory> {
        match &self.selected_participant {
            Some(name) => derive::history_for_participant(&self.history, name),
            None => self.history.iter().collect(),
        }
    }

    pub fn yearly_statistics(&self) -> Vec<YearStatistics> {
        derive::yearly_statistics(&self.history)
    }

    pub fn medal_tally(&self) -> MedalTally {
        derive::medal_tally(&self.history)
    }
}
