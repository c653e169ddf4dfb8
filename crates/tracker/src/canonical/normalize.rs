use storage::models::{
    EventRecord, HistoryRecord, RecordDetails, StoredEntry, StoredParticipantEntry,
};

use super::models::{CanonicalDetails, CanonicalEvent, CanonicalHistory, Entry, ParticipantEntry};

/// Conversion of any stored or canonical record into its canonical form.
///
/// Never fails: every shape that was ever written must stay readable.
/// Canonical input is returned unchanged, so `x.normalize().normalize()`
/// equals `x.normalize()`.
pub trait Normalize {
    type Canonical;

    fn normalize(&self) -> Self::Canonical;
}

impl Normalize for EventRecord {
    type Canonical = CanonicalEvent;

    fn normalize(&self) -> CanonicalEvent {
        CanonicalEvent {
            id: self.id.clone(),
            details: normalize_details(&self.details),
        }
    }
}

impl Normalize for HistoryRecord {
    type Canonical = CanonicalHistory;

    fn normalize(&self) -> CanonicalHistory {
        CanonicalHistory {
            id: self.id.clone(),
            details: normalize_details(&self.details),
            photos: self.photos.clone(),
        }
    }
}

impl Normalize for CanonicalEvent {
    type Canonical = CanonicalEvent;

    fn normalize(&self) -> CanonicalEvent {
        self.clone()
    }
}

impl Normalize for CanonicalHistory {
    type Canonical = CanonicalHistory;

    fn normalize(&self) -> CanonicalHistory {
        self.clone()
    }
}

pub fn normalize_details(stored: &RecordDetails) -> CanonicalDetails {
    let event_class = stored.event_class.clone().unwrap_or_default();

    CanonicalDetails {
        name: stored.name.clone(),
        date: stored.date.clone(),
        venue: stored.venue.clone(),
        notes: stored.notes.clone(),
        participant_entries: stored
            .participant_entries
            .iter()
            .map(|p| normalize_participant(p, &event_class))
            .collect(),
        event_class,
        bib_number: stored.bib_number.clone(),
        entry_start_date: stored.entry_start_date.clone(),
        entry_deadline: stored.entry_deadline.clone(),
        entry_done: stored.entry_done,
    }
}

/// Current-shape entries pass through; otherwise one entry is derived per
/// legacy category, tagged with the parent record's class.
pub fn normalize_participant(
    stored: &StoredParticipantEntry,
    parent_class: &str,
) -> ParticipantEntry {
    let entries = match &stored.entries {
        Some(entries) if !entries.is_empty() => entries.iter().map(entry_from_stored).collect(),
        _ => legacy_entries(stored, parent_class),
    };

    ParticipantEntry {
        participant: stored.participant.clone(),
        entries,
        results: stored.results.clone(),
        memo: stored.memo.clone().unwrap_or_default(),
    }
}

fn entry_from_stored(stored: &StoredEntry) -> Entry {
    Entry {
        entry_class: stored.entry_class.clone(),
        category: stored.category.clone(),
        disciplines: stored.disciplines.iter().cloned().collect(),
    }
}

fn legacy_entries(stored: &StoredParticipantEntry, parent_class: &str) -> Vec<Entry> {
    let single = stored.category.iter().map(|category| {
        (
            category.as_str(),
            stored.disciplines.as_deref().unwrap_or_default(),
        )
    });
    let sections = stored
        .sections
        .iter()
        .map(|section| (section.section.as_str(), section.dances.as_slice()));

    let mut entries: Vec<Entry> = Vec::new();
    for (category, disciplines) in single.chain(sections) {
        if category.trim().is_empty() {
            continue;
        }
        match entries.iter_mut().find(|e| e.category == category) {
            Some(existing) => existing.disciplines.extend(disciplines.iter().cloned()),
            None => entries.push(
                Entry::new(parent_class, category).with_disciplines(disciplines.iter().cloned()),
            ),
        }
    }
    entries
}

/// The current stored shape of canonical details (the write path).
pub fn store_details(details: &CanonicalDetails) -> RecordDetails {
    RecordDetails {
        name: details.name.clone(),
        date: details.date.clone(),
        venue: details.venue.clone(),
        notes: details.notes.clone(),
        event_class: Some(details.event_class.clone()).filter(|c| !c.is_empty()),
        bib_number: details.bib_number.clone(),
        entry_start_date: details.entry_start_date.clone(),
        entry_deadline: details.entry_deadline.clone(),
        entry_done: details.entry_done,
        participant_entries: details
            .participant_entries
            .iter()
            .map(store_participant)
            .collect(),
    }
}

fn store_participant(participant: &ParticipantEntry) -> StoredParticipantEntry {
    StoredParticipantEntry {
        participant: participant.participant.clone(),
        entries: Some(
            participant
                .entries
                .iter()
                .map(|e| StoredEntry {
                    entry_class: e.entry_class.clone(),
                    category: e.category.clone(),
                    disciplines: e.disciplines.iter().cloned().collect(),
                })
                .collect(),
        ),
        results: participant.results.clone(),
        memo: Some(participant.memo.clone()).filter(|m| !m.is_empty()),
        ..Default::default()
    }
}

impl CanonicalEvent {
    pub fn to_record(&self) -> EventRecord {
        EventRecord {
            id: self.id.clone(),
            details: store_details(&self.details),
        }
    }
}

impl CanonicalHistory {
    pub fn to_record(&self) -> HistoryRecord {
        HistoryRecord {
            id: self.id.clone(),
            details: store_details(&self.details),
            photos: self.photos.clone(),
        }
    }
}
