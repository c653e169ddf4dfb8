use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use storage::models::RecordId;
use validator::{Validate, ValidationError};

use crate::catalog::{disciplines_for, is_known_class};

/// One class/category registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub entry_class: String,
    pub category: String,
    pub disciplines: BTreeSet<String>,
}

impl Entry {
    pub fn new(entry_class: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            entry_class: entry_class.into(),
            category: category.into(),
            disciplines: BTreeSet::new(),
        }
    }

    pub fn with_disciplines<I, S>(mut self, disciplines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disciplines = disciplines.into_iter().map(Into::into).collect();
        self
    }

    /// Key results are stored under: class tag immediately followed by category.
    pub fn result_key(&self) -> String {
        format!("{}{}", self.entry_class, self.category)
    }
}

/// A participant's entries and, for history records, their results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantEntry {
    pub participant: String,
    pub entries: Vec<Entry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub results: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub memo: String,
}

impl ParticipantEntry {
    pub fn new(participant: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            participant: participant.into(),
            entries,
            results: BTreeMap::new(),
            memo: String::new(),
        }
    }

    /// Result for one entry. Records written before class tagging keyed
    /// results by bare category, so that key is consulted second. Read only:
    /// the fallback is never written back.
    pub fn result_for(&self, entry: &Entry) -> Option<&str> {
        self.results
            .get(&entry.result_key())
            .or_else(|| self.results.get(&entry.category))
            .map(String::as_str)
    }

    /// Record a result under the class-tagged key.
    pub fn set_result(&mut self, entry: &Entry, label: impl Into<String>) {
        self.results.insert(entry.result_key(), label.into());
    }

    /// Categories in entry order, for one-line summaries.
    pub fn categories(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.category.as_str()).collect()
    }
}

/// Fields shared by events and history entries, in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalDetails {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: String,

    #[validate(custom(function = "validate_calendar_date"))]
    pub date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default)]
    pub event_class: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bib_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_start_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_deadline: Option<String>,

    #[serde(default)]
    pub entry_done: bool,

    #[serde(default)]
    pub participant_entries: Vec<ParticipantEntry>,
}

impl CanonicalDetails {
    pub fn new(name: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
            ..Default::default()
        }
    }

    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    pub fn participant(&self, name: &str) -> Option<&ParticipantEntry> {
        self.participant_entries
            .iter()
            .find(|p| p.participant == name)
    }

    /// Class tags, categories and disciplines the catalog does not offer.
    /// Records keep them as entered; this only reports them.
    pub fn catalog_mismatches(&self) -> Vec<String> {
        let mut found = Vec::new();
        if !self.event_class.is_empty() && !is_known_class(&self.event_class) {
            found.push(format!("unknown class {:?}", self.event_class));
        }

        for p in &self.participant_entries {
            for entry in &p.entries {
                if !entry.entry_class.is_empty() && !is_known_class(&entry.entry_class) {
                    found.push(format!("{}: unknown class {:?}", p.participant, entry.entry_class));
                }
                let offered = disciplines_for(&entry.category);
                if offered.is_empty() {
                    found.push(format!("{}: unknown category {:?}", p.participant, entry.category));
                    continue;
                }
                for discipline in &entry.disciplines {
                    if !offered.contains(&discipline.as_str()) {
                        found.push(format!(
                            "{}: {:?} is not a {} discipline",
                            p.participant, discipline, entry.category
                        ));
                    }
                }
            }
        }
        found
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(flatten)]
    pub details: CanonicalDetails,
}

impl CanonicalEvent {
    pub fn new(details: CanonicalDetails) -> Self {
        Self { id: None, details }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(flatten)]
    pub details: CanonicalDetails,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl CanonicalHistory {
    pub fn new(details: CanonicalDetails) -> Self {
        Self {
            id: None,
            details,
            photos: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// Seed a history entry from a schedule event: same entries, results and
    /// memos cleared, no photos.
    pub fn seeded_from(event: &CanonicalEvent) -> Self {
        let mut details = event.details.clone();
        for participant in &mut details.participant_entries {
            participant.results.clear();
            participant.memo.clear();
        }
        Self::new(details)
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some("Name is required".into());
        return Err(error);
    }
    Ok(())
}

fn validate_calendar_date(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some("Date is required".into());
        return Err(error);
    }
    if NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_err() {
        let mut error = ValidationError::new("invalid_date");
        error.message = Some("Date must be YYYY-MM-DD".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_mismatches_reported() {
        let mut details = CanonicalDetails::new("Cup", "2025-04-01");
        details.event_class = "Z".to_string();
        details.participant_entries.push(ParticipantEntry::new(
            "Mia",
            vec![
                Entry::new("C", "Latin").with_disciplines(["Samba", "Twist"]),
                Entry::new("Open", "Tap"),
            ],
        ));

        assert_eq!(
            details.catalog_mismatches(),
            vec![
                "unknown class \"Z\"".to_string(),
                "Mia: \"Twist\" is not a Latin discipline".to_string(),
                "Mia: unknown category \"Tap\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_catalog_entries_pass() {
        let mut details = CanonicalDetails::new("Cup", "2025-04-01");
        details.event_class = "C".to_string();
        details.participant_entries.push(ParticipantEntry::new(
            "Leo",
            vec![Entry::new("", "Standard").with_disciplines(["Waltz", "Quickstep"])],
        ));

        assert!(details.catalog_mismatches().is_empty());
    }

    #[test]
    fn test_result_key_concatenates() {
        let entry = Entry::new("C", "Latin");
        assert_eq!(entry.result_key(), "CLatin");
    }

    #[test]
    fn test_result_lookup_falls_back_to_bare_category() {
        let entry = Entry::new("C", "Latin");
        let mut participant = ParticipantEntry::new("Mia", vec![entry.clone()]);
        participant
            .results
            .insert("Latin".to_string(), "2nd 🥈".to_string());

        assert_eq!(participant.result_for(&entry), Some("2nd 🥈"));
        assert!(!participant.results.contains_key("CLatin"));
    }

    #[test]
    fn test_class_tagged_result_wins() {
        let entry = Entry::new("C", "Latin");
        let mut participant = ParticipantEntry::new("Mia", vec![entry.clone()]);
        participant
            .results
            .insert("Latin".to_string(), "4th".to_string());
        participant.set_result(&entry, "1st 🥇");

        assert_eq!(participant.result_for(&entry), Some("1st 🥇"));
    }

    #[test]
    fn test_validation_requires_name_and_date() {
        assert!(CanonicalDetails::new("Spring Cup", "2025-04-01").validate().is_ok());

        let errors = CanonicalDetails::new("  ", "").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("date"));

        assert!(CanonicalDetails::new("Cup", "next week").validate().is_err());
    }

    #[test]
    fn test_seeded_history_clears_results() {
        let entry = Entry::new("", "Standard");
        let mut participant = ParticipantEntry::new("Leo", vec![entry.clone()]);
        participant.set_result(&entry, "Finalist");
        participant.memo = "old memo".to_string();

        let mut details = CanonicalDetails::new("Autumn Cup", "2024-10-01");
        details.participant_entries.push(participant);
        let event = CanonicalEvent::new(details).with_id(RecordId::new("evt-1"));

        let history = CanonicalHistory::seeded_from(&event);

        assert!(history.id.is_none());
        assert!(history.photos.is_empty());
        let seeded = &history.details.participant_entries[0];
        assert_eq!(seeded.entries, vec![entry]);
        assert!(seeded.results.is_empty());
        assert!(seeded.memo.is_empty());
    }
}
