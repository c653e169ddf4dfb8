use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::entry::StoredParticipantEntry;
use super::ids::RecordId;

/// Fields shared by schedule events and history entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDetails {
    #[serde(default)]
    pub name: String,

    /// Calendar date as `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, alias = "compClass", skip_serializing_if = "Option::is_none")]
    pub event_class: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bib_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_start_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_deadline: Option<String>,

    #[serde(default)]
    pub entry_done: bool,

    #[serde(default, alias = "childEntries")]
    pub participant_entries: Vec<StoredParticipantEntry>,
}

impl RecordDetails {
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }
}

/// A document of the `competitions` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Attached on read; never part of the stored body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    #[serde(flatten)]
    pub details: RecordDetails,
}

/// A document of the `history` collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    #[serde(flatten)]
    pub details: RecordDetails,

    /// Inline encoded images, oldest first.
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Common access for the two collection document types.
pub trait StoredRecord: Clone + Send + Sync + 'static {
    fn id(&self) -> Option<&RecordId>;
    fn set_id(&mut self, id: Option<RecordId>);
    fn details(&self) -> &RecordDetails;
}

impl StoredRecord for EventRecord {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }

    fn details(&self) -> &RecordDetails {
        &self.details
    }
}

impl StoredRecord for HistoryRecord {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<RecordId>) {
        self.id = id;
    }

    fn details(&self) -> &RecordDetails {
        &self.details
    }
}
