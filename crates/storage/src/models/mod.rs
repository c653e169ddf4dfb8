pub mod entry;
pub mod group;
pub mod ids;
pub mod record;
pub mod snapshot;

pub use entry::{LegacySection, StoredEntry, StoredParticipantEntry};
pub use group::{ChecklistState, Group, GroupPatch};
pub use ids::{GroupId, RecordId};
pub use record::{EventRecord, HistoryRecord, RecordDetails, StoredRecord};
pub use snapshot::GroupSnapshot;
