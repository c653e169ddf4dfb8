//! Read-only views computed from canonical state. Nothing here mutates its
//! input or touches the store.

pub mod progress;
pub mod roster;
pub mod schedule;
pub mod stats;

pub use progress::{ChecklistProgress, checklist_key, checklist_progress, event_key_prefix};
pub use roster::{badge_of, history_for_participant, visible_entries};
pub use schedule::{
    Countdown, EventPhase, Urgency, classify_event, countdown, days_until, partition_events,
    urgency,
};
pub use stats::{MedalTally, YearStatistics, medal_tally, yearly_statistics};
