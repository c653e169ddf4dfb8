use crate::canonical::{CanonicalDetails, CanonicalHistory, ParticipantEntry};
use crate::catalog::{Badge, badge_for};

/// Participant entries of a record whose participant is still on the roster.
/// Records keep entries of removed participants; they are only hidden here.
pub fn visible_entries<'a>(
    details: &'a CanonicalDetails,
    roster: &[String],
) -> Vec<&'a ParticipantEntry> {
    details
        .participant_entries
        .iter()
        .filter(|p| roster.contains(&p.participant))
        .collect()
}

/// History entries in which `participant` took part, in feed order.
pub fn history_for_participant<'a>(
    history: &'a [CanonicalHistory],
    participant: &str,
) -> Vec<&'a CanonicalHistory> {
    history
        .iter()
        .filter(|record| record.details.participant(participant).is_some())
        .collect()
}

pub fn badge_of(roster: &[String], participant: &str) -> Option<Badge> {
    roster
        .iter()
        .position(|name| name == participant)
        .map(badge_for)
}
