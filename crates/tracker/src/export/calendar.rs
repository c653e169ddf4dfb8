//! Single-event iCalendar export.

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use crate::canonical::CanonicalEvent;
use crate::error::{Result, TrackerError};

const UID_DOMAIN: &str = "dance-tracker";

/// Render one event as an all-day calendar entry.
///
/// `stamp` becomes DTSTAMP so the output only depends on its inputs.
pub fn event_to_ics(event: &CanonicalEvent, stamp: DateTime<Utc>) -> Result<String> {
    let id = event
        .id
        .as_ref()
        .ok_or_else(|| TrackerError::Calendar("event has no id".to_string()))?;
    let date = event.details.calendar_date().ok_or_else(|| {
        TrackerError::Calendar(format!("unreadable event date '{}'", event.details.date))
    })?;
    let day = date.format("%Y%m%d").to_string();

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&format!("{}@{}", id, UID_DOMAIN));
    ics_event.summary(&event.details.name);
    ics_event.add_property("DTSTAMP", stamp.format("%Y%m%dT%H%M%SZ").to_string());

    for name in ["DTSTART", "DTEND"] {
        let mut prop = Property::new(name, day.clone());
        prop.append_parameter(ValueType::Date);
        ics_event.append_property(prop);
    }

    if let Some(venue) = &event.details.venue {
        ics_event.location(venue);
    }

    let description = describe(event);
    if !description.is_empty() {
        ics_event.description(&description);
    }

    let mut cal = Calendar::new();
    cal.push(ics_event.done());
    Ok(cal.done().to_string())
}

/// Venue, class, notes and one `participant: categories` line each.
fn describe(event: &CanonicalEvent) -> String {
    let details = &event.details;
    let mut lines = Vec::new();

    if let Some(venue) = details.venue.as_deref().filter(|v| !v.is_empty()) {
        lines.push(venue.to_string());
    }
    if !details.event_class.is_empty() {
        lines.push(format!("Class: {}", details.event_class));
    }
    if let Some(notes) = details.notes.as_deref().filter(|n| !n.is_empty()) {
        lines.push(notes.to_string());
    }
    for participant in &details.participant_entries {
        lines.push(format!(
            "{}: {}",
            participant.participant,
            participant.categories().join(", ")
        ));
    }

    lines.join("\n")
}
