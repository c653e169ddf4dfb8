use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::canonical::CanonicalEvent;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventPhase {
    Upcoming,
    Past,
}

/// Countdown bucket of an event date relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    Today,
    /// Within the next three days.
    Imminent,
    /// Within the next seven days.
    Soon,
    Later,
    Elapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub days: i64,
    pub urgency: Urgency,
}

/// `Past` iff the event's calendar day is strictly before today's. An event
/// dated today stays upcoming until the day is over. Unreadable dates are past.
pub fn classify_event(event: &CanonicalEvent, now: NaiveDateTime) -> EventPhase {
    match event.details.calendar_date() {
        Some(date) if date >= now.date() => EventPhase::Upcoming,
        _ => EventPhase::Past,
    }
}

/// Whole days from `now` until midnight starting `date`, partial days rounded up.
pub fn days_until(date: NaiveDate, now: NaiveDateTime) -> i64 {
    let seconds = (date.and_time(NaiveTime::MIN) - now).num_seconds();
    div_ceil(seconds, SECONDS_PER_DAY)
}

pub fn urgency(date: NaiveDate, now: NaiveDateTime) -> Urgency {
    bucket(days_until(date, now))
}

pub fn countdown(event: &CanonicalEvent, now: NaiveDateTime) -> Option<Countdown> {
    let days = days_until(event.details.calendar_date()?, now);
    Some(Countdown {
        days,
        urgency: bucket(days),
    })
}

/// Split events into upcoming and past, keeping feed order in both halves.
pub fn partition_events(
    events: &[CanonicalEvent],
    now: NaiveDateTime,
) -> (Vec<&CanonicalEvent>, Vec<&CanonicalEvent>) {
    events
        .iter()
        .partition(|event| classify_event(event, now) == EventPhase::Upcoming)
}

fn bucket(days: i64) -> Urgency {
    match days {
        d if d < 0 => Urgency::Elapsed,
        0 => Urgency::Today,
        1..=3 => Urgency::Imminent,
        4..=7 => Urgency::Soon,
        _ => Urgency::Later,
    }
}

fn div_ceil(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator.div_euclid(denominator);
    if numerator.rem_euclid(denominator) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CanonicalDetails;
    use chrono::Duration;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn event_on(date: &str) -> CanonicalEvent {
        CanonicalEvent::new(CanonicalDetails::new("Cup", date))
    }

    #[test]
    fn test_today_is_upcoming_until_midnight() {
        let event = event_on("2025-05-10");

        assert_eq!(
            classify_event(&event, at("2025-05-10", "00:00:00")),
            EventPhase::Upcoming
        );
        assert_eq!(
            classify_event(&event, at("2025-05-10", "23:59:59")),
            EventPhase::Upcoming
        );
        assert_eq!(
            classify_event(&event, at("2025-05-11", "00:00:00")),
            EventPhase::Past
        );
    }

    #[test]
    fn test_yesterday_is_past() {
        let event = event_on("2025-05-09");
        assert_eq!(
            classify_event(&event, at("2025-05-10", "08:00:00")),
            EventPhase::Past
        );
    }

    #[test]
    fn test_classification_is_monotonic() {
        let now = at("2025-05-10", "13:30:00");
        let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        let mut seen_upcoming = false;

        for offset in 0..90 {
            let date = start + Duration::days(offset);
            let phase = classify_event(&event_on(&date.format("%Y-%m-%d").to_string()), now);
            if seen_upcoming {
                assert_eq!(phase, EventPhase::Upcoming);
            }
            seen_upcoming |= phase == EventPhase::Upcoming;
        }
        assert!(seen_upcoming);
    }

    #[test]
    fn test_unreadable_date_is_past() {
        let event = event_on("soon");
        let now = at("2025-05-10", "12:00:00");

        assert_eq!(classify_event(&event, now), EventPhase::Past);
        assert!(countdown(&event, now).is_none());
    }

    #[test]
    fn test_days_round_partial_days_up() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 12).unwrap();

        assert_eq!(days_until(date, at("2025-05-10", "00:00:00")), 2);
        assert_eq!(days_until(date, at("2025-05-10", "18:00:00")), 2);
        assert_eq!(days_until(date, at("2025-05-12", "09:00:00")), 0);
        assert_eq!(days_until(date, at("2025-05-13", "09:00:00")), -1);
    }

    #[test]
    fn test_urgency_buckets() {
        let now = at("2025-05-10", "10:00:00");
        let day = |offset: i64| NaiveDate::from_ymd_opt(2025, 5, 10).unwrap() + Duration::days(offset);

        assert_eq!(urgency(day(0), now), Urgency::Today);
        assert_eq!(urgency(day(1), now), Urgency::Imminent);
        assert_eq!(urgency(day(3), now), Urgency::Imminent);
        assert_eq!(urgency(day(4), now), Urgency::Soon);
        assert_eq!(urgency(day(7), now), Urgency::Soon);
        assert_eq!(urgency(day(8), now), Urgency::Later);
        assert_eq!(urgency(day(-1), now), Urgency::Elapsed);
    }

    #[test]
    fn test_partition_keeps_order() {
        let events = vec![
            event_on("2025-05-01"),
            event_on("2025-05-10"),
            event_on("2025-05-03"),
            event_on("2025-06-01"),
        ];
        let (upcoming, past) = partition_events(&events, at("2025-05-05", "12:00:00"));

        let dates = |list: &[&CanonicalEvent]| {
            list.iter()
                .map(|e| e.details.date.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(dates(&upcoming[..]), vec!["2025-05-10", "2025-06-01"]);
        assert_eq!(dates(&past[..]), vec!["2025-05-01", "2025-05-03"]);
    }
}
