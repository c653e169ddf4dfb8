use std::collections::BTreeMap;

use crate::canonical::CanonicalHistory;
use crate::catalog::{Medal, result_score};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearStatistics {
    pub year: String,
    pub count: usize,
    pub best_score: u32,
    pub medal_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MedalTally {
    pub gold: usize,
    pub silver: usize,
    pub bronze: usize,
}

impl MedalTally {
    pub fn total(&self) -> usize {
        self.gold + self.silver + self.bronze
    }

    fn add(&mut self, medal: Medal) {
        match medal {
            Medal::Gold => self.gold += 1,
            Medal::Silver => self.silver += 1,
            Medal::Bronze => self.bronze += 1,
        }
    }
}

/// Every stored result label of a history entry, including results whose
/// section was later removed and legacy bare-category keys.
pub fn results_of(history: &CanonicalHistory) -> impl Iterator<Item = &str> {
    history
        .details
        .participant_entries
        .iter()
        .flat_map(|p| p.results.values().map(String::as_str))
}

/// Grouping key: the first four characters of the date. Short or missing
/// dates form their own bucket rather than being dropped.
fn year_bucket(history: &CanonicalHistory) -> String {
    history.details.date.trim().chars().take(4).collect()
}

/// Per-year participation, best rank and medal count, years ascending.
pub fn yearly_statistics(history: &[CanonicalHistory]) -> Vec<YearStatistics> {
    let mut years: BTreeMap<String, YearStatistics> = BTreeMap::new();

    for record in history {
        let year = year_bucket(record);
        let stats = years
            .entry(year.clone())
            .or_insert_with(|| YearStatistics {
                year,
                count: 0,
                best_score: 0,
                medal_count: 0,
            });
        stats.count += 1;
        for label in results_of(record) {
            stats.best_score = stats.best_score.max(result_score(label));
            if Medal::from_label(label).is_some() {
                stats.medal_count += 1;
            }
        }
    }

    years.into_values().collect()
}

pub fn medal_tally(history: &[CanonicalHistory]) -> MedalTally {
    let mut tally = MedalTally::default();
    for label in history.iter().flat_map(results_of) {
        if let Some(medal) = Medal::from_label(label) {
            tally.add(medal);
        }
    }
    tally
}
