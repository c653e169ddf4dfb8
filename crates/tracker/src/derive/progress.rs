use storage::models::{ChecklistState, RecordId};

use crate::catalog::ChecklistCatalog;

/// Composite checklist key: `eventId:category:item`.
pub fn checklist_key(event_id: &RecordId, category: &str, item: &str) -> String {
    format!("{}:{}:{}", event_id, category, item)
}

/// Prefix shared by every checklist key of one event.
pub fn event_key_prefix(event_id: &RecordId) -> String {
    format!("{}:", event_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChecklistProgress {
    pub completed: usize,
    pub total: usize,
}

impl ChecklistProgress {
    /// Rounded percentage; 0 for an empty catalog.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// `total` comes from the catalog alone. Stale keys for items no longer in the
/// catalog are ignored, so `completed <= total` always holds.
pub fn checklist_progress(
    event_id: &RecordId,
    state: &ChecklistState,
    catalog: &ChecklistCatalog,
) -> ChecklistProgress {
    let completed = catalog
        .items()
        .filter(|(category, item)| {
            state
                .get(&checklist_key(event_id, category, &item.name))
                .copied()
                .unwrap_or(false)
        })
        .count();

    ChecklistProgress {
        completed,
        total: catalog.item_count(),
    }
}

/// Required catalog items not yet ticked for an event.
pub fn missing_required<'a>(
    event_id: &RecordId,
    state: &ChecklistState,
    catalog: &'a ChecklistCatalog,
) -> Vec<(&'a str, &'a str)> {
    catalog
        .items()
        .filter(|(category, item)| {
            item.required
                && !state
                    .get(&checklist_key(event_id, category, &item.name))
                    .copied()
                    .unwrap_or(false)
        })
        .map(|(category, item)| (category, item.name.as_str()))
        .collect()
}
