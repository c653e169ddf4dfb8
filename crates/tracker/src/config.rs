use crate::catalog::ChecklistCatalog;

/// Configuration fixed for the lifetime of a session.
#[derive(Debug, Clone, Default)]
pub struct TrackerConfig {
    pub checklist: ChecklistCatalog,
}

impl TrackerConfig {
    pub fn with_checklist(checklist: ChecklistCatalog) -> Self {
        Self { checklist }
    }
}
