use serde::{Deserialize, Serialize};

use super::group::Group;
use super::record::{EventRecord, HistoryRecord};

/// A full dump of one group: the group document plus both collections.
///
/// Used to seed an in-process store and as the on-disk exchange format of the
/// command-line tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    #[serde(default)]
    pub group: Group,
    #[serde(default, alias = "competitions")]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

impl GroupSnapshot {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
