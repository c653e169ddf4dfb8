use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Checklist flags keyed by `eventId:category:itemName`.
pub type ChecklistState = BTreeMap<String, bool>;

/// The shared group document: members, participant roster and checklist flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default, alias = "children")]
    pub roster: Vec<String>,
    #[serde(default, alias = "checked")]
    pub checklist_state: ChecklistState,
}

impl Group {
    /// A freshly founded group with a single member.
    pub fn founded_by(member: impl Into<String>) -> Self {
        Self {
            members: vec![member.into()],
            roster: Vec::new(),
            checklist_state: ChecklistState::new(),
        }
    }

    /// Apply a partial update. Fields the patch does not name are left alone.
    pub fn apply(&mut self, patch: &GroupPatch) {
        if let Some(member) = &patch.add_member
            && !self.members.contains(member)
        {
            self.members.push(member.clone());
        }

        if let Some(roster) = &patch.roster {
            self.roster = roster.clone();
        }

        if !patch.clear_prefixes.is_empty() {
            self.checklist_state
                .retain(|key, _| !patch.clear_prefixes.iter().any(|p| key.starts_with(p)));
        }

        for (key, value) in &patch.set_checks {
            self.checklist_state.insert(key.clone(), *value);
        }
    }
}

/// A field-level merge into the group document.
///
/// Checklist entries are set one key at a time so concurrent writers touching
/// different keys never overwrite each other. Clearing goes by key prefix and
/// runs against the stored document, so keys the writer has not seen yet are
/// removed too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roster: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_checks: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub clear_prefixes: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_member: Option<String>,
}

impl GroupPatch {
    pub fn roster(roster: Vec<String>) -> Self {
        Self {
            roster: Some(roster),
            ..Default::default()
        }
    }

    pub fn check(key: impl Into<String>, value: bool) -> Self {
        let mut patch = Self::default();
        patch.set_checks.insert(key.into(), value);
        patch
    }

    /// Remove every checklist key starting with `prefix`.
    pub fn clear_prefix(prefix: impl Into<String>) -> Self {
        let mut patch = Self::default();
        patch.clear_prefixes.insert(prefix.into());
        patch
    }

    pub fn add_member(member: impl Into<String>) -> Self {
        Self {
            add_member: Some(member.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_none()
            && self.set_checks.is_empty()
            && self.clear_prefixes.is_empty()
            && self.add_member.is_none()
    }
}
