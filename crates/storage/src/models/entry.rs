use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One participant's registrations as they sit in the store.
///
/// Two physical shapes coexist: the current `entries` list, and the legacy
/// forms that predate class tagging (a bare `category`/`disciplines` pair, or
/// the older `sections` list). Readers must go through normalization instead
/// of looking at these fields directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredParticipantEntry {
    #[serde(default, alias = "child")]
    pub participant: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<StoredEntry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disciplines: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<LegacySection>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub results: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Current shape: one class/category registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    #[serde(default)]
    pub entry_class: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub disciplines: Vec<String>,
}

/// Oldest shape: `{section, dances}` pairs without any class tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySection {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub dances: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_shape_deserializes() {
        let json = r#"{
            "participant": "Mia",
            "entries": [{"entryClass": "C", "category": "Latin", "disciplines": ["Samba", "Jive"]}]
        }"#;
        let entry: StoredParticipantEntry = serde_json::from_str(json).unwrap();

        let entries = entry.entries.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_class, "C");
        assert!(entry.category.is_none());
    }

    #[test]
    fn test_legacy_sections_deserialize() {
        let json = r#"{
            "child": "Leo",
            "sections": [{"section": "Standard", "dances": ["Waltz"]}],
            "results": {"Standard": "Winner 🥇"},
            "memo": "great day"
        }"#;
        let entry: StoredParticipantEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.participant, "Leo");
        assert!(entry.entries.is_none());
        assert_eq!(entry.sections[0].section, "Standard");
        assert_eq!(entry.results.get("Standard").map(String::as_str), Some("Winner 🥇"));
    }

    #[test]
    fn test_empty_legacy_fields_are_not_written() {
        let entry = StoredParticipantEntry {
            participant: "Mia".to_string(),
            entries: Some(Vec::new()),
            ..Default::default()
        };
        let value = serde_json::to_value(&entry).unwrap();

        assert!(value.get("sections").is_none());
        assert!(value.get("results").is_none());
        assert!(value.get("category").is_none());
    }
}
