//! Build-time vocabulary: checklist catalog, disciplines per category,
//! result labels with their rank, classification tags and participant badges.

/// Checklist catalog as `(category, [(item, required)])`, in display order.
pub const CHECKLIST: &[(&str, &[(&str, bool)])] = &[
    (
        "Costume & shoes",
        &[
            ("Latin shoes", true),
            ("Standard shoes", true),
            ("Latin costume", false),
            ("Standard costume", false),
            ("Spare practice wear", false),
            ("Tights / stockings", false),
        ],
    ),
    (
        "Grooming",
        &[
            ("Hair spray / gel", true),
            ("Hair pins / ties", true),
            ("Make-up kit", false),
            ("Mirror", false),
            ("Deodorant", false),
        ],
    ),
    (
        "Essentials",
        &[
            ("Bib number", true),
            ("Entry confirmation", true),
            ("Insurance card copy", true),
            ("Cash", true),
            ("Phone / charger", true),
        ],
    ),
    (
        "Nice to have",
        &[
            ("Lunch / snacks", false),
            ("Drinks", false),
            ("Towel", false),
            ("Safety pins", false),
            ("Plasters", false),
            ("Picnic mat", false),
            ("Indoor shoes", false),
        ],
    ),
];

/// Entry categories and the disciplines danced in each.
pub const DISCIPLINES: &[(&str, &[&str])] = &[
    ("Latin", &["Cha-cha-cha", "Samba", "Rumba", "Paso Doble", "Jive"]),
    (
        "Standard",
        &["Waltz", "Tango", "Slow Foxtrot", "Quickstep", "Viennese Waltz"],
    ),
];

/// Result labels, best first, with the rank used for statistics only.
pub const RESULTS: &[(&str, u32)] = &[
    ("1st 🥇", 10),
    ("2nd 🥈", 8),
    ("3rd 🥉", 7),
    ("4th", 6),
    ("5th", 5),
    ("6th", 4),
    ("Finalist", 3),
    ("Semi-finalist", 2),
    ("Second round", 1),
    ("Eliminated", 0),
];

/// Classification tags an event or entry may carry.
pub const CLASSES: &[&str] = &[
    "D", "C", "B", "A", "SA", "Grade 1", "Grade 2", "Grade 3", "Grade 4", "Grade 5", "Grade 6",
    "Open", "Novice",
];

const BADGE_COLORS: &[&str] = &["#6366f1", "#ec4899", "#f59e0b", "#10b981", "#ef4444"];
const BADGE_EMOJIS: &[&str] = &["👧", "👦", "💃", "🕺", "⭐"];

/// Rank of a result label; unknown labels rank 0.
pub fn result_score(label: &str) -> u32 {
    RESULTS
        .iter()
        .find(|(known, _)| *known == label)
        .map_or(0, |(_, score)| *score)
}

/// Disciplines offered for a category, empty for unknown categories.
pub fn disciplines_for(category: &str) -> &'static [&'static str] {
    DISCIPLINES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, disciplines)| *disciplines)
        .unwrap_or(&[])
}

pub fn is_known_class(tag: &str) -> bool {
    CLASSES.contains(&tag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Gold => "🥇",
            Self::Silver => "🥈",
            Self::Bronze => "🥉",
        }
    }

    /// The medal a result label denotes, if any. Gold wins when a label
    /// carries several markers.
    pub fn from_label(label: &str) -> Option<Self> {
        [Self::Gold, Self::Silver, Self::Bronze]
            .into_iter()
            .find(|medal| label.contains(medal.marker()))
    }
}

/// Colour and emoji shown next to a participant, assigned by roster position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub color: &'static str,
    pub emoji: &'static str,
}

pub fn badge_for(roster_index: usize) -> Badge {
    Badge {
        color: BADGE_COLORS[roster_index % BADGE_COLORS.len()],
        emoji: BADGE_EMOJIS[roster_index % BADGE_EMOJIS.len()],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistItem {
    pub name: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistCategory {
    pub name: String,
    pub items: Vec<ChecklistItem>,
}

/// The static list of things to pack for every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistCatalog {
    categories: Vec<ChecklistCategory>,
}

impl ChecklistCatalog {
    pub fn new(categories: Vec<ChecklistCategory>) -> Self {
        Self { categories }
    }

    pub fn standard() -> Self {
        let categories = CHECKLIST
            .iter()
            .map(|(name, items)| ChecklistCategory {
                name: name.to_string(),
                items: items
                    .iter()
                    .map(|(item, required)| ChecklistItem {
                        name: item.to_string(),
                        required: *required,
                    })
                    .collect(),
            })
            .collect();
        Self { categories }
    }

    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
        }
    }

    pub fn categories(&self) -> &[ChecklistCategory] {
        &self.categories
    }

    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    /// Every `(category, item)` pair in display order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &ChecklistItem)> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter().map(move |item| (c.name.as_str(), item)))
    }
}

impl Default for ChecklistCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_scores() {
        assert_eq!(result_score("1st 🥇"), 10);
        assert_eq!(result_score("4th"), 6);
        assert_eq!(result_score("Eliminated"), 0);
        assert_eq!(result_score("made up"), 0);
    }

    #[test]
    fn test_medal_markers() {
        assert_eq!(Medal::from_label("1st 🥇"), Some(Medal::Gold));
        assert_eq!(Medal::from_label("2nd 🥈"), Some(Medal::Silver));
        assert_eq!(Medal::from_label("3rd 🥉"), Some(Medal::Bronze));
        assert_eq!(Medal::from_label("4th"), None);
    }

    #[test]
    fn test_standard_catalog_size() {
        let catalog = ChecklistCatalog::standard();
        assert_eq!(catalog.categories().len(), 4);
        assert_eq!(catalog.item_count(), 23);
        assert_eq!(catalog.items().count(), 23);
    }

    #[test]
    fn test_badges_wrap_around() {
        assert_eq!(badge_for(0), badge_for(5));
        assert_ne!(badge_for(0), badge_for(1));
    }

    #[test]
    fn test_disciplines_lookup() {
        assert_eq!(disciplines_for("Latin").len(), 5);
        assert!(disciplines_for("Tap").is_empty());
        assert!(is_known_class("Open"));
    }
}
