//! Identifier-space categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named partition of the entitlement identifier space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Certificate,
    EventBadge,
    Achievement,
    Workshop,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized category: {0}")]
pub struct ParseCategoryError(pub String);

impl Category {
    /// Every category, in base-offset order
    pub const ALL: [Category; 4] = [
        Category::Certificate,
        Category::EventBadge,
        Category::Achievement,
        Category::Workshop,
    ];

    /// Position of the category in the identifier space (0-based)
    pub const fn index(self) -> u64 {
        match self {
            Category::Certificate => 0,
            Category::EventBadge => 1,
            Category::Achievement => 2,
            Category::Workshop => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Certificate => "certificate",
            Category::EventBadge => "event_badge",
            Category::Achievement => "achievement",
            Category::Workshop => "workshop",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace(|c: char| c == '-' || c == ' ', "_");
        match normalized.as_str() {
            "certificate" => Ok(Category::Certificate),
            "event_badge" | "eventbadge" | "badge" => Ok(Category::EventBadge),
            "achievement" => Ok(Category::Achievement),
            "workshop" => Ok(Category::Workshop),
            _ => Err(ParseCategoryError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing_accepts_common_spellings() {
        assert_eq!("certificate".parse::<Category>(), Ok(Category::Certificate));
        assert_eq!("Event-Badge".parse::<Category>(), Ok(Category::EventBadge));
        assert_eq!("event badge".parse::<Category>(), Ok(Category::EventBadge));
        assert_eq!(" WORKSHOP ".parse::<Category>(), Ok(Category::Workshop));
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let err = "raffle".parse::<Category>().unwrap_err();
        assert_eq!(err, ParseCategoryError("raffle".into()));
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn test_indices_are_distinct_and_ordered() {
        let indices: Vec<u64> = Category::ALL.iter().map(|c| c.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>(), Ok(category));
        }
    }
}
