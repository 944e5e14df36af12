use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of headlines kept per site in one digest
pub const MAX_ITEMS_PER_SITE: u32 = 3;

/// Digest section a site belongs to. Declaration order is digest order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    General,
    Sports,
}

impl Category {
    /// Sort key used by the ranking query
    pub fn rank(self) -> i64 {
        match self {
            Category::General => 1,
            Category::Sports => 2,
        }
    }

    pub fn from_rank(rank: i64) -> Option<Self> {
        match rank {
            1 => Some(Category::General),
            2 => Some(Category::Sports),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Sports => "Sports",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One headline as returned by the ranking query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub site: String,
    /// Publication time in HH:MM form
    pub time: String,
    pub headline: String,
    pub link: String,
    pub category: Category,
}

impl NewsItem {
    pub fn new(
        category: Category,
        site: impl Into<String>,
        time: impl Into<String>,
        headline: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            site: site.into(),
            time: time.into(),
            headline: headline.into(),
            link: link.into(),
            category,
        }
    }
}
