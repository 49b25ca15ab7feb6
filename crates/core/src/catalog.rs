//! Static category and tag catalog.
//!
//! The catalog is fixed at compile time; the `categories` reference table is
//! seeded from it at API startup. Channels reference categories by name
//! without an enforced foreign key.

/// Maximum category labels per channel.
pub const MAX_CATEGORIES: usize = 3;
/// Maximum thematic tags selectable in the wizard.
pub const MAX_THEMATIC_TAGS: usize = 5;
/// Maximum format tags selectable in the wizard.
pub const MAX_FORMAT_TAGS: usize = 3;
/// Description bounds enforced by the wizard, in characters.
pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 300;
/// Tag keyboards switch to pagination above this many rows.
pub const TAG_PAGE_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDef {
    pub name: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
}

pub const CATEGORIES: &[CategoryDef] = &[
    CategoryDef { name: "News", emoji: "📰", description: "World and local news" },
    CategoryDef { name: "Finance", emoji: "💼", description: "Investing, trading, banking" },
    CategoryDef { name: "Crypto", emoji: "₿", description: "Crypto, blockchain, NFT" },
    CategoryDef { name: "Technology", emoji: "💻", description: "IT, gadgets, programming" },
    CategoryDef { name: "Games", emoji: "🎮", description: "Gaming channels" },
    CategoryDef { name: "Entertainment", emoji: "🎬", description: "Movies, series, humor" },
    CategoryDef { name: "Business", emoji: "📊", description: "Startups, marketing, sales" },
    CategoryDef { name: "Education", emoji: "📚", description: "Courses, languages, learning" },
    CategoryDef { name: "Self-growth", emoji: "🌱", description: "Psychology, motivation, health" },
    CategoryDef { name: "Sport", emoji: "⚽", description: "Sports news and fitness" },
    CategoryDef { name: "Lifestyle", emoji: "✈️", description: "Fashion, travel, food" },
    CategoryDef { name: "Creative", emoji: "🎨", description: "Design, photo, video" },
];

pub fn category(name: &str) -> Option<&'static CategoryDef> {
    CATEGORIES.iter().find(|c| c.name == name)
}

/// Thematic tags scoped to a category. Unknown categories yield an empty list.
pub fn thematic_tags(category: &str) -> &'static [&'static str] {
    match category {
        "News" => &["world", "local", "politics", "economy"],
        "Finance" => &["investing", "trading", "stocks", "banking"],
        "Crypto" => &["bitcoin", "ethereum", "altcoins", "defi", "nft"],
        "Technology" => &["ai", "ml", "blockchain", "cloud", "mobile"],
        "Games" => &["pc", "console", "mobile", "esports"],
        "Entertainment" => &["movies", "series", "music", "books"],
        "Business" => &["startups", "marketing", "sales"],
        "Education" => &["courses", "languages", "programming"],
        "Self-growth" => &["psychology", "motivation", "health"],
        "Sport" => &["football", "fitness", "running"],
        "Lifestyle" => &["fashion", "travel", "food"],
        "Creative" => &["design", "photo", "video"],
        _ => &[],
    }
}

/// Format tags are global, not category-scoped.
pub const FORMAT_TAGS: &[&str] = &[
    "reviews", "reactions", "analytics", "guides", "news", "digests", "streams", "live",
    "podcast", "insider",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_thematic_tags() {
        for cat in CATEGORIES {
            assert!(
                !thematic_tags(cat.name).is_empty(),
                "category {} has no thematic tags",
                cat.name
            );
        }
    }

    #[test]
    fn category_lookup() {
        assert_eq!(category("Crypto").map(|c| c.emoji), Some("₿"));
        assert!(category("Unknown").is_none());
    }

    #[test]
    fn unknown_category_has_no_tags() {
        assert!(thematic_tags("Unknown").is_empty());
    }

    #[test]
    fn thematic_tag_lists_fit_one_page() {
        for cat in CATEGORIES {
            assert!(thematic_tags(cat.name).len() <= TAG_PAGE_SIZE);
        }
    }

    #[test]
    fn format_tags_exceed_cap() {
        assert!(FORMAT_TAGS.len() > MAX_FORMAT_TAGS);
    }
}
