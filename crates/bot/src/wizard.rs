//! Pure state machine for the channel setup wizard. No I/O.
//!
//! Steps advance in strict forward order; the only backward transition is
//! `Restart` from the confirmation step. Handlers translate button callbacks
//! and text messages into [`SetupEvent`]s and render the [`Outcome`].

use zonix_core::catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    SelectingCategory,
    SelectingThematicTags,
    SelectingFormatTags,
    AwaitingDescription,
    ReadyToConfirm,
}

#[derive(Debug, Clone)]
pub struct SetupSession {
    pub channel_id: i64,
    pub step: SetupStep,
    pub category: Option<String>,
    pub thematic_tags: Vec<String>,
    pub format_tags: Vec<String>,
    pub description: Option<String>,
    /// Current page of the thematic tag keyboard.
    pub thematic_page: usize,
}

#[derive(Debug, Clone, Copy)]
pub enum SetupEvent<'a> {
    SelectCategory(&'a str),
    ToggleThematic(&'a str),
    ThematicPage(usize),
    NextFromThematic,
    ToggleFormat(&'a str),
    NextFromFormat,
    SetDescription(&'a str),
    Restart,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Moved to the next step (or back to the first one on restart).
    Advanced,
    /// Selection or page changed; the step stays the same.
    Updated,
    /// Input refused with a user-visible warning; nothing changed.
    Rejected(String),
    /// Event is not valid in the current step; nothing changed.
    Ignored,
}

impl SetupSession {
    pub fn new(channel_id: i64) -> Self {
        Self {
            channel_id,
            step: SetupStep::SelectingCategory,
            category: None,
            thematic_tags: Vec::new(),
            format_tags: Vec::new(),
            description: None,
            thematic_page: 0,
        }
    }

    /// Apply one user action to the session.
    pub fn apply(&mut self, event: SetupEvent<'_>) -> Outcome {
        match (self.step, event) {
            (SetupStep::SelectingCategory, SetupEvent::SelectCategory(name)) => {
                if catalog::category(name).is_none() {
                    return Outcome::Rejected("Unknown category".to_string());
                }
                self.category = Some(name.to_string());
                self.thematic_tags.clear();
                self.thematic_page = 0;
                self.step = SetupStep::SelectingThematicTags;
                Outcome::Advanced
            }
            (SetupStep::SelectingThematicTags, SetupEvent::ToggleThematic(tag)) => {
                let candidates =
                    catalog::thematic_tags(self.category.as_deref().unwrap_or_default());
                if !candidates.iter().any(|t| *t == tag) {
                    return Outcome::Rejected("Unknown tag".to_string());
                }
                toggle(&mut self.thematic_tags, tag, catalog::MAX_THEMATIC_TAGS)
            }
            (SetupStep::SelectingThematicTags, SetupEvent::ThematicPage(page)) => {
                let candidates =
                    catalog::thematic_tags(self.category.as_deref().unwrap_or_default());
                let pages = page_count(candidates.len(), catalog::TAG_PAGE_SIZE);
                self.thematic_page = page.min(pages.saturating_sub(1));
                Outcome::Updated
            }
            (SetupStep::SelectingThematicTags, SetupEvent::NextFromThematic) => {
                if self.thematic_tags.is_empty() {
                    return Outcome::Rejected("Pick at least one topic tag".to_string());
                }
                self.step = SetupStep::SelectingFormatTags;
                Outcome::Advanced
            }
            (SetupStep::SelectingFormatTags, SetupEvent::ToggleFormat(tag)) => {
                if !catalog::FORMAT_TAGS.iter().any(|t| *t == tag) {
                    return Outcome::Rejected("Unknown tag".to_string());
                }
                toggle(&mut self.format_tags, tag, catalog::MAX_FORMAT_TAGS)
            }
            (SetupStep::SelectingFormatTags, SetupEvent::NextFromFormat) => {
                // Format tags are optional; zero selections is fine.
                self.step = SetupStep::AwaitingDescription;
                Outcome::Advanced
            }
            (SetupStep::AwaitingDescription, SetupEvent::SetDescription(text)) => {
                let text = text.trim();
                let chars = text.chars().count();
                if chars < catalog::DESCRIPTION_MIN_CHARS {
                    return Outcome::Rejected(format!(
                        "Description is too short, write at least {} characters",
                        catalog::DESCRIPTION_MIN_CHARS
                    ));
                }
                if chars > catalog::DESCRIPTION_MAX_CHARS {
                    return Outcome::Rejected(format!(
                        "Description is too long ({}/{} characters)",
                        chars,
                        catalog::DESCRIPTION_MAX_CHARS
                    ));
                }
                self.description = Some(text.to_string());
                self.step = SetupStep::ReadyToConfirm;
                Outcome::Advanced
            }
            (SetupStep::ReadyToConfirm, SetupEvent::Restart) => {
                self.category = None;
                self.thematic_tags.clear();
                self.format_tags.clear();
                self.description = None;
                self.thematic_page = 0;
                self.step = SetupStep::SelectingCategory;
                Outcome::Advanced
            }
            _ => Outcome::Ignored,
        }
    }
}

fn toggle(selected: &mut Vec<String>, tag: &str, cap: usize) -> Outcome {
    if let Some(pos) = selected.iter().position(|t| t == tag) {
        selected.remove(pos);
        return Outcome::Updated;
    }
    if selected.len() >= cap {
        return Outcome::Rejected(format!("You can pick at most {} tags", cap));
    }
    selected.push(tag.to_string());
    Outcome::Updated
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if total == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at_thematic() -> SetupSession {
        let mut s = SetupSession::new(-100);
        assert_eq!(s.apply(SetupEvent::SelectCategory("Crypto")), Outcome::Advanced);
        s
    }

    fn session_at_confirm() -> SetupSession {
        let mut s = session_at_thematic();
        s.apply(SetupEvent::ToggleThematic("bitcoin"));
        s.apply(SetupEvent::NextFromThematic);
        s.apply(SetupEvent::ToggleFormat("analytics"));
        s.apply(SetupEvent::NextFromFormat);
        assert_eq!(
            s.apply(SetupEvent::SetDescription("Daily on-chain analytics digest")),
            Outcome::Advanced
        );
        assert_eq!(s.step, SetupStep::ReadyToConfirm);
        s
    }

    #[test]
    fn full_forward_flow() {
        let s = session_at_confirm();
        assert_eq!(s.category.as_deref(), Some("Crypto"));
        assert_eq!(s.thematic_tags, vec!["bitcoin"]);
        assert_eq!(s.format_tags, vec!["analytics"]);
        assert!(s.description.is_some());
    }

    #[test]
    fn unknown_category_rejected() {
        let mut s = SetupSession::new(-100);
        assert!(matches!(
            s.apply(SetupEvent::SelectCategory("Gardening")),
            Outcome::Rejected(_)
        ));
        assert_eq!(s.step, SetupStep::SelectingCategory);
    }

    #[test]
    fn selecting_category_resets_thematic_selection() {
        let mut s = session_at_thematic();
        s.apply(SetupEvent::ToggleThematic("bitcoin"));
        s.step = SetupStep::SelectingCategory;
        s.apply(SetupEvent::SelectCategory("Games"));
        assert!(s.thematic_tags.is_empty());
    }

    #[test]
    fn toggle_twice_restores_original_set() {
        let mut s = session_at_thematic();
        assert_eq!(s.apply(SetupEvent::ToggleThematic("defi")), Outcome::Updated);
        assert_eq!(s.thematic_tags, vec!["defi"]);
        assert_eq!(s.apply(SetupEvent::ToggleThematic("defi")), Outcome::Updated);
        assert!(s.thematic_tags.is_empty());
    }

    #[test]
    fn thematic_cap_leaves_set_unchanged() {
        let mut s = session_at_thematic();
        for tag in ["bitcoin", "ethereum", "altcoins", "defi", "nft"] {
            assert_eq!(s.apply(SetupEvent::ToggleThematic(tag)), Outcome::Updated);
        }
        // Crypto only has five candidates, so re-use a Games-style overflow:
        // the cap rejects a sixth distinct tag even if the catalog had one.
        let before = s.thematic_tags.clone();
        assert!(matches!(
            toggle(&mut s.thematic_tags, "sixth", zonix_core::catalog::MAX_THEMATIC_TAGS),
            Outcome::Rejected(_)
        ));
        assert_eq!(s.thematic_tags, before);
    }

    #[test]
    fn advance_requires_at_least_one_thematic_tag() {
        let mut s = session_at_thematic();
        assert!(matches!(
            s.apply(SetupEvent::NextFromThematic),
            Outcome::Rejected(_)
        ));
        assert_eq!(s.step, SetupStep::SelectingThematicTags);

        s.apply(SetupEvent::ToggleThematic("nft"));
        assert_eq!(s.apply(SetupEvent::NextFromThematic), Outcome::Advanced);
        assert_eq!(s.step, SetupStep::SelectingFormatTags);
    }

    #[test]
    fn format_tags_are_optional() {
        let mut s = session_at_thematic();
        s.apply(SetupEvent::ToggleThematic("nft"));
        s.apply(SetupEvent::NextFromThematic);
        assert_eq!(s.apply(SetupEvent::NextFromFormat), Outcome::Advanced);
        assert_eq!(s.step, SetupStep::AwaitingDescription);
    }

    #[test]
    fn format_cap_is_three() {
        let mut s = session_at_thematic();
        s.apply(SetupEvent::ToggleThematic("nft"));
        s.apply(SetupEvent::NextFromThematic);
        for tag in ["reviews", "analytics", "guides"] {
            assert_eq!(s.apply(SetupEvent::ToggleFormat(tag)), Outcome::Updated);
        }
        let before = s.format_tags.clone();
        assert!(matches!(
            s.apply(SetupEvent::ToggleFormat("news")),
            Outcome::Rejected(_)
        ));
        assert_eq!(s.format_tags, before);
    }

    #[test]
    fn description_just_over_limit_is_rejected() {
        let mut s = session_at_thematic();
        s.apply(SetupEvent::ToggleThematic("nft"));
        s.apply(SetupEvent::NextFromThematic);
        s.apply(SetupEvent::NextFromFormat);

        let long = "x".repeat(zonix_core::catalog::DESCRIPTION_MAX_CHARS + 1);
        assert!(matches!(
            s.apply(SetupEvent::SetDescription(&long)),
            Outcome::Rejected(_)
        ));
        assert_eq!(s.step, SetupStep::AwaitingDescription);
        assert!(s.description.is_none());

        let exact = "x".repeat(zonix_core::catalog::DESCRIPTION_MAX_CHARS);
        assert_eq!(s.apply(SetupEvent::SetDescription(&exact)), Outcome::Advanced);
    }

    #[test]
    fn description_too_short_is_rejected() {
        let mut s = session_at_thematic();
        s.apply(SetupEvent::ToggleThematic("nft"));
        s.apply(SetupEvent::NextFromThematic);
        s.apply(SetupEvent::NextFromFormat);

        assert!(matches!(
            s.apply(SetupEvent::SetDescription("short")),
            Outcome::Rejected(_)
        ));
        assert_eq!(s.step, SetupStep::AwaitingDescription);
    }

    #[test]
    fn restart_only_from_confirmation() {
        let mut s = session_at_thematic();
        assert_eq!(s.apply(SetupEvent::Restart), Outcome::Ignored);

        let mut s = session_at_confirm();
        assert_eq!(s.apply(SetupEvent::Restart), Outcome::Advanced);
        assert_eq!(s.step, SetupStep::SelectingCategory);
        assert!(s.category.is_none());
        assert!(s.thematic_tags.is_empty());
        assert!(s.format_tags.is_empty());
        assert!(s.description.is_none());
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        let mut s = SetupSession::new(-100);
        assert_eq!(s.apply(SetupEvent::ToggleThematic("bitcoin")), Outcome::Ignored);
        assert_eq!(s.apply(SetupEvent::SetDescription("whatever text")), Outcome::Ignored);
        assert_eq!(s.apply(SetupEvent::NextFromFormat), Outcome::Ignored);
        assert_eq!(s.step, SetupStep::SelectingCategory);
    }

    #[test]
    fn page_selection_is_clamped() {
        let mut s = session_at_thematic();
        s.apply(SetupEvent::ThematicPage(99));
        // Crypto has 5 tags and the page size is 8, so only page 0 exists.
        assert_eq!(s.thematic_page, 0);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 8), 0);
        assert_eq!(page_count(5, 8), 1);
        assert_eq!(page_count(8, 8), 1);
        assert_eq!(page_count(9, 8), 2);
        assert_eq!(page_count(17, 8), 3);
    }
}
