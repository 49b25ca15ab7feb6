//! Inline keyboard builders for the wizard and channel list.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use zonix_core::catalog;

use crate::store::TrackedChannel;
use crate::wizard::{self, SetupSession};

pub fn category_keyboard() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = catalog::CATEGORIES
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|cat| {
                    InlineKeyboardButton::callback(
                        format!("{} {}", cat.emoji, cat.name),
                        format!("cat_{}", cat.name),
                    )
                })
                .collect()
        })
        .collect();
    rows.push(vec![cancel_button()]);
    InlineKeyboardMarkup::new(rows)
}

pub fn thematic_keyboard(session: &SetupSession) -> InlineKeyboardMarkup {
    let candidates = catalog::thematic_tags(session.category.as_deref().unwrap_or_default());
    let pages = wizard::page_count(candidates.len(), catalog::TAG_PAGE_SIZE);
    let page = session.thematic_page.min(pages.saturating_sub(1));
    let window = page_window(candidates, page, catalog::TAG_PAGE_SIZE);

    let mut rows: Vec<Vec<InlineKeyboardButton>> = window
        .iter()
        .map(|&tag| {
            let selected = session.thematic_tags.iter().any(|t| t == tag);
            vec![tag_button(tag, selected, "them_")]
        })
        .collect();

    if pages > 1 {
        let mut nav = Vec::new();
        if page > 0 {
            nav.push(InlineKeyboardButton::callback(
                "⬅️",
                format!("them_page_{}", page - 1),
            ));
        }
        if page + 1 < pages {
            nav.push(InlineKeyboardButton::callback(
                "➡️",
                format!("them_page_{}", page + 1),
            ));
        }
        rows.push(nav);
    }

    if !session.thematic_tags.is_empty() {
        rows.push(vec![InlineKeyboardButton::callback("✅ Next", "them_done")]);
    }
    rows.push(vec![cancel_button()]);
    InlineKeyboardMarkup::new(rows)
}

pub fn format_keyboard(session: &SetupSession) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = catalog::FORMAT_TAGS
        .iter()
        .map(|&tag| {
            let selected = session.format_tags.iter().any(|t| t == tag);
            vec![tag_button(tag, selected, "fmt_")]
        })
        .collect();

    // This stage is optional, so Next is always available.
    rows.push(vec![InlineKeyboardButton::callback("✅ Next", "fmt_done")]);
    rows.push(vec![cancel_button()]);
    InlineKeyboardMarkup::new(rows)
}

pub fn confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "✅ Publish",
            "confirm_publish",
        )],
        vec![InlineKeyboardButton::callback(
            "🔄 Start over",
            "restart_setup",
        )],
        vec![cancel_button()],
    ])
}

pub fn channel_list_keyboard(channels: &[TrackedChannel]) -> InlineKeyboardMarkup {
    let rows = channels
        .iter()
        .map(|channel| {
            vec![InlineKeyboardButton::callback(
                format!("⚙️ {}", channel.title),
                format!("setup_{}", channel.channel_id),
            )]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// One-button prompt sent to the owner right after the bot is promoted.
pub fn setup_prompt_keyboard(channel_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "⚙️ Configure channel",
        format!("setup_{}", channel_id),
    )]])
}

pub fn start_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "📢 My channels",
            "show_channels",
        )],
        vec![InlineKeyboardButton::callback("ℹ️ How it works", "show_help")],
    ])
}

fn tag_button(tag: &str, selected: bool, prefix: &str) -> InlineKeyboardButton {
    let label = if selected {
        format!("• {tag}")
    } else {
        tag.to_string()
    };
    InlineKeyboardButton::callback(label, format!("{prefix}{tag}"))
}

fn cancel_button() -> InlineKeyboardButton {
    InlineKeyboardButton::callback("❌ Cancel", "cancel_setup")
}

pub fn page_window<'a>(items: &'a [&'a str], page: usize, page_size: usize) -> &'a [&'a str] {
    let start = (page * page_size).min(items.len());
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::SetupEvent;

    #[test]
    fn test_page_window() {
        let items: Vec<&str> = vec!["a", "b", "c", "d", "e"];
        assert_eq!(page_window(&items, 0, 2), &["a", "b"]);
        assert_eq!(page_window(&items, 1, 2), &["c", "d"]);
        assert_eq!(page_window(&items, 2, 2), &["e"]);
        assert!(page_window(&items, 3, 2).is_empty());
    }

    #[test]
    fn category_keyboard_pairs_buttons() {
        let keyboard = category_keyboard();
        // Two categories per row, plus the cancel row.
        let expected_rows = catalog::CATEGORIES.len().div_ceil(2) + 1;
        assert_eq!(keyboard.inline_keyboard.len(), expected_rows);
    }

    #[test]
    fn thematic_keyboard_hides_next_until_selection() {
        let mut session = SetupSession::new(-1);
        session.apply(SetupEvent::SelectCategory("Crypto"));

        let without = thematic_keyboard(&session);
        assert!(!keyboard_contains(&without, "them_done"));

        session.apply(SetupEvent::ToggleThematic("bitcoin"));
        let with = thematic_keyboard(&session);
        assert!(keyboard_contains(&with, "them_done"));
    }

    #[test]
    fn format_keyboard_always_offers_next() {
        let mut session = SetupSession::new(-1);
        session.apply(SetupEvent::SelectCategory("Crypto"));
        session.apply(SetupEvent::ToggleThematic("bitcoin"));
        session.apply(SetupEvent::NextFromThematic);

        assert!(keyboard_contains(&format_keyboard(&session), "fmt_done"));
    }

    #[test]
    fn format_keyboard_renders_full_list() {
        // One row per tag, plus the Next and Cancel rows.
        let mut session = SetupSession::new(-1);
        session.apply(SetupEvent::SelectCategory("Crypto"));
        let keyboard = format_keyboard(&session);
        assert_eq!(
            keyboard.inline_keyboard.len(),
            catalog::FORMAT_TAGS.len() + 2
        );
    }

    fn keyboard_contains(keyboard: &InlineKeyboardMarkup, data: &str) -> bool {
        keyboard.inline_keyboard.iter().flatten().any(|button| {
            matches!(
                &button.kind,
                teloxide::types::InlineKeyboardButtonKind::CallbackData(d) if d == data
            )
        })
    }
}
