//! Command, text, and callback handling for the setup bot.

use teloxide::{
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters, SendMessageSetters},
    prelude::*,
    types::{
        CallbackQuery, InlineKeyboardMarkup, MaybeInaccessibleMessage, Message, MessageId,
        ParseMode, User,
    },
};
use tracing::warn;

use zonix_core::catalog;

use crate::client::UpdateStatsRequest;
use crate::keyboards;
use crate::state::BotContext;
use crate::store::TrackedChannel;
use crate::wizard::{Outcome, SetupEvent, SetupSession, SetupStep};

/// Actions encoded in inline-button callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction<'a> {
    ShowChannels,
    ShowHelp,
    Setup(i64),
    SelectCategory(&'a str),
    ToggleThematic(&'a str),
    ThematicPage(usize),
    ThematicDone,
    ToggleFormat(&'a str),
    FormatDone,
    ConfirmPublish,
    RestartSetup,
    CancelSetup,
}

pub fn parse_callback(data: &str) -> Option<CallbackAction<'_>> {
    match data {
        "show_channels" => return Some(CallbackAction::ShowChannels),
        "show_help" => return Some(CallbackAction::ShowHelp),
        "them_done" => return Some(CallbackAction::ThematicDone),
        "fmt_done" => return Some(CallbackAction::FormatDone),
        "confirm_publish" => return Some(CallbackAction::ConfirmPublish),
        "restart_setup" => return Some(CallbackAction::RestartSetup),
        "cancel_setup" => return Some(CallbackAction::CancelSetup),
        _ => {}
    }
    if let Some(rest) = data.strip_prefix("setup_") {
        return rest.parse().ok().map(CallbackAction::Setup);
    }
    if let Some(rest) = data.strip_prefix("cat_") {
        return Some(CallbackAction::SelectCategory(rest));
    }
    if let Some(rest) = data.strip_prefix("them_page_") {
        return rest.parse().ok().map(CallbackAction::ThematicPage);
    }
    if let Some(rest) = data.strip_prefix("them_") {
        return Some(CallbackAction::ToggleThematic(rest));
    }
    if let Some(rest) = data.strip_prefix("fmt_") {
        return Some(CallbackAction::ToggleFormat(rest));
    }
    None
}

pub async fn handle_message(ctx: &BotContext, msg: Message) -> anyhow::Result<()> {
    if !msg.chat.is_private() {
        return Ok(());
    }
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    match command(text) {
        Some("start") => send_welcome(ctx, chat_id, &user).await,
        Some("my_channels") => show_my_channels(ctx, chat_id, &user).await,
        Some("help") => send_help(ctx, chat_id).await,
        Some(_) => {}
        None => handle_description_input(ctx, chat_id, &user, text).await,
    }

    Ok(())
}

/// Extract a bot command name, tolerating the `/cmd@botname` form.
fn command(text: &str) -> Option<&str> {
    let rest = text.trim().strip_prefix('/')?;
    let cmd = rest.split_whitespace().next()?;
    Some(cmd.split('@').next().unwrap_or(cmd))
}

async fn send_welcome(ctx: &BotContext, chat_id: ChatId, user: &User) {
    let text = format!(
        "👋 Hi, <b>{}</b>!\n\n\
         I catalogue Telegram channels. Add me as an administrator of your \
         channel and I will collect its stats and help you publish it.\n\n\
         📌 <b>Getting started:</b>\n\
         1. Open your channel settings\n\
         2. Administrators → Add administrator\n\
         3. Grant me \"View channel stats\"\n\
         4. Come back here and run /my_channels",
        escape_html(&user.first_name),
    );
    send_html(ctx, chat_id, text, Some(keyboards::start_keyboard())).await;
}

async fn send_help(ctx: &BotContext, chat_id: ChatId) {
    let text = format!(
        "📖 <b>How it works</b>\n\n\
         <b>1. Connect a channel</b> — add me as an administrator with the \
         \"View channel stats\" right.\n\
         <b>2. Configure it</b> — run /my_channels, pick the channel, choose \
         a category, up to {} topic tags and up to {} format tags, then write \
         a description ({}–{} characters).\n\
         <b>3. Publish</b> — confirm the preview and the channel goes live in \
         the catalog. Subscriber counts refresh automatically.\n\n\
         <b>Commands:</b>\n\
         /start — getting started\n\
         /my_channels — your channels\n\
         /help — this message",
        catalog::MAX_THEMATIC_TAGS,
        catalog::MAX_FORMAT_TAGS,
        catalog::DESCRIPTION_MIN_CHARS,
        catalog::DESCRIPTION_MAX_CHARS,
    );
    send_html(ctx, chat_id, text, None).await;
}

async fn show_my_channels(ctx: &BotContext, chat_id: ChatId, user: &User) {
    let user_id = user.id.0;

    // Refresh the local view from the API; keep the cached slice on failure.
    match ctx.api.channels_for_owner(user_id).await {
        Ok(records) => {
            let channels = records
                .into_iter()
                .map(|r| TrackedChannel {
                    channel_id: r.channel_id,
                    title: r.title,
                    username: r.username,
                    subscribers_count: r.subscribers_count,
                    is_published: r.is_published,
                })
                .collect();
            ctx.channels.replace_owner(user_id, channels);
        }
        Err(err) => warn!(user_id, error = %err, "could not load channels from api"),
    }

    let channels = ctx.channels.channels_for(user_id);
    if channels.is_empty() {
        let text = "📭 <b>No connected channels</b>\n\n\
                    Add me as an administrator of your channel with the \
                    \"View channel stats\" right, then come back here."
            .to_string();
        send_html(ctx, chat_id, text, None).await;
        return;
    }

    let mut text = format!("📢 <b>Your channels ({}):</b>\n\n", channels.len());
    for (index, channel) in channels.iter().enumerate() {
        let status = if channel.is_published {
            "✅ Published"
        } else {
            "⚪ Not published"
        };
        text.push_str(&format!(
            "{}. <b>{}</b>\n   👥 {} subscribers\n   📊 {}\n\n",
            index + 1,
            escape_html(&channel.title),
            channel.subscribers_count,
            status,
        ));
    }
    send_html(
        ctx,
        chat_id,
        text,
        Some(keyboards::channel_list_keyboard(&channels)),
    )
    .await;
}

async fn handle_description_input(ctx: &BotContext, chat_id: ChatId, user: &User, text: &str) {
    let Some((outcome, session)) = ctx
        .sessions
        .with(user.id.0, |s| (s.apply(SetupEvent::SetDescription(text)), s.clone()))
    else {
        return;
    };

    match outcome {
        Outcome::Advanced => {
            let Some(channel) = ctx.channels.find(user.id.0, session.channel_id) else {
                send_html(
                    ctx,
                    chat_id,
                    "⚠️ Channel data is gone, start again with /my_channels".to_string(),
                    None,
                )
                .await;
                ctx.sessions.remove(user.id.0);
                return;
            };
            send_html(
                ctx,
                chat_id,
                preview_text(&channel, &session),
                Some(keyboards::confirm_keyboard()),
            )
            .await;
        }
        Outcome::Rejected(warning) => {
            send_html(ctx, chat_id, format!("⚠️ {warning}"), None).await;
        }
        // Plain chatter outside the description step.
        Outcome::Updated | Outcome::Ignored => {}
    }
}

pub async fn handle_callback(ctx: &BotContext, query: CallbackQuery) -> anyhow::Result<()> {
    let user = query.from.clone();
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(user.id.0 as i64));

    let data = query.data.clone().unwrap_or_default();
    let Some(action) = parse_callback(&data) else {
        answer(ctx, &query, None, false).await;
        return Ok(());
    };

    match action {
        CallbackAction::ShowChannels => {
            answer(ctx, &query, None, false).await;
            show_my_channels(ctx, chat_id, &user).await;
        }
        CallbackAction::ShowHelp => {
            answer(ctx, &query, None, false).await;
            send_help(ctx, chat_id).await;
        }
        CallbackAction::Setup(channel_id) => {
            start_setup(ctx, &query, &user, channel_id).await;
        }
        CallbackAction::SelectCategory(name) => {
            apply_and_render(ctx, &query, &user, SetupEvent::SelectCategory(name)).await;
        }
        CallbackAction::ToggleThematic(tag) => {
            apply_and_render(ctx, &query, &user, SetupEvent::ToggleThematic(tag)).await;
        }
        CallbackAction::ThematicPage(page) => {
            apply_and_render(ctx, &query, &user, SetupEvent::ThematicPage(page)).await;
        }
        CallbackAction::ThematicDone => {
            apply_and_render(ctx, &query, &user, SetupEvent::NextFromThematic).await;
        }
        CallbackAction::ToggleFormat(tag) => {
            apply_and_render(ctx, &query, &user, SetupEvent::ToggleFormat(tag)).await;
        }
        CallbackAction::FormatDone => {
            apply_and_render(ctx, &query, &user, SetupEvent::NextFromFormat).await;
        }
        CallbackAction::ConfirmPublish => {
            publish(ctx, &query, &user).await;
        }
        CallbackAction::RestartSetup => {
            apply_and_render(ctx, &query, &user, SetupEvent::Restart).await;
        }
        CallbackAction::CancelSetup => {
            ctx.sessions.remove(user.id.0);
            answer(ctx, &query, Some("Setup cancelled"), false).await;
            send_html(
                ctx,
                chat_id,
                "❌ Setup cancelled. Run /my_channels to start again.".to_string(),
                None,
            )
            .await;
        }
    }

    Ok(())
}

async fn start_setup(ctx: &BotContext, query: &CallbackQuery, user: &User, channel_id: i64) {
    let user_id = user.id.0;

    let mut channel = ctx.channels.find(user_id, channel_id);
    if channel.is_none() {
        // The store is empty after a restart; fall back to the API.
        if let Ok(records) = ctx.api.channels_for_owner(user_id).await {
            let channels: Vec<TrackedChannel> = records
                .into_iter()
                .map(|r| TrackedChannel {
                    channel_id: r.channel_id,
                    title: r.title,
                    username: r.username,
                    subscribers_count: r.subscribers_count,
                    is_published: r.is_published,
                })
                .collect();
            ctx.channels.replace_owner(user_id, channels);
            channel = ctx.channels.find(user_id, channel_id);
        }
    }

    let Some(channel) = channel else {
        answer(
            ctx,
            query,
            Some("Channel not found. The bot may have been removed from its admins."),
            true,
        )
        .await;
        return;
    };

    ctx.sessions.put(user_id, SetupSession::new(channel_id));
    answer(ctx, query, None, false).await;

    let text = format!(
        "⚙️ <b>Channel setup</b>\n\n\
         📢 <b>{}</b>\n\
         👥 {} subscribers\n\n\
         <b>📂 Step 1/4: Pick a category</b>",
        escape_html(&channel.title),
        channel.subscribers_count,
    );
    render_step(ctx, query, text, Some(keyboards::category_keyboard())).await;
}

/// Feed one event into the user's session and redraw the wizard message.
async fn apply_and_render(
    ctx: &BotContext,
    query: &CallbackQuery,
    user: &User,
    event: SetupEvent<'_>,
) {
    let user_id = user.id.0;
    let Some((outcome, session)) = ctx
        .sessions
        .with(user_id, |s| (s.apply(event), s.clone()))
    else {
        answer(
            ctx,
            query,
            Some("Session expired, start again with /my_channels"),
            true,
        )
        .await;
        return;
    };

    match outcome {
        Outcome::Advanced | Outcome::Updated => {
            answer(ctx, query, None, false).await;
            render_current_step(ctx, query, user_id, &session).await;
        }
        Outcome::Rejected(warning) => {
            answer(ctx, query, Some(warning.as_str()), true).await;
        }
        // Stale buttons from an earlier step; leave the message alone.
        Outcome::Ignored => {
            answer(ctx, query, None, false).await;
        }
    }
}

async fn render_current_step(
    ctx: &BotContext,
    query: &CallbackQuery,
    user_id: u64,
    session: &SetupSession,
) {
    match session.step {
        SetupStep::SelectingCategory => {
            render_step(
                ctx,
                query,
                "<b>📂 Step 1/4: Pick a category</b>".to_string(),
                Some(keyboards::category_keyboard()),
            )
            .await;
        }
        SetupStep::SelectingThematicTags => {
            let text = format!(
                "<b>🏷 Step 2/4: Topics</b>\n\n\
                 Category: <b>{}</b>\n\
                 Selected: <b>{}/{}</b>",
                escape_html(session.category.as_deref().unwrap_or_default()),
                session.thematic_tags.len(),
                catalog::MAX_THEMATIC_TAGS,
            );
            render_step(ctx, query, text, Some(keyboards::thematic_keyboard(session))).await;
        }
        SetupStep::SelectingFormatTags => {
            let text = format!(
                "<b>📋 Step 3/4: Formats</b>\n\n\
                 Selected: <b>{}/{}</b>\n\
                 This step is optional.",
                session.format_tags.len(),
                catalog::MAX_FORMAT_TAGS,
            );
            render_step(ctx, query, text, Some(keyboards::format_keyboard(session))).await;
        }
        SetupStep::AwaitingDescription => {
            let text = format!(
                "<b>📝 Step 4/4: Description</b>\n\n\
                 Send the channel description as a message \
                 ({}–{} characters).",
                catalog::DESCRIPTION_MIN_CHARS,
                catalog::DESCRIPTION_MAX_CHARS,
            );
            render_step(ctx, query, text, None).await;
        }
        SetupStep::ReadyToConfirm => {
            if let Some(channel) = ctx.channels.find(user_id, session.channel_id) {
                render_step(
                    ctx,
                    query,
                    preview_text(&channel, session),
                    Some(keyboards::confirm_keyboard()),
                )
                .await;
            }
        }
    }
}

async fn publish(ctx: &BotContext, query: &CallbackQuery, user: &User) {
    let user_id = user.id.0;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(user_id as i64));

    let Some(session) = ctx.sessions.get(user_id) else {
        answer(
            ctx,
            query,
            Some("Session expired, start again with /my_channels"),
            true,
        )
        .await;
        return;
    };
    if session.step != SetupStep::ReadyToConfirm {
        answer(ctx, query, None, false).await;
        return;
    }

    let Some(channel) = ctx.channels.find(user_id, session.channel_id) else {
        answer(ctx, query, Some("Channel data is gone, start again"), true).await;
        return;
    };

    answer(ctx, query, None, false).await;
    send_html(ctx, chat_id, "⏳ Publishing…".to_string(), None).await;

    let categories = vec![session.category.clone().unwrap_or_default()];
    let request = UpdateStatsRequest {
        channel_id: channel.channel_id,
        title: &channel.title,
        username: channel.username.as_deref(),
        description: session.description.as_deref(),
        subscribers_count: channel.subscribers_count,
        photo_url: None,
        categories: &categories,
        thematic_tags: &session.thematic_tags,
        format_tags: &session.format_tags,
        owner_telegram_id: user_id as i64,
        owner_username: user.username.as_deref(),
        is_published: true,
    };

    match ctx.api.publish_channel(&request).await {
        Ok(()) => {
            // Not atomic with the API call; a crash here leaves the remote
            // record published and the local one stale until restart.
            ctx.channels.mark_published(user_id, channel.channel_id);
            ctx.sessions.remove(user_id);
            let text = format!(
                "✅ <b>Channel published!</b>\n\n\
                 📢 {}\n\
                 👥 {} subscribers\n\n\
                 It is now visible in the catalog. Subscriber counts refresh \
                 automatically.",
                escape_html(&channel.title),
                channel.subscribers_count,
            );
            send_html(ctx, chat_id, text, None).await;
        }
        Err(err) => {
            // Session stays open so the user can retry.
            let text = format!(
                "❌ Failed to publish the channel:\n{}\n\nTry again later.",
                escape_html(&err.to_string()),
            );
            send_html(ctx, chat_id, text, None).await;
        }
    }
}

fn preview_text(channel: &TrackedChannel, session: &SetupSession) -> String {
    format!(
        "📋 <b>Preview</b>\n\n\
         📢 <b>{}</b>\n\
         👥 {} subscribers\n\
         🔗 {}\n\n\
         📂 {}\n\
         🏷 {}\n\
         📋 {}\n\n\
         📝 {}\n\n\
         Everything correct?",
        escape_html(&channel.title),
        channel.subscribers_count,
        channel
            .username
            .as_deref()
            .map(|u| format!("@{u}"))
            .unwrap_or_else(|| "private channel".to_string()),
        escape_html(session.category.as_deref().unwrap_or_default()),
        escape_html(&session.thematic_tags.join(", ")),
        escape_html(&session.format_tags.join(", ")),
        escape_html(session.description.as_deref().unwrap_or_default()),
    )
}

/// Edit the wizard message in place, falling back to a fresh message when
/// the original cannot be edited. Send failures are logged and swallowed;
/// they never affect session state.
async fn render_step(
    ctx: &BotContext,
    query: &CallbackQuery,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) {
    if let Some(message) = &query.message {
        let (chat_id, message_id) = message_ref(message);

        let mut edit = ctx
            .bot
            .edit_message_text(chat_id, message_id, text.as_str())
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard.clone() {
            edit = edit.reply_markup(keyboard);
        }
        if edit.await.is_ok() {
            return;
        }
        send_html(ctx, chat_id, text, keyboard).await;
    } else {
        let chat_id = ChatId(query.from.id.0 as i64);
        send_html(ctx, chat_id, text, keyboard).await;
    }
}

fn message_ref(message: &MaybeInaccessibleMessage) -> (ChatId, MessageId) {
    match message {
        MaybeInaccessibleMessage::Regular(msg) => (msg.chat.id, msg.id),
        MaybeInaccessibleMessage::Inaccessible(msg) => (msg.chat.id, msg.message_id),
    }
}

async fn send_html(
    ctx: &BotContext,
    chat_id: ChatId,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) {
    let mut req = ctx
        .bot
        .send_message(chat_id, text)
        .parse_mode(ParseMode::Html);
    if let Some(keyboard) = keyboard {
        req = req.reply_markup(keyboard);
    }
    if let Err(err) = req.await {
        warn!(chat_id = chat_id.0, error = %err, "failed to send message");
    }
}

async fn answer(ctx: &BotContext, query: &CallbackQuery, text: Option<&str>, alert: bool) {
    let mut req = ctx.bot.answer_callback_query(&query.id);
    if let Some(text) = text {
        req = req.text(text);
    }
    if alert {
        req = req.show_alert(true);
    }
    if let Err(err) = req.await {
        warn!(error = %err, "failed to answer callback query");
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback_static_actions() {
        assert_eq!(parse_callback("show_channels"), Some(CallbackAction::ShowChannels));
        assert_eq!(parse_callback("show_help"), Some(CallbackAction::ShowHelp));
        assert_eq!(parse_callback("them_done"), Some(CallbackAction::ThematicDone));
        assert_eq!(parse_callback("fmt_done"), Some(CallbackAction::FormatDone));
        assert_eq!(parse_callback("confirm_publish"), Some(CallbackAction::ConfirmPublish));
        assert_eq!(parse_callback("restart_setup"), Some(CallbackAction::RestartSetup));
        assert_eq!(parse_callback("cancel_setup"), Some(CallbackAction::CancelSetup));
    }

    #[test]
    fn test_parse_callback_setup_carries_channel_id() {
        assert_eq!(
            parse_callback("setup_-1001234567890"),
            Some(CallbackAction::Setup(-1001234567890))
        );
        assert_eq!(parse_callback("setup_garbage"), None);
    }

    #[test]
    fn test_parse_callback_tags() {
        assert_eq!(
            parse_callback("cat_Technology"),
            Some(CallbackAction::SelectCategory("Technology"))
        );
        assert_eq!(
            parse_callback("them_bitcoin"),
            Some(CallbackAction::ToggleThematic("bitcoin"))
        );
        assert_eq!(
            parse_callback("fmt_analytics"),
            Some(CallbackAction::ToggleFormat("analytics"))
        );
    }

    #[test]
    fn test_parse_callback_page_before_tag_prefix() {
        // them_page_N must not be parsed as a tag named "page_N"
        assert_eq!(
            parse_callback("them_page_2"),
            Some(CallbackAction::ThematicPage(2))
        );
    }

    #[test]
    fn test_parse_callback_unknown() {
        assert_eq!(parse_callback(""), None);
        assert_eq!(parse_callback("bogus"), None);
        assert_eq!(parse_callback("them_page_x"), None);
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(command("/start"), Some("start"));
        assert_eq!(command("/my_channels"), Some("my_channels"));
        assert_eq!(command("/help@zonix_bot"), Some("help"));
        assert_eq!(command("/start some args"), Some("start"));
        assert_eq!(command("not a command"), None);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_html("plain"), "plain");
    }
}
