//! Channel stats collection: admin-promotion events and the periodic
//! subscriber refresh.

use std::sync::Arc;
use std::time::Duration;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::*,
    types::{Chat, ChatMemberUpdated, ParseMode},
};
use tracing::{info, warn};

use crate::client::SaveChannelRequest;
use crate::handlers::escape_html;
use crate::keyboards;
use crate::state::BotContext;
use crate::store::TrackedChannel;

/// React to the bot's own membership changes in channels.
///
/// Promotion to administrator registers a draft channel and prompts the
/// owner; leaving or being kicked removes the channel locally and remotely.
/// Transport failures are logged and dropped; a channel that cannot be
/// inspected is simply not registered.
pub async fn handle_membership_update(
    ctx: &BotContext,
    update: ChatMemberUpdated,
) -> anyhow::Result<()> {
    let chat = &update.chat;
    if !chat.is_channel() {
        return Ok(());
    }

    let owner_id = update.from.id;
    let new = &update.new_chat_member;

    if new.is_administrator() {
        info!(chat_id = chat.id.0, title = ?chat.title(), "promoted to administrator");

        let tracked = match fetch_channel_stats(&ctx.bot, chat).await {
            Ok(tracked) => tracked,
            Err(err) => {
                warn!(chat_id = chat.id.0, error = %err, "failed to fetch channel stats");
                return Ok(());
            }
        };

        ctx.channels.upsert(owner_id.0, tracked.clone());

        let request = SaveChannelRequest {
            channel_id: tracked.channel_id,
            title: &tracked.title,
            username: tracked.username.as_deref(),
            subscribers_count: tracked.subscribers_count,
            photo_url: None,
            owner_telegram_id: owner_id.0 as i64,
            is_published: false,
        };
        if let Err(err) = ctx.api.save_channel(&request).await {
            warn!(channel_id = tracked.channel_id, error = %err, "failed to persist draft channel");
        }

        let text = format!(
            "✅ <b>Channel connected!</b>\n\n\
             📢 <b>{}</b>\n\
             👥 Subscribers: <b>{}</b>\n\
             🔗 Username: {}\n\n\
             Use /my_channels to configure and publish it.",
            escape_html(&tracked.title),
            tracked.subscribers_count,
            tracked
                .username
                .as_deref()
                .map(|u| format!("@{u}"))
                .unwrap_or_else(|| "private".to_string()),
        );
        if let Err(err) = ctx
            .bot
            .send_message(ChatId(owner_id.0 as i64), text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::setup_prompt_keyboard(tracked.channel_id))
            .await
        {
            warn!(user_id = owner_id.0, error = %err, "failed to notify channel owner");
        }
    } else if new.is_left() || new.is_banned() {
        info!(chat_id = chat.id.0, title = ?chat.title(), "removed from channel");

        ctx.channels.remove(chat.id.0);
        if let Err(err) = ctx.api.delete_channel(chat.id.0).await {
            warn!(channel_id = chat.id.0, error = %err, "failed to delete channel record");
        }
    }

    Ok(())
}

/// Build a draft record from the promotion event's chat plus a fresh member
/// count. Channel photos are not fetched.
pub async fn fetch_channel_stats(
    bot: &Bot,
    chat: &Chat,
) -> Result<TrackedChannel, teloxide::RequestError> {
    let subscribers = bot.get_chat_member_count(chat.id).await?;
    Ok(TrackedChannel {
        channel_id: chat.id.0,
        title: chat.title().unwrap_or_default().to_string(),
        username: chat.username().map(|u| u.to_string()),
        subscribers_count: subscribers as i32,
        is_published: false,
    })
}

/// Re-push subscriber counts for published channels on a fixed interval.
pub async fn refresh_loop(ctx: Arc<BotContext>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // interval fires immediately; the first refresh should wait a full period
    ticker.tick().await;
    loop {
        ticker.tick().await;
        refresh_published(&ctx).await;
    }
}

/// Sequential per-channel refresh with a fixed 1 s spacing to stay under the
/// transport's rate limits. Failures skip the channel until the next cycle.
pub async fn refresh_published(ctx: &BotContext) {
    let published = ctx.channels.published_channels();
    info!(count = published.len(), "refreshing published channels");

    for (owner_id, channel) in published {
        match ctx.bot.get_chat_member_count(ChatId(channel.channel_id)).await {
            Ok(count) => {
                let count = count as i32;
                ctx.channels.update_subscribers(channel.channel_id, count);

                let request = SaveChannelRequest {
                    channel_id: channel.channel_id,
                    title: &channel.title,
                    username: channel.username.as_deref(),
                    subscribers_count: count,
                    photo_url: None,
                    owner_telegram_id: owner_id as i64,
                    is_published: true,
                };
                if let Err(err) = ctx.api.save_channel(&request).await {
                    warn!(channel_id = channel.channel_id, error = %err, "failed to push refreshed stats");
                }
            }
            Err(err) => {
                warn!(channel_id = channel.channel_id, error = %err, "failed to fetch member count");
            }
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

/// Evict wizard sessions that have been idle past their TTL.
pub async fn session_sweep_loop(ctx: Arc<BotContext>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let swept = ctx.sessions.sweep_expired(ctx.session_ttl);
        if swept > 0 {
            info!(swept, "evicted idle wizard sessions");
        }
    }
}
