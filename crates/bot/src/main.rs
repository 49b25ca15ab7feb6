use std::sync::Arc;
use std::time::Duration;

use teloxide::{
    prelude::*,
    types::{AllowedUpdate, BotCommand, UpdateKind},
};
use tracing::{debug, error, info, warn};

mod client;
mod collector;
mod handlers;
mod keyboards;
mod session;
mod state;
mod store;
mod wizard;

use crate::client::ApiClient;
use crate::session::SessionStore;
use crate::state::BotContext;
use crate::store::ChannelStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = zonix_core::config::BotSettings::from_env()?;

    let bot = Bot::new(settings.bot_token.clone());

    // Verify credentials and clear any webhook so long polling works.
    let me = bot.get_me().await?;
    bot.delete_webhook().send().await?;

    let commands = vec![
        BotCommand::new("start", "Getting started"),
        BotCommand::new("my_channels", "List and configure your channels"),
        BotCommand::new("help", "How to connect a channel"),
    ];
    if let Err(err) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {err}");
    }

    let ctx = Arc::new(BotContext {
        bot: bot.clone(),
        api: ApiClient::new(&settings.api_url, &settings.api_key)?,
        sessions: SessionStore::new(),
        channels: ChannelStore::new(),
        session_ttl: Duration::from_secs(settings.session_ttl_hours * 3600),
    });

    tokio::spawn(collector::refresh_loop(
        Arc::clone(&ctx),
        Duration::from_secs(settings.update_interval_hours * 3600),
    ));
    tokio::spawn(collector::session_sweep_loop(
        Arc::clone(&ctx),
        Duration::from_secs(3600),
    ));

    info!(
        username = ?me.username,
        refresh_hours = settings.update_interval_hours,
        "bot connected (webhook cleared)"
    );

    let mut offset: i32 = 0;
    loop {
        let result = bot
            .get_updates()
            .offset(offset)
            .timeout(30)
            .allowed_updates(vec![
                AllowedUpdate::Message,
                AllowedUpdate::CallbackQuery,
                AllowedUpdate::MyChatMember,
            ])
            .await;

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    match update.kind {
                        UpdateKind::Message(msg) => {
                            if let Err(err) = handlers::handle_message(&ctx, msg).await {
                                error!(error = %err, "error handling message");
                            }
                        }
                        UpdateKind::CallbackQuery(query) => {
                            if let Err(err) = handlers::handle_callback(&ctx, query).await {
                                error!(error = %err, "error handling callback query");
                            }
                        }
                        UpdateKind::MyChatMember(update) => {
                            if let Err(err) =
                                collector::handle_membership_update(&ctx, update).await
                            {
                                error!(error = %err, "error handling membership update");
                            }
                        }
                        _ => {}
                    }
                }
            }
            Err(err) => {
                error!(error = %err, "get_updates failed");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}
