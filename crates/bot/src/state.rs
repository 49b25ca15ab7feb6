use std::time::Duration;

use teloxide::Bot;

use crate::{client::ApiClient, session::SessionStore, store::ChannelStore};

/// Shared runtime state for all update handlers and background loops.
///
/// The session and channel maps are internally synchronized; handlers run on
/// a multi-threaded runtime and must not assume single-threaded mutation.
pub struct BotContext {
    pub bot: Bot,
    pub api: ApiClient,
    pub sessions: SessionStore,
    pub channels: ChannelStore,
    pub session_ttl: Duration,
}
