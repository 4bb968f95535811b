//! Telegram adapter: the relay transport and the bot dispatcher.
//!
//! [`TelegramTransport`] keeps the live routes (one per subscribed edge) and
//! delivers inbound channel posts and group messages to every route whose
//! source chat matches. [`run_telegram`] drives the teloxide event loop,
//! sending commands from private chats to the [`CommandRouter`] and
//! everything else to the transport.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::commands::CommandRouter;
use crate::relay::{EdgeKey, RelayHandler, Subscription, Transport, TransportError};

pub mod target;
pub mod ui;

pub use target::ChatTarget;

/// A live route from a source chat to a handler.
#[derive(Clone)]
struct Route {
    source: ChatTarget,
    handler: Arc<dyn RelayHandler>,
}

/// [`Transport`] backed by a Telegram bot.
pub struct TelegramTransport {
    bot: Bot,
    routes: RwLock<BTreeMap<EdgeKey, Route>>,
}

impl TelegramTransport {
    /// Transport sending through `bot`.
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            routes: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of active routes.
    pub async fn route_count(&self) -> usize {
        self.routes.read().await.len()
    }

    /// Run every route whose source is the given chat and send the results.
    ///
    /// Failures are logged per route and never stop the other routes.
    pub async fn deliver(&self, chat: ChatId, username: Option<&str>, text: &str) {
        let matching: Vec<(EdgeKey, Arc<dyn RelayHandler>)> = self
            .routes
            .read()
            .await
            .iter()
            .filter(|(_, route)| route.source.matches(chat, username))
            .map(|(key, route)| (key.clone(), Arc::clone(&route.handler)))
            .collect();

        if matching.is_empty() {
            debug!(chat = chat.0, "no route for chat");
            return;
        }

        for (key, handler) in matching {
            match handler.handle(text).await {
                Ok(Some(out)) => {
                    if let Err(e) = self.send_message(&out.url, &out.text).await {
                        warn!(key = %key, error = %e, "failed to relay message");
                    } else {
                        debug!(key = %key, "message relayed");
                    }
                }
                Ok(None) => debug!(key = %key, "message suppressed"),
                Err(e) => warn!(key = %key, error = %e, "relay handler failed"),
            }
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn subscribe(&self, subscription: &Subscription) -> Result<(), TransportError> {
        let source = ChatTarget::parse(&subscription.source_url)?;
        ChatTarget::parse(&subscription.output_url)?;

        let mut routes = self.routes.write().await;
        if routes.contains_key(&subscription.key) {
            return Err(TransportError::AlreadySubscribed {
                key: subscription.key.clone(),
            });
        }
        routes.insert(
            subscription.key.clone(),
            Route {
                source,
                handler: Arc::clone(&subscription.handler),
            },
        );
        Ok(())
    }

    async fn unsubscribe(&self, subscription: &Subscription) -> Result<(), TransportError> {
        match self.routes.write().await.remove(&subscription.key) {
            Some(_) => Ok(()),
            None => Err(TransportError::NotSubscribed {
                key: subscription.key.clone(),
            }),
        }
    }

    async fn send_message(&self, url: &str, text: &str) -> Result<(), TransportError> {
        let target = ChatTarget::parse(url)?;
        self.bot
            .send_message(target.recipient(), text)
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Shared dependencies injected into teloxide handlers via `dptree::deps!`.
#[derive(Clone)]
struct SharedState {
    transport: Arc<TelegramTransport>,
    router: Arc<CommandRouter>,
}

/// Run the bot until Ctrl+C.
///
/// Updates are processed one at a time so commands and relayed messages never
/// interleave.
pub async fn run_telegram(
    bot: Bot,
    transport: Arc<TelegramTransport>,
    router: Arc<CommandRouter>,
) -> anyhow::Result<()> {
    let shared = SharedState { transport, router };

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_channel_post().endpoint(handle_channel_post));

    info!("telegram dispatcher starting");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![shared])
        .distribution_function(|_| Some(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Where an inbound group or private message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundRoute {
    /// Run it through the [`CommandRouter`] and reply in the same chat.
    Command,
    /// Hand it to the transport as relay input.
    Relay,
}

/// Pick the route for a message.
///
/// Commands are only taken from private chats with the bot. A `/`-prefixed
/// message in a group is ordinary content of that chat and is relayed.
pub fn route_inbound(private_chat: bool, text: &str) -> InboundRoute {
    if private_chat && text.starts_with('/') {
        InboundRoute::Command
    } else {
        InboundRoute::Relay
    }
}

/// Group and private messages: admin commands or relay input.
async fn handle_message(bot: Bot, msg: Message, state: SharedState) -> ResponseResult<()> {
    let Some(text) = msg.text().or_else(|| msg.caption()) else {
        return Ok(());
    };

    if route_inbound(msg.chat.is_private(), text) == InboundRoute::Command {
        let Some(user) = msg.from.as_ref() else {
            return Ok(());
        };
        let caller = i64::try_from(user.id.0).unwrap_or(0);
        let reply = state.router.dispatch(caller, text).await;
        bot.send_message(msg.chat.id, reply)
            .parse_mode(ParseMode::Html)
            .await?;
        return Ok(());
    }

    state
        .transport
        .deliver(msg.chat.id, msg.chat.username(), text)
        .await;
    Ok(())
}

/// Channel posts are always relay input.
async fn handle_channel_post(msg: Message, state: SharedState) -> ResponseResult<()> {
    if let Some(text) = msg.text().or_else(|| msg.caption()) {
        state
            .transport
            .deliver(msg.chat.id, msg.chat.username(), text)
            .await;
    }
    Ok(())
}
