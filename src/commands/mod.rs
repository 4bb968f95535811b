//! Administrative command surface.
//!
//! [`CommandRouter::dispatch`] authorizes the caller, parses the command text,
//! runs the matching handler, and renders the HTML reply. Failures become
//! `Error: ...` replies; failures that leave live subscriptions out of step
//! with the stored graph also tell the admin to run `/sync`.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::relay::GraphSync;
use crate::store::{FilterMode, RelayStore};
use crate::telegram::ui::escape_html;

pub mod handlers;
pub mod parse;

pub use parse::{parse_command, CommandError, ParsedCommand};

/// Reply sent to callers outside the admin list.
pub const NOT_AUTHORIZED: &str = "You are not authorized to manage this relay.";

/// Telegram user ids allowed to run commands.
#[derive(Debug, Clone, Default)]
pub struct AdminList {
    users: BTreeSet<i64>,
}

impl AdminList {
    /// Build from configured user ids.
    pub fn new(users: impl IntoIterator<Item = i64>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }

    /// Whether `caller` may run commands.
    pub fn is_admin(&self, caller: i64) -> bool {
        self.users.contains(&caller)
    }
}

/// Routes parsed commands to their handlers.
pub struct CommandRouter {
    sync: Arc<Mutex<GraphSync>>,
    store: Arc<dyn RelayStore>,
    admins: AdminList,
}

impl CommandRouter {
    /// Router over a sync engine and the store it manages.
    pub fn new(sync: Arc<Mutex<GraphSync>>, store: Arc<dyn RelayStore>, admins: AdminList) -> Self {
        Self {
            sync,
            store,
            admins,
        }
    }

    /// Run a command for `caller` and return the HTML reply.
    pub async fn dispatch(&self, caller: i64, text: &str) -> String {
        if !self.admins.is_admin(caller) {
            warn!(caller, "command rejected: caller is not an admin");
            return NOT_AUTHORIZED.to_owned();
        }

        let cmd = match parse_command(text) {
            Ok(cmd) => cmd,
            Err(e) => return render_error(&e),
        };
        debug!(caller, verb = %cmd.verb, "running command");

        match self.run(&cmd).await {
            Ok(reply) => reply,
            Err(e) => {
                if e.requires_resync() {
                    warn!(verb = %cmd.verb, error = %e, "command left connections unsynchronized");
                } else {
                    debug!(verb = %cmd.verb, error = %e, "command failed");
                }
                render_error(&e)
            }
        }
    }

    async fn run(&self, cmd: &ParsedCommand) -> Result<String, CommandError> {
        let store = self.store.as_ref();
        let sync = self.sync.as_ref();
        match cmd.verb.as_str() {
            "help" | "start" => Ok(handlers::handle_help()),
            "sync" | "resync" => handlers::handle_sync(sync).await,
            "add_channel" => handlers::handle_add_channel(store, cmd).await,
            "remove_channel" => handlers::handle_remove_channel(sync, cmd).await,
            "view_channel" => handlers::handle_view_channel(store, cmd).await,
            "view_all_channels" => handlers::handle_view_all_channels(store).await,
            "view_connections" => handlers::handle_view_connections(store).await,
            "connect_channels" | "connect" => handlers::handle_connect(sync, cmd).await,
            "disconnect_channels" | "disconnect" => handlers::handle_disconnect(sync, cmd).await,
            "add_to_blacklist" => {
                handlers::handle_add_filter(store, FilterMode::Blacklist, cmd).await
            }
            "add_replacement" => {
                handlers::handle_add_filter(store, FilterMode::Replacement, cmd).await
            }
            "add_link_remover" => {
                handlers::handle_add_filter(store, FilterMode::LinkRemover, cmd).await
            }
            "remove_from_blacklist" => {
                handlers::handle_remove_filter(store, FilterMode::Blacklist, cmd).await
            }
            "remove_replacement" => {
                handlers::handle_remove_filter(store, FilterMode::Replacement, cmd).await
            }
            "remove_link_remover" => {
                handlers::handle_remove_filter(store, FilterMode::LinkRemover, cmd).await
            }
            "view_blacklist" => handlers::handle_view_filters(store, FilterMode::Blacklist).await,
            "view_replacements" => {
                handlers::handle_view_filters(store, FilterMode::Replacement).await
            }
            "view_link_removers" => {
                handlers::handle_view_filters(store, FilterMode::LinkRemover).await
            }
            other => Ok(format!("Unknown command: /{}", escape_html(other))),
        }
    }
}

/// Render a failure as an HTML reply.
pub fn render_error(error: &CommandError) -> String {
    let mut reply = format!("Error: {}", escape_html(&error.to_string()));
    if error.requires_resync() {
        reply.push_str("\nConnections are out of sync. Run /sync to rebuild them.");
    }
    reply
}
