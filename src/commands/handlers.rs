//! Administrative command handlers.
//!
//! Each handler runs one relay operation and returns the HTML reply on
//! success. Failures are rendered by the router.

use tokio::sync::Mutex;

use super::parse::{CommandError, ParsedCommand};
use crate::channels;
use crate::filters;
use crate::relay::GraphSync;
use crate::store::{FilterMode, RelayStore};
use crate::telegram::ui::{self, escape_html};

/// List all available commands.
pub fn handle_help() -> String {
    [
        "<b>Available commands:</b>",
        "",
        "/help - show this message",
        "/sync - rebuild live subscriptions from the stored graph",
        "/add_channel --name=&lt;name&gt; --url=&lt;link&gt;",
        "/remove_channel --channel=&lt;name or link&gt;",
        "/view_channel --channel=&lt;name or link&gt;",
        "/view_all_channels",
        "/view_connections",
        "/connect_channels --input=&lt;channel&gt; --output=&lt;channel&gt;",
        "/disconnect_channels --input=&lt;channel&gt; --output=&lt;channel&gt;",
        "/add_to_blacklist --condition=&lt;text&gt;",
        "/add_replacement --condition=&lt;text&gt; --replacement=&lt;text&gt;",
        "/add_link_remover --condition=&lt;domain&gt;",
        "/remove_from_blacklist --condition=&lt;text&gt;",
        "/remove_replacement --condition=&lt;text&gt;",
        "/remove_link_remover --condition=&lt;domain&gt;",
        "/view_blacklist",
        "/view_replacements",
        "/view_link_removers",
    ]
    .join("\n")
}

/// Rebuild every live subscription.
pub async fn handle_sync(sync: &Mutex<GraphSync>) -> Result<String, CommandError> {
    let report = sync.lock().await.resync().await?;
    Ok(format!(
        "Connections synchronized: {} removed, {} registered.",
        report.removed, report.registered
    ))
}

/// Create a channel.
pub async fn handle_add_channel(
    store: &dyn RelayStore,
    cmd: &ParsedCommand,
) -> Result<String, CommandError> {
    cmd.allow_only(&["name", "url"])?;
    let channel = channels::add_channel(store, cmd.require("name")?, cmd.require("url")?).await?;
    Ok(format!("Channel added: {}", ui::format_channel(&channel)))
}

/// Delete a channel and rebuild subscriptions.
pub async fn handle_remove_channel(
    sync: &Mutex<GraphSync>,
    cmd: &ParsedCommand,
) -> Result<String, CommandError> {
    cmd.allow_only(&["channel"])?;
    let (channel, report) = sync
        .lock()
        .await
        .remove_channel(cmd.require("channel")?)
        .await?;
    Ok(format!(
        "Channel removed: {}\n{} subscriptions active.",
        ui::format_channel(&channel),
        report.registered
    ))
}

/// Show one channel with its neighbours.
pub async fn handle_view_channel(
    store: &dyn RelayStore,
    cmd: &ParsedCommand,
) -> Result<String, CommandError> {
    cmd.allow_only(&["channel"])?;
    let detail = channels::channel_detail(store, cmd.require("channel")?).await?;
    Ok(ui::format_channel_detail(&detail))
}

/// List every channel.
pub async fn handle_view_all_channels(store: &dyn RelayStore) -> Result<String, CommandError> {
    let channels = store
        .list_channels()
        .await
        .map_err(crate::error::RelayError::from)?;
    Ok(ui::format_channel_list(&channels))
}

/// List every channel with its outputs.
pub async fn handle_view_connections(store: &dyn RelayStore) -> Result<String, CommandError> {
    let details = channels::all_details(store).await?;
    Ok(ui::format_connections(&details))
}

/// Connect two channels.
pub async fn handle_connect(
    sync: &Mutex<GraphSync>,
    cmd: &ParsedCommand,
) -> Result<String, CommandError> {
    cmd.allow_only(&["input", "output"])?;
    let ends = sync
        .lock()
        .await
        .connect(cmd.require("input")?, cmd.require("output")?)
        .await?;
    Ok(format!(
        "Connected <b>{}</b> -> <b>{}</b>",
        escape_html(&ends.input.name),
        escape_html(&ends.output.name)
    ))
}

/// Disconnect two channels.
pub async fn handle_disconnect(
    sync: &Mutex<GraphSync>,
    cmd: &ParsedCommand,
) -> Result<String, CommandError> {
    cmd.allow_only(&["input", "output"])?;
    let ends = sync
        .lock()
        .await
        .disconnect(cmd.require("input")?, cmd.require("output")?)
        .await?;
    Ok(format!(
        "Disconnected <b>{}</b> -> <b>{}</b>",
        escape_html(&ends.input.name),
        escape_html(&ends.output.name)
    ))
}

/// Add a filter rule.
pub async fn handle_add_filter(
    store: &dyn RelayStore,
    mode: FilterMode,
    cmd: &ParsedCommand,
) -> Result<String, CommandError> {
    let filter = if mode == FilterMode::Replacement {
        cmd.allow_only(&["condition", "replacement"])?;
        filters::add_filter(
            store,
            mode,
            cmd.require("condition")?,
            Some(cmd.require("replacement")?),
        )
        .await?
    } else {
        cmd.allow_only(&["condition"])?;
        filters::add_filter(store, mode, cmd.require("condition")?, None).await?
    };
    Ok(format!(
        "Added {} rule <code>{}</code>",
        mode_title(mode),
        escape_html(&filter.condition)
    ))
}

/// Remove a filter rule.
pub async fn handle_remove_filter(
    store: &dyn RelayStore,
    mode: FilterMode,
    cmd: &ParsedCommand,
) -> Result<String, CommandError> {
    cmd.allow_only(&["condition"])?;
    let filter = filters::remove_filter(store, mode, cmd.require("condition")?).await?;
    Ok(format!(
        "Removed {} rule <code>{}</code>",
        mode_title(mode),
        escape_html(&filter.condition)
    ))
}

/// List the rules of one mode.
pub async fn handle_view_filters(
    store: &dyn RelayStore,
    mode: FilterMode,
) -> Result<String, CommandError> {
    let rules = filters::filters_by_mode(store, mode).await?;
    Ok(ui::format_filters(mode_title(mode), &rules))
}

fn mode_title(mode: FilterMode) -> &'static str {
    match mode {
        FilterMode::Blacklist => "blacklist",
        FilterMode::Replacement => "replacement",
        FilterMode::LinkRemover => "link remover",
    }
}
