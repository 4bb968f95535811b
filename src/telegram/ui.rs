//! HTML formatting for command replies.
//!
//! All output uses HTML parse mode; user-provided text is always escaped.

use crate::channels::ChannelDetail;
use crate::store::{Channel, Filter};

/// Escape special HTML characters in user-provided text.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// `name - url`, escaped.
pub fn format_channel(channel: &Channel) -> String {
    format!(
        "{} - {}",
        escape_html(&channel.name),
        escape_html(&channel.url)
    )
}

/// One channel with its inputs and outputs.
pub fn format_channel_detail(detail: &ChannelDetail) -> String {
    let mut lines = vec![format!("<b>{}</b>", format_channel(&detail.channel))];
    lines.push(format!("Inputs: {}", names(&detail.inputs)));
    lines.push(format!("Outputs: {}", names(&detail.outputs)));
    lines.join("\n")
}

/// Every channel as `name - url`.
pub fn format_channel_list(channels: &[Channel]) -> String {
    if channels.is_empty() {
        return "No channels.".to_owned();
    }
    let mut lines = vec![format!("<b>Channels ({}):</b>", channels.len())];
    lines.extend(channels.iter().map(format_channel));
    lines.join("\n")
}

/// Every channel with the channels it relays to.
pub fn format_connections(details: &[ChannelDetail]) -> String {
    if details.is_empty() {
        return "No channels.".to_owned();
    }
    let mut lines = vec!["<b>Connections:</b>".to_owned()];
    for detail in details {
        lines.push(format!(
            "{} -> {}",
            escape_html(&detail.channel.name),
            names(&detail.outputs)
        ));
    }
    lines.join("\n")
}

/// Filter rules as `condition` or `condition -> replacement`.
pub fn format_filters(title: &str, filters: &[Filter]) -> String {
    if filters.is_empty() {
        return format!("No {title} rules.");
    }
    let mut lines = vec![format!("<b>{} ({}):</b>", escape_html(title), filters.len())];
    for filter in filters {
        let condition = escape_html(&filter.condition);
        lines.push(match &filter.replacement {
            Some(replacement) => format!(
                "<code>{condition}</code> -> <code>{}</code>",
                escape_html(replacement)
            ),
            None => format!("<code>{condition}</code>"),
        });
    }
    lines.join("\n")
}

fn names(channels: &[Channel]) -> String {
    if channels.is_empty() {
        return "none".to_owned();
    }
    channels
        .iter()
        .map(|c| escape_html(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}
