//! Telegram reply formatting tests.

use telerelay::channels::ChannelDetail;
use telerelay::store::{Channel, ChannelId, Filter, FilterMode};
use telerelay::telegram::ui::{
    escape_html, format_channel, format_channel_detail, format_channel_list, format_connections,
    format_filters,
};

fn channel(name: &str) -> Channel {
    Channel {
        id: ChannelId::from(name),
        name: name.to_owned(),
        url: format!("https://t.me/{name}"),
    }
}

fn filter(condition: &str, replacement: Option<&str>, mode: FilterMode) -> Filter {
    Filter {
        id: condition.to_owned(),
        condition: condition.to_owned(),
        replacement: replacement.map(str::to_owned),
        mode,
    }
}

#[test]
fn escape_html_escapes_special_chars() {
    assert_eq!(escape_html("<b>test</b>"), "&lt;b&gt;test&lt;/b&gt;");
    assert_eq!(escape_html("a & b"), "a &amp; b");
    assert_eq!(escape_html("&lt;"), "&amp;lt;");
}

#[test]
fn escape_html_passes_normal_text() {
    let text = "just a normal message";
    assert_eq!(escape_html(text), text);
}

#[test]
fn channel_names_are_escaped() {
    let mut c = channel("x");
    c.name = "<script>".to_owned();
    assert_eq!(format_channel(&c), "&lt;script&gt; - https://t.me/x");
}

#[test]
fn detail_lists_neighbours_or_none() {
    let detail = ChannelDetail {
        channel: channel("hub"),
        inputs: vec![channel("a"), channel("b")],
        outputs: vec![],
    };
    assert_eq!(
        format_channel_detail(&detail),
        "<b>hub - https://t.me/hub</b>\nInputs: a, b\nOutputs: none"
    );
}

#[test]
fn channel_list_counts_entries() {
    assert_eq!(format_channel_list(&[]), "No channels.");
    let reply = format_channel_list(&[channel("a"), channel("b")]);
    assert_eq!(
        reply,
        "<b>Channels (2):</b>\na - https://t.me/a\nb - https://t.me/b"
    );
}

#[test]
fn connections_show_outputs_per_channel() {
    let details = vec![
        ChannelDetail {
            channel: channel("a"),
            inputs: vec![],
            outputs: vec![channel("b"), channel("c")],
        },
        ChannelDetail {
            channel: channel("b"),
            inputs: vec![channel("a")],
            outputs: vec![],
        },
    ];
    assert_eq!(
        format_connections(&details),
        "<b>Connections:</b>\na -> b, c\nb -> none"
    );
    assert_eq!(format_connections(&[]), "No channels.");
}

#[test]
fn filters_render_with_optional_replacement() {
    assert_eq!(format_filters("blacklist", &[]), "No blacklist rules.");

    let rules = [
        filter("<b>", Some("**"), FilterMode::Replacement),
        filter("spam", None, FilterMode::Blacklist),
    ];
    assert_eq!(
        format_filters("mixed", &rules),
        "<b>mixed (2):</b>\n<code>&lt;b&gt;</code> -> <code>**</code>\n<code>spam</code>"
    );
}
