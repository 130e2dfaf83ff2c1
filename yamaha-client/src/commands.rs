//! Builders for complete `<YAMAHA_AV>` control documents.
//!
//! These produce payloads for [`ReceiverControl::send_raw_command`] as well
//! as the bodies the client sends for its own typed operations.
//!
//! [`ReceiverControl::send_raw_command`]: crate::ReceiverControl::send_raw_command

use crate::model::Zone;

/// Wrap `inner` in a `GET` envelope
pub fn get(inner: &str) -> String {
    format!(r#"<YAMAHA_AV cmd="GET">{}</YAMAHA_AV>"#, inner)
}

/// Wrap `inner` in a `PUT` envelope
pub fn put(inner: &str) -> String {
    format!(r#"<YAMAHA_AV cmd="PUT">{}</YAMAHA_AV>"#, inner)
}

/// Wrap `inner` in the element for `zone`
pub fn in_zone(zone: Zone, inner: &str) -> String {
    format!("<{tag}>{inner}</{tag}>", tag = zone.tag(), inner = inner)
}

/// Escape character data for use inside an element
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Input selection body for `zone`; `input` is escaped
pub fn select_input(zone: Zone, input: &str) -> String {
    in_zone(
        zone,
        &format!("<Input><Input_Sel>{}</Input_Sel></Input>", escape_text(input)),
    )
}

pub fn mute(zone: Zone, muted: bool) -> String {
    put(&in_zone(
        zone,
        &format!("<Volume><Mute>{}</Mute></Volume>", on_off(muted)),
    ))
}

pub fn scene(scene: u32) -> String {
    put(&in_zone(
        Zone::Main,
        &format!("<Scene><Scene_Sel>Scene {}</Scene_Sel></Scene>", scene),
    ))
}

/// Playback control for a network source such as `AirPlay` or `Spotify`
pub fn playback(source: &str, action: &str) -> String {
    put(&format!(
        "<{source}><Play_Control><Playback>{action}</Playback></Play_Control></{source}>",
        source = source,
        action = action
    ))
}

fn on_off(on: bool) -> &'static str {
    if on {
        "On"
    } else {
        "Off"
    }
}
