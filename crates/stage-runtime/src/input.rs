//! Raw input events and the relay that gates them

use crate::channel::Channel;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keyboard event fields forwarded to scripts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyEvent {
    /// Logical key value ("a", "Enter", "ArrowUp")
    pub key: String,
    /// Physical key code ("KeyA", "Enter")
    pub code: String,
    pub repeat: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
}

/// Pointer event fields forwarded to scripts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerEvent {
    /// Viewport position in pixels
    pub x: f64,
    pub y: f64,
    /// Button that changed; -1 for plain moves
    pub button: i32,
    /// Bitmask of buttons held
    pub buttons: u32,
    pub pointer_id: i64,
    /// "mouse", "pen" or "touch"
    pub pointer_type: String,
}

impl Default for PointerEvent {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            button: -1,
            buttons: 0,
            pointer_id: 1,
            pointer_type: "mouse".to_string(),
        }
    }
}

/// One raw input event from the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputEvent {
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    PointerDown(PointerEvent),
    PointerUp(PointerEvent),
    PointerMove(PointerEvent),
}

impl InputEvent {
    /// The channel this event is relayed to
    pub fn channel(&self) -> Channel {
        match self {
            InputEvent::KeyDown(_) => Channel::KeyDown,
            InputEvent::KeyUp(_) => Channel::KeyUp,
            InputEvent::PointerDown(_) => Channel::PointerDown,
            InputEvent::PointerUp(_) => Channel::PointerUp,
            InputEvent::PointerMove(_) => Channel::PointerMove,
        }
    }

    /// Event fields as a JSON object, without the type tag
    pub fn payload(&self) -> Value {
        let fields = match self {
            InputEvent::KeyDown(e) | InputEvent::KeyUp(e) => serde_json::to_value(e),
            InputEvent::PointerDown(e) | InputEvent::PointerUp(e) | InputEvent::PointerMove(e) => {
                serde_json::to_value(e)
            }
        };
        fields.unwrap_or(Value::Null)
    }
}

/// Listener set for the five raw input kinds.
///
/// Installed while playing; events arriving otherwise are dropped.
#[derive(Debug, Default)]
pub struct InputRelay {
    installed: bool,
}

impl InputRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&mut self) {
        self.installed = true;
    }

    pub fn remove(&mut self) {
        self.installed = false;
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Channel to dispatch `event` on, or `None` when not installed
    pub fn relay(&self, event: &InputEvent) -> Option<Channel> {
        if !self.installed {
            debug!(
                target: "stage::input",
                "Dropping {} event: listeners not installed",
                event.channel()
            );
            return None;
        }
        Some(event.channel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_gated_on_install() {
        let mut relay = InputRelay::new();
        let event = InputEvent::KeyDown(KeyEvent {
            key: "a".into(),
            code: "KeyA".into(),
            ..Default::default()
        });

        assert_eq!(relay.relay(&event), None);
        relay.install();
        assert_eq!(relay.relay(&event), Some(Channel::KeyDown));
        relay.remove();
        assert_eq!(relay.relay(&event), None);
    }

    #[test]
    fn test_event_channels() {
        let p = PointerEvent::default();
        assert_eq!(InputEvent::PointerDown(p.clone()).channel(), Channel::PointerDown);
        assert_eq!(InputEvent::PointerUp(p.clone()).channel(), Channel::PointerUp);
        assert_eq!(InputEvent::PointerMove(p).channel(), Channel::PointerMove);
        assert_eq!(InputEvent::KeyUp(KeyEvent::default()).channel(), Channel::KeyUp);
    }

    #[test]
    fn test_parse_tagged_events() {
        let events: Vec<InputEvent> = serde_json::from_str(
            r#"[
                { "type": "keydown", "key": "ArrowUp", "code": "ArrowUp" },
                { "type": "pointermove", "x": 10.5, "y": 20 }
            ]"#,
        )
        .unwrap();
        assert_eq!(events[0].channel(), Channel::KeyDown);
        match &events[1] {
            InputEvent::PointerMove(p) => {
                assert_eq!(p.x, 10.5);
                assert_eq!(p.pointer_type, "mouse");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_payload_has_no_type_tag() {
        let payload = InputEvent::KeyDown(KeyEvent {
            key: "b".into(),
            shift: true,
            ..Default::default()
        })
        .payload();
        assert_eq!(payload["key"], "b");
        assert_eq!(payload["shift"], true);
        assert!(payload.get("type").is_none());
    }
}
