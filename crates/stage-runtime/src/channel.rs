//! Script event channels

use serde::Serialize;
use std::fmt;

/// A named event channel scripts can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Init,
    Start,
    Stop,
    KeyDown,
    KeyUp,
    PointerDown,
    PointerUp,
    PointerMove,
    Update,
}

impl Channel {
    /// Every channel in canonical order
    pub const ALL: [Channel; 9] = [
        Channel::Init,
        Channel::Start,
        Channel::Stop,
        Channel::KeyDown,
        Channel::KeyUp,
        Channel::PointerDown,
        Channel::PointerUp,
        Channel::PointerMove,
        Channel::Update,
    ];

    /// Name as used in scripts
    pub fn name(self) -> &'static str {
        match self {
            Channel::Init => "init",
            Channel::Start => "start",
            Channel::Stop => "stop",
            Channel::KeyDown => "keydown",
            Channel::KeyUp => "keyup",
            Channel::PointerDown => "pointerdown",
            Channel::PointerUp => "pointerup",
            Channel::PointerMove => "pointermove",
            Channel::Update => "update",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Position in `ALL`
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload of the `update` channel, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UpdateEvent {
    /// Time since playback started
    pub time: f64,
    /// Time since the previous frame
    pub delta: f64,
}
