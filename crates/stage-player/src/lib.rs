//! Stage Player - scripted scene player library
//!
//! `Player` loads a project document, binds its scripts and runs the frame
//! loop against a `Renderer`. The `stage-player` binary drives it headless.

mod config;
mod player;
mod renderer;

pub use config::{LoggingConfig, PlayerConfig, ViewportConfig};
pub use player::{Player, PlayerState};
pub use renderer::{HeadlessRenderer, RenderStats, Renderer};
