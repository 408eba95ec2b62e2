//! Stage Scene - Scene graph and project documents
//!
//! Holds the live scene graph and camera the player hands to scripts and the
//! renderer, the project document format, and the animation driver that binds
//! mixers to scene roots and applies their poses each frame.

pub mod animation;
mod camera;
mod format;
mod graph;
mod parser;
mod settings;

pub use animation::{advance_animations, bind_animations};
pub use camera::{Camera, SharedCamera};
pub use format::{
    ObjectDef, ObjectDocument, ProjectDocument, RendererFlags, ScriptDescriptor, ShadowType,
    ToneMapping,
};
pub use graph::{Node, NodeIndex, SceneGraph, SharedScene};
pub use parser::{JsonSceneParser, SceneParser};
pub use settings::{RendererSettings, SharedRendererSettings};
