//! Animation blending for the Stage scene player
//!
//! - `clip`: keyframe clip data as it appears in scene documents
//! - `sampler`: pure keyframe evaluation
//! - `mixer`: `AnimationMixer`, the per-root blend state that plays any
//!   number of clips at once and blends their samples by weight

pub mod clip;
pub mod mixer;
pub mod sampler;

pub use clip::{AnimationClip, AnimationTrack, Interpolation, Keyframe, TrackProperty};
pub use mixer::{ActionId, AnimationMixer, BlendedValue, ClipAction, LoopMode};
