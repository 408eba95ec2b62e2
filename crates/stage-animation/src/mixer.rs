//! Clip actions and weighted pose blending
//!
//! A mixer belongs to one root node. Every action plays a shared clip with
//! its own local time; `evaluate` samples all active actions and blends them
//! per (node, property) target as a weight-normalised average.

use crate::clip::{AnimationClip, TrackProperty};
use crate::sampler::sample_track;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Index of an action within its mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(usize);

/// What happens when an action reaches the end of its clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Clamp at the final pose and stop
    Once,
    #[default]
    Repeat,
}

/// Playback state for one clip inside a mixer.
#[derive(Debug, Clone)]
pub struct ClipAction {
    clip: Arc<AnimationClip>,
    /// Local clip time in seconds
    pub time: f64,
    /// Playback speed multiplier (negative plays in reverse)
    pub time_scale: f64,
    /// Blend weight, 0.0 contributes nothing
    pub weight: f32,
    pub loop_mode: LoopMode,
    playing: bool,
}

impl ClipAction {
    fn new(clip: Arc<AnimationClip>) -> Self {
        Self {
            clip,
            time: 0.0,
            time_scale: 1.0,
            weight: 1.0,
            loop_mode: LoopMode::Repeat,
            playing: false,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn advance(&mut self, delta: f64) {
        if !self.playing {
            return;
        }
        self.time += delta * self.time_scale;

        let duration = self.clip.duration;
        match self.loop_mode {
            LoopMode::Repeat => {
                if duration > 0.0 {
                    self.time = self.time.rem_euclid(duration);
                }
            }
            LoopMode::Once => {
                if self.time >= duration {
                    self.time = duration;
                    self.playing = false;
                } else if self.time < 0.0 {
                    self.time = 0.0;
                    self.playing = false;
                }
            }
        }
    }
}

/// A blended value for one animated target
#[derive(Debug, Clone, PartialEq)]
pub struct BlendedValue {
    /// Target node name; empty for the mixer root
    pub node: String,
    pub property: TrackProperty,
    pub value: [f32; 3],
}

/// Plays any number of clips at once and blends their samples.
#[derive(Debug, Clone, Default)]
pub struct AnimationMixer {
    actions: Vec<ClipAction>,
    time: f64,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the action for `clip`. Clips are matched by uuid, then name.
    pub fn clip_action(&mut self, clip: Arc<AnimationClip>) -> ActionId {
        let existing = self.actions.iter().position(|a| {
            if clip.uuid.is_empty() {
                a.clip.name == clip.name
            } else {
                a.clip.uuid == clip.uuid
            }
        });
        if let Some(idx) = existing {
            return ActionId(idx);
        }
        self.actions.push(ClipAction::new(clip));
        ActionId(self.actions.len() - 1)
    }

    pub fn play(&mut self, id: ActionId) {
        if let Some(action) = self.actions.get_mut(id.0) {
            action.playing = true;
        }
    }

    /// Stop an action and rewind it to the start.
    pub fn stop(&mut self, id: ActionId) {
        if let Some(action) = self.actions.get_mut(id.0) {
            action.playing = false;
            action.time = 0.0;
        }
    }

    pub fn action(&self, id: ActionId) -> Option<&ClipAction> {
        self.actions.get(id.0)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut ClipAction> {
        self.actions.get_mut(id.0)
    }

    pub fn actions(&self) -> &[ClipAction] {
        &self.actions
    }

    /// Total time this mixer has been advanced, in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advance every playing action by `delta` seconds and return the blended pose.
    pub fn update(&mut self, delta: f64) -> Vec<BlendedValue> {
        self.time += delta;
        for action in &mut self.actions {
            action.advance(delta);
        }
        self.evaluate()
    }

    /// Blend the current samples of all weighted actions.
    ///
    /// Actions that finished under `LoopMode::Once` keep contributing their
    /// clamped final pose.
    pub fn evaluate(&self) -> Vec<BlendedValue> {
        let mut acc: BTreeMap<(&str, TrackProperty), ([f32; 3], f32)> = BTreeMap::new();

        for action in &self.actions {
            if action.weight <= 0.0 {
                continue;
            }
            for track in &action.clip.tracks {
                let sample = sample_track(track, action.time);
                let entry = acc
                    .entry((track.node.as_str(), track.property))
                    .or_insert(([0.0; 3], 0.0));
                for (sum, v) in entry.0.iter_mut().zip(sample) {
                    *sum += v * action.weight;
                }
                entry.1 += action.weight;
            }
        }

        acc.into_iter()
            .map(|((node, property), (sum, weight))| BlendedValue {
                node: node.to_string(),
                property,
                value: sum.map(|s| s / weight),
            })
            .collect()
    }
}
