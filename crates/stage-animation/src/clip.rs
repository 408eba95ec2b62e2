//! Core animation data types

use serde::{Deserialize, Serialize};

/// A complete animation clip with per-node property tracks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationClip {
    #[serde(default)]
    pub uuid: String,
    /// Human-readable name
    pub name: String,
    /// Total duration in seconds. Negative means "derive from the tracks".
    #[serde(default = "unset_duration")]
    pub duration: f64,
    /// Animated property tracks
    #[serde(default)]
    pub tracks: Vec<AnimationTrack>,
}

fn unset_duration() -> f64 {
    -1.0
}

impl AnimationClip {
    /// Order each track's keyframes by time, then derive the duration from the
    /// last keyframe when the document left it unset.
    pub fn normalize(&mut self) {
        for track in &mut self.tracks {
            track.keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
        if self.duration >= 0.0 {
            return;
        }
        self.duration = self
            .tracks
            .iter()
            .filter_map(|t| t.keyframes.last().map(|k| k.time))
            .fold(0.0, f64::max);
    }
}

/// A single animated property track (e.g. the position of one node over time)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationTrack {
    /// Name of the node this track drives, relative to the mixer root.
    /// Empty means the root itself.
    #[serde(default)]
    pub node: String,
    /// What property this track drives
    pub property: TrackProperty,
    /// Interpolation mode between keyframes
    #[serde(default)]
    pub interpolation: Interpolation,
    /// Sorted keyframes (by time)
    pub keyframes: Vec<Keyframe>,
}

/// A keyframe: a value at a point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds from clip start
    pub time: f64,
    pub value: [f32; 3],
    /// Incoming tangent for cubic spline
    #[serde(default)]
    pub in_tangent: Option<[f32; 3]>,
    /// Outgoing tangent for cubic spline
    #[serde(default)]
    pub out_tangent: Option<[f32; 3]>,
}

/// Which transform component a track drives
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrackProperty {
    Position,
    /// Euler angles in radians
    Rotation,
    Scale,
}

/// How to interpolate between keyframes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Jump to next value (no blending)
    Step,
    #[default]
    Linear,
    /// Cubic Hermite spline (requires tangents)
    #[serde(alias = "cubic")]
    CubicSpline,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_clip_from_json() {
        let clip: AnimationClip = serde_json::from_str(
            r#"{
                "uuid": "c1",
                "name": "bob",
                "tracks": [
                    { "node": "Cube", "property": "position",
                      "keyframes": [
                        { "time": 0.0, "value": [0, 0, 0] },
                        { "time": 1.5, "value": [0, 2, 0] }
                      ] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(clip.name, "bob");
        assert_eq!(clip.tracks[0].property, TrackProperty::Position);
        assert_eq!(clip.tracks[0].interpolation, Interpolation::Linear);
        assert!(clip.duration < 0.0);
    }

    #[test]
    fn normalize_derives_duration_from_last_keyframe() {
        let mut clip: AnimationClip = serde_json::from_str(
            r#"{
                "name": "spin",
                "tracks": [
                    { "property": "rotation", "keyframes": [
                        { "time": 0.0, "value": [0, 0, 0] },
                        { "time": 3.0, "value": [0, 6.28, 0] } ] },
                    { "property": "scale", "keyframes": [
                        { "time": 0.5, "value": [1, 1, 1] } ] }
                ]
            }"#,
        )
        .unwrap();
        clip.normalize();
        assert_eq!(clip.duration, 3.0);
    }

    #[test]
    fn explicit_duration_is_kept() {
        let mut clip: AnimationClip =
            serde_json::from_str(r#"{ "name": "idle", "duration": 4.0 }"#).unwrap();
        clip.normalize();
        assert_eq!(clip.duration, 4.0);
    }

    #[test]
    fn normalize_orders_keyframes_by_time() {
        let mut clip: AnimationClip = serde_json::from_str(
            r#"{
                "name": "shuffled",
                "tracks": [
                    { "property": "position", "keyframes": [
                        { "time": 2.0, "value": [2, 0, 0] },
                        { "time": 0.0, "value": [0, 0, 0] },
                        { "time": 1.0, "value": [1, 0, 0] } ] }
                ]
            }"#,
        )
        .unwrap();
        clip.normalize();

        let times: Vec<f64> = clip.tracks[0].keyframes.iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 2.0]);
        assert_eq!(clip.duration, 2.0);
        assert_eq!(crate::sampler::sample_track(&clip.tracks[0], 1.5), [1.5, 0.0, 0.0]);
    }
}
