//! Bridges node clip lists to mixers and writes blended poses back to nodes

use crate::graph::{NodeIndex, SceneGraph};
use log::{debug, warn};
use stage_animation::{AnimationMixer, BlendedValue, TrackProperty};
use stage_core::Vec3;

/// Create a mixer on the scene root playing every discovered clip.
///
/// Clips come from the root itself or, when it has none, from all
/// descendants in pre-order. Returns the number of clips bound.
pub fn bind_animations(graph: &mut SceneGraph) -> usize {
    let root = graph.root();
    let mut clips = graph
        .get(root)
        .map(|n| n.animations.clone())
        .unwrap_or_default();
    if clips.is_empty() {
        for idx in graph.traverse(root) {
            if let Some(node) = graph.get(idx) {
                clips.extend(node.animations.iter().cloned());
            }
        }
    }

    if clips.is_empty() {
        warn!(
            target: "stage::animation",
            "No animation clips found in the loaded object or its children"
        );
        return 0;
    }

    let mut mixer = AnimationMixer::new();
    for clip in &clips {
        let action = mixer.clip_action(clip.clone());
        mixer.play(action);
    }
    debug!(target: "stage::animation", "Bound {} clip(s) to scene root", clips.len());

    if let Some(node) = graph.get_mut(root) {
        node.mixer = Some(mixer);
    }
    clips.len()
}

/// Advance every mixer in the graph by `delta` seconds and apply the blended pose.
pub fn advance_animations(graph: &mut SceneGraph, delta: f64) {
    let owners: Vec<NodeIndex> = graph
        .iter()
        .filter(|(_, node)| node.mixer.is_some())
        .map(|(idx, _)| idx)
        .collect();

    for owner in owners {
        let pose = match graph.get_mut(owner).and_then(|n| n.mixer.as_mut()) {
            Some(mixer) => mixer.update(delta),
            None => continue,
        };
        apply_pose(graph, owner, &pose);
    }
}

fn apply_pose(graph: &mut SceneGraph, owner: NodeIndex, pose: &[BlendedValue]) {
    for blended in pose {
        let target = if blended.node.is_empty() {
            Some(owner)
        } else {
            graph.find_by_name_under(owner, &blended.node)
        };
        let Some(node) = target.and_then(|idx| graph.get_mut(idx)) else {
            continue;
        };

        let value = Vec3::from_array(blended.value);
        match blended.property {
            TrackProperty::Position => node.transform.position = value,
            TrackProperty::Rotation => node.transform.rotation = value,
            TrackProperty::Scale => node.transform.scale = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use stage_animation::{AnimationClip, AnimationTrack, Interpolation, Keyframe};

    fn clip(uuid: &str, node: &str, to: f32) -> AnimationClip {
        AnimationClip {
            uuid: uuid.to_string(),
            name: uuid.to_string(),
            duration: 10.0,
            tracks: vec![AnimationTrack {
                node: node.to_string(),
                property: TrackProperty::Position,
                interpolation: Interpolation::Linear,
                keyframes: vec![
                    Keyframe {
                        time: 0.0,
                        value: [0.0; 3],
                        in_tangent: None,
                        out_tangent: None,
                    },
                    Keyframe {
                        time: 10.0,
                        value: [to, 0.0, 0.0],
                        in_tangent: None,
                        out_tangent: None,
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_root_clips_bound_and_playing() {
        let mut graph = SceneGraph::new(
            Node::new("Scene", "Scene")
                .with_animation(clip("a", "", 1.0))
                .with_animation(clip("b", "", 1.0)),
        );
        assert_eq!(bind_animations(&mut graph), 2);

        let mixer = graph.get(graph.root()).unwrap().mixer.as_ref().unwrap();
        assert_eq!(mixer.actions().len(), 2);
        assert!(mixer.actions().iter().all(|a| a.is_playing()));
    }

    #[test]
    fn test_descendant_clips_are_collected_on_root() {
        let mut graph = SceneGraph::new(Node::new("Scene", "Scene"));
        let root = graph.root();
        let cube = graph
            .add_child(root, Node::new("Cube", "Mesh").with_animation(clip("a", "Cube", 1.0)))
            .unwrap();
        graph
            .add_child(cube, Node::new("Child", "Mesh").with_animation(clip("b", "Child", 1.0)))
            .unwrap();

        assert_eq!(bind_animations(&mut graph), 2);
        assert!(graph.get(root).unwrap().mixer.is_some());
        assert!(graph.get(cube).unwrap().mixer.is_none());
    }

    #[test]
    fn test_no_clips_leaves_scene_unbound() {
        let mut graph = SceneGraph::new(Node::new("Scene", "Scene"));
        assert_eq!(bind_animations(&mut graph), 0);
        assert!(graph.get(graph.root()).unwrap().mixer.is_none());
    }

    #[test]
    fn test_advance_writes_pose_to_named_node() {
        let mut graph = SceneGraph::new(Node::new("Scene", "Scene"));
        let root = graph.root();
        let cube = graph
            .add_child(root, Node::new("Cube", "Mesh").with_animation(clip("a", "Cube", 10.0)))
            .unwrap();
        bind_animations(&mut graph);

        advance_animations(&mut graph, 2.5);

        let pos = graph.get(cube).unwrap().transform.position;
        assert!((pos.x - 2.5).abs() < 1e-5);
        let mixer = graph.get(root).unwrap().mixer.as_ref().unwrap();
        assert!((mixer.actions()[0].time - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_track_node_targets_root() {
        let mut graph = SceneGraph::new(Node::new("Scene", "Scene").with_animation(clip("a", "", 10.0)));
        bind_animations(&mut graph);
        advance_animations(&mut graph, 5.0);
        let pos = graph.get(graph.root()).unwrap().transform.position;
        assert!((pos.x - 5.0).abs() < 1e-5);
    }
}
