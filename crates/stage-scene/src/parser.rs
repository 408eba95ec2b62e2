//! Building live scenes and cameras from document subtrees

use crate::camera::Camera;
use crate::format::{ObjectDef, ObjectDocument};
use crate::graph::{Node, NodeIndex, SceneGraph};
use log::warn;
use serde::Deserialize;
use serde_json::Value;
use stage_animation::AnimationClip;
use stage_core::{NodeId, Result, StageError, Transform, Vec3};
use std::collections::HashMap;
use std::sync::Arc;

/// Turns document subtrees into a scene graph and camera.
pub trait SceneParser {
    fn parse_scene(&self, value: &Value) -> Result<SceneGraph>;
    fn parse_camera(&self, value: &Value) -> Result<Camera>;
}

/// Parser for the JSON object format (`{ animations, object }`)
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSceneParser;

impl JsonSceneParser {
    pub fn new() -> Self {
        Self
    }
}

impl SceneParser for JsonSceneParser {
    fn parse_scene(&self, value: &Value) -> Result<SceneGraph> {
        let doc = ObjectDocument::deserialize_value(value)?;

        let mut library: HashMap<String, Arc<AnimationClip>> = HashMap::new();
        for mut clip in doc.animations {
            clip.normalize();
            let key = if clip.uuid.is_empty() {
                clip.name.clone()
            } else {
                clip.uuid.clone()
            };
            library.insert(key, Arc::new(clip));
        }

        let mut graph = SceneGraph::new(build_node(&doc.object, &library));
        let root = graph.root();
        for child in &doc.object.children {
            add_subtree(&mut graph, root, child, &library)?;
        }
        Ok(graph)
    }

    fn parse_camera(&self, value: &Value) -> Result<Camera> {
        let doc = ObjectDocument::deserialize_value(value)?;
        let obj = &doc.object;
        if obj.kind != "PerspectiveCamera" {
            return Err(StageError::SceneError(format!(
                "unsupported camera type '{}'",
                obj.kind
            )));
        }

        let mut camera = Camera::new();
        if let Some(uuid) = &obj.uuid {
            camera.uuid = NodeId::from_raw(uuid.as_str());
        }
        if !obj.name.is_empty() {
            camera.name = obj.name.clone();
        }
        let transform = object_transform(obj);
        camera.position = transform.position;
        camera.target = obj
            .target
            .unwrap_or_else(|| transform.position + forward(&transform));
        camera.fov = obj.fov.unwrap_or(camera.fov);
        camera.near = obj.near.unwrap_or(camera.near);
        camera.far = obj.far.unwrap_or(camera.far);
        camera.zoom = obj.zoom.unwrap_or(camera.zoom);
        camera.aspect = obj.aspect.unwrap_or(camera.aspect);
        camera.update_projection_matrix();
        Ok(camera)
    }
}

impl ObjectDocument {
    fn deserialize_value(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }
}

fn add_subtree(
    graph: &mut SceneGraph,
    parent: NodeIndex,
    def: &ObjectDef,
    library: &HashMap<String, Arc<AnimationClip>>,
) -> Result<()> {
    let index = graph.add_child(parent, build_node(def, library))?;
    for child in &def.children {
        add_subtree(graph, index, child, library)?;
    }
    Ok(())
}

fn build_node(def: &ObjectDef, library: &HashMap<String, Arc<AnimationClip>>) -> Node {
    let mut node = Node::new(def.name.clone(), def.kind.clone())
        .with_transform(object_transform(def));
    if let Some(uuid) = &def.uuid {
        node = node.with_uuid(uuid.as_str());
    }
    node.visible = def.visible;
    node.user_data = def.user_data.clone();

    for key in &def.animations {
        match library.get(key) {
            Some(clip) => node.animations.push(Arc::clone(clip)),
            None => warn!(
                target: "stage::scene",
                "Object '{}' references unknown clip '{}'",
                def.name, key
            ),
        }
    }
    node
}

fn object_transform(def: &ObjectDef) -> Transform {
    Transform {
        position: def.position.unwrap_or(Vec3::ZERO),
        rotation: def.rotation.unwrap_or(Vec3::ZERO),
        scale: def.scale.unwrap_or(Vec3::ONE),
    }
}

/// Direction of the local -Z axis after rotation
fn forward(transform: &Transform) -> Vec3 {
    let m = Transform {
        scale: Vec3::ONE,
        ..*transform
    }
    .to_matrix();
    Vec3::new(-m[2][0], -m[2][1], -m[2][2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scene_json() -> Value {
        json!({
            "animations": [
                { "uuid": "clip-a", "name": "bob", "tracks": [
                    { "node": "Cube", "property": "position", "keyframes": [
                        { "time": 0.0, "value": [0, 0, 0] },
                        { "time": 2.0, "value": [0, 1, 0] } ] } ] }
            ],
            "object": {
                "uuid": "root", "type": "Scene", "name": "Scene",
                "animations": ["clip-a"],
                "children": [
                    { "uuid": "cube", "type": "Mesh", "name": "Cube",
                      "position": [1, 2, 3], "visible": false,
                      "userData": { "speed": 2 } },
                    { "type": "Group", "name": "Anon" }
                ]
            }
        })
    }

    #[test]
    fn test_parse_scene_tree() {
        let graph = JsonSceneParser.parse_scene(&scene_json()).unwrap();
        assert_eq!(graph.len(), 3);

        let cube = graph.get(graph.find_by_uuid("cube").unwrap()).unwrap();
        assert_eq!(cube.kind, "Mesh");
        assert_eq!(cube.transform.position, Vec3::new(1.0, 2.0, 3.0));
        assert!(!cube.visible);
        assert_eq!(cube.user_data["speed"], 2);
    }

    #[test]
    fn test_missing_uuid_is_generated() {
        let graph = JsonSceneParser.parse_scene(&scene_json()).unwrap();
        let anon = graph.get(graph.find_by_name("Anon").unwrap()).unwrap();
        assert_eq!(anon.uuid.as_str().len(), 36);
    }

    #[test]
    fn test_clip_references_resolve() {
        let graph = JsonSceneParser.parse_scene(&scene_json()).unwrap();
        let root = graph.get(graph.root()).unwrap();
        assert_eq!(root.animations.len(), 1);
        assert_eq!(root.animations[0].duration, 2.0);
    }

    #[test]
    fn test_parse_camera() {
        let camera = JsonSceneParser
            .parse_camera(&json!({
                "object": { "type": "PerspectiveCamera", "uuid": "cam",
                            "fov": 60, "near": 0.5, "far": 50,
                            "position": [0, 0, 5] }
            }))
            .unwrap();
        assert_eq!(camera.uuid.as_str(), "cam");
        assert_eq!(camera.fov, 60.0);
        assert_eq!(camera.near, 0.5);
        // Unrotated camera looks down -Z
        assert!((camera.target.z - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_non_camera_object_rejected() {
        let err = JsonSceneParser
            .parse_camera(&json!({ "object": { "type": "Mesh" } }))
            .unwrap_err();
        assert!(matches!(err, StageError::SceneError(_)));
    }

    #[test]
    fn test_malformed_scene_is_error() {
        let err = JsonSceneParser.parse_scene(&json!({ "nope": 1 })).unwrap_err();
        assert!(matches!(err, StageError::JsonError(_)));
    }
}
