//! Rhai API registration
//!
//! Scripts see the player through a handful of handle types. Every handle
//! wraps a shared slot and takes its lock only for the duration of a single
//! call, so no lock is ever held while script code runs.

use crate::context::{PlayerCommand, PlayerStatus};
use log::{error, info, warn};
use rhai::{Array, Dynamic, Engine, EvalAltResult, FLOAT, INT};
use stage_core::{lock, Shared, Vec3};
use stage_scene::{Node, NodeIndex, SharedCamera, SharedRendererSettings, SharedScene};

type FnResult<T> = Result<T, Box<EvalAltResult>>;

/// A scene node as seen by scripts (`this`, `this_node`, `scene.find_by_name(..)`)
#[derive(Clone)]
pub struct NodeHandle {
    scene: SharedScene,
    index: NodeIndex,
}

impl NodeHandle {
    pub fn new(scene: SharedScene, index: NodeIndex) -> Self {
        Self { scene, index }
    }

    pub fn index(&self) -> NodeIndex {
        self.index
    }

    fn read<R: Default>(&self, f: impl FnOnce(&Node) -> R) -> R {
        lock(&self.scene).get(self.index).map(f).unwrap_or_default()
    }

    fn write(&self, f: impl FnOnce(&mut Node)) {
        if let Some(node) = lock(&self.scene).get_mut(self.index) {
            f(node);
        }
    }

    fn sibling(&self, index: NodeIndex) -> Self {
        Self::new(self.scene.clone(), index)
    }
}

/// The active scene (`scene`)
#[derive(Clone)]
pub struct SceneHandle {
    scene: SharedScene,
}

impl SceneHandle {
    pub fn new(scene: SharedScene) -> Self {
        Self { scene }
    }

    fn node(&self, index: Option<NodeIndex>) -> Dynamic {
        match index {
            Some(index) => Dynamic::from(NodeHandle::new(self.scene.clone(), index)),
            None => Dynamic::UNIT,
        }
    }
}

/// The active camera (`camera`)
#[derive(Clone)]
pub struct CameraHandle {
    camera: SharedCamera,
}

impl CameraHandle {
    pub fn new(camera: SharedCamera) -> Self {
        Self { camera }
    }
}

/// Renderer settings (`renderer`)
#[derive(Clone)]
pub struct RendererHandle {
    settings: SharedRendererSettings,
}

impl RendererHandle {
    pub fn new(settings: SharedRendererSettings) -> Self {
        Self { settings }
    }
}

/// The player (`player`)
#[derive(Clone)]
pub struct PlayerHandle {
    status: Shared<PlayerStatus>,
}

impl PlayerHandle {
    pub fn new(status: Shared<PlayerStatus>) -> Self {
        Self { status }
    }
}

/// Register all API functions on the Rhai engine
pub fn register_all(engine: &mut Engine) {
    register_vec3_api(engine);
    register_node_api(engine);
    register_scene_api(engine);
    register_camera_api(engine);
    register_renderer_api(engine);
    register_player_api(engine);
    register_log_api(engine);
}

/// Accept both INT and FLOAT script values where a number is expected
fn num(value: &Dynamic) -> FnResult<f32> {
    if let Ok(f) = value.as_float() {
        return Ok(f as f32);
    }
    if let Ok(i) = value.as_int() {
        return Ok(i as f32);
    }
    Err(format!("expected a number, found {}", value.type_name()).into())
}

fn vec3_of(x: &Dynamic, y: &Dynamic, z: &Dynamic) -> FnResult<Vec3> {
    Ok(Vec3::new(num(x)?, num(y)?, num(z)?))
}

// ─── Vec3 ────────────────────────────────────────────────

fn register_vec3_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<Vec3>("Vec3")
        .register_fn("vec3", |x: Dynamic, y: Dynamic, z: Dynamic| vec3_of(&x, &y, &z))
        .register_get("x", |v: &mut Vec3| v.x as FLOAT)
        .register_set("x", |v: &mut Vec3, x: Dynamic| -> FnResult<()> {
            v.x = num(&x)?;
            Ok(())
        })
        .register_get("y", |v: &mut Vec3| v.y as FLOAT)
        .register_set("y", |v: &mut Vec3, y: Dynamic| -> FnResult<()> {
            v.y = num(&y)?;
            Ok(())
        })
        .register_get("z", |v: &mut Vec3| v.z as FLOAT)
        .register_set("z", |v: &mut Vec3, z: Dynamic| -> FnResult<()> {
            v.z = num(&z)?;
            Ok(())
        })
        .register_fn("length", |v: &mut Vec3| v.length() as FLOAT)
        .register_fn("+", |a: Vec3, b: Vec3| a + b)
        .register_fn("-", |a: Vec3, b: Vec3| a - b)
        .register_fn("*", |a: Vec3, s: FLOAT| a * s as f32)
        .register_fn("==", |a: Vec3, b: Vec3| a == b)
        .register_fn("to_string", |v: &mut Vec3| format!("({}, {}, {})", v.x, v.y, v.z))
        .register_fn("to_debug", |v: &mut Vec3| format!("vec3({}, {}, {})", v.x, v.y, v.z));
}

// ─── Node ────────────────────────────────────────────────

fn register_node_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<NodeHandle>("Node")
        .register_get("uuid", |h: &mut NodeHandle| h.read(|n| n.uuid.to_string()))
        .register_get("kind", |h: &mut NodeHandle| h.read(|n| n.kind.clone()))
        .register_get_set(
            "name",
            |h: &mut NodeHandle| h.read(|n| n.name.clone()),
            |h: &mut NodeHandle, name: String| h.write(|n| n.name = name),
        )
        .register_get_set(
            "visible",
            |h: &mut NodeHandle| h.read(|n| n.visible),
            |h: &mut NodeHandle, visible: bool| h.write(|n| n.visible = visible),
        )
        .register_get_set(
            "position",
            |h: &mut NodeHandle| h.read(|n| n.transform.position),
            |h: &mut NodeHandle, v: Vec3| h.write(|n| n.transform.position = v),
        )
        .register_get_set(
            "rotation",
            |h: &mut NodeHandle| h.read(|n| n.transform.rotation),
            |h: &mut NodeHandle, v: Vec3| h.write(|n| n.transform.rotation = v),
        )
        .register_get_set(
            "scale",
            |h: &mut NodeHandle| h.read(|n| n.transform.scale),
            |h: &mut NodeHandle, v: Vec3| h.write(|n| n.transform.scale = v),
        );

    engine.register_fn(
        "set_position",
        |h: &mut NodeHandle, x: Dynamic, y: Dynamic, z: Dynamic| -> FnResult<()> {
            let v = vec3_of(&x, &y, &z)?;
            h.write(|n| n.transform.position = v);
            Ok(())
        },
    );
    engine.register_fn(
        "translate",
        |h: &mut NodeHandle, x: Dynamic, y: Dynamic, z: Dynamic| -> FnResult<()> {
            let v = vec3_of(&x, &y, &z)?;
            h.write(|n| n.transform.position = n.transform.position + v);
            Ok(())
        },
    );
    engine.register_fn("rotate_x", |h: &mut NodeHandle, angle: Dynamic| -> FnResult<()> {
        let a = num(&angle)?;
        h.write(|n| n.transform.rotation.x += a);
        Ok(())
    });
    engine.register_fn("rotate_y", |h: &mut NodeHandle, angle: Dynamic| -> FnResult<()> {
        let a = num(&angle)?;
        h.write(|n| n.transform.rotation.y += a);
        Ok(())
    });
    engine.register_fn("rotate_z", |h: &mut NodeHandle, angle: Dynamic| -> FnResult<()> {
        let a = num(&angle)?;
        h.write(|n| n.transform.rotation.z += a);
        Ok(())
    });

    engine.register_fn("user_data", |h: &mut NodeHandle, key: &str| -> FnResult<Dynamic> {
        match h.read(|n| n.user_data.get(key).cloned()) {
            Some(value) => rhai::serde::to_dynamic(value),
            None => Ok(Dynamic::UNIT),
        }
    });
    engine.register_fn(
        "set_user_data",
        |h: &mut NodeHandle, key: &str, value: Dynamic| -> FnResult<()> {
            let value: serde_json::Value = rhai::serde::from_dynamic(&value)?;
            h.write(|n| {
                n.user_data.insert(key.to_string(), value);
            });
            Ok(())
        },
    );

    engine.register_fn("children", |h: &mut NodeHandle| -> Array {
        let indices = h.read(|n| n.children().to_vec());
        indices
            .into_iter()
            .map(|idx| Dynamic::from(h.sibling(idx)))
            .collect()
    });
    engine.register_fn("parent", |h: &mut NodeHandle| -> Dynamic {
        match h.read(|n| n.parent()) {
            Some(idx) => Dynamic::from(h.sibling(idx)),
            None => Dynamic::UNIT,
        }
    });
    engine.register_fn("has_animations", |h: &mut NodeHandle| {
        h.read(|n| !n.animations.is_empty() || n.mixer.is_some())
    });
    engine.register_fn("to_string", |h: &mut NodeHandle| {
        h.read(|n| format!("{} '{}' ({})", n.kind, n.name, n.uuid))
    });
}

// ─── Scene ───────────────────────────────────────────────

fn register_scene_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<SceneHandle>("Scene")
        .register_fn("root", |s: &mut SceneHandle| {
            let root = lock(&s.scene).root();
            NodeHandle::new(s.scene.clone(), root)
        })
        .register_fn("find_by_name", |s: &mut SceneHandle, name: &str| {
            let found = lock(&s.scene).find_by_name(name);
            s.node(found)
        })
        .register_fn("find_by_uuid", |s: &mut SceneHandle, uuid: &str| {
            let found = lock(&s.scene).find_by_uuid(uuid);
            s.node(found)
        })
        .register_fn("node_count", |s: &mut SceneHandle| lock(&s.scene).len() as INT);
}

// ─── Camera ──────────────────────────────────────────────

fn register_camera_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<CameraHandle>("Camera")
        .register_get_set(
            "position",
            |c: &mut CameraHandle| lock(&c.camera).position,
            |c: &mut CameraHandle, v: Vec3| lock(&c.camera).position = v,
        )
        .register_get("fov", |c: &mut CameraHandle| lock(&c.camera).fov as FLOAT)
        .register_set("fov", |c: &mut CameraHandle, fov: Dynamic| -> FnResult<()> {
            lock(&c.camera).fov = num(&fov)?;
            Ok(())
        })
        .register_get("zoom", |c: &mut CameraHandle| lock(&c.camera).zoom as FLOAT)
        .register_set("zoom", |c: &mut CameraHandle, zoom: Dynamic| -> FnResult<()> {
            lock(&c.camera).zoom = num(&zoom)?;
            Ok(())
        })
        .register_get("aspect", |c: &mut CameraHandle| lock(&c.camera).aspect as FLOAT)
        .register_fn(
            "look_at",
            |c: &mut CameraHandle, x: Dynamic, y: Dynamic, z: Dynamic| -> FnResult<()> {
                let target = vec3_of(&x, &y, &z)?;
                lock(&c.camera).look_at(target);
                Ok(())
            },
        )
        .register_fn("look_at", |c: &mut CameraHandle, target: Vec3| {
            lock(&c.camera).look_at(target)
        })
        .register_fn("update_projection_matrix", |c: &mut CameraHandle| {
            lock(&c.camera).update_projection_matrix()
        });
}

// ─── Renderer ────────────────────────────────────────────

fn register_renderer_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<RendererHandle>("Renderer")
        .register_get_set(
            "shadows",
            |r: &mut RendererHandle| lock(&r.settings).shadows,
            |r: &mut RendererHandle, on: bool| lock(&r.settings).shadows = on,
        )
        .register_get("tone_mapping_exposure", |r: &mut RendererHandle| {
            lock(&r.settings).tone_mapping_exposure as FLOAT
        })
        .register_set(
            "tone_mapping_exposure",
            |r: &mut RendererHandle, exposure: Dynamic| -> FnResult<()> {
                lock(&r.settings).tone_mapping_exposure = num(&exposure)?;
                Ok(())
            },
        )
        .register_get("width", |r: &mut RendererHandle| lock(&r.settings).width as FLOAT)
        .register_get("height", |r: &mut RendererHandle| lock(&r.settings).height as FLOAT)
        .register_get("pixel_ratio", |r: &mut RendererHandle| {
            lock(&r.settings).pixel_ratio as FLOAT
        });
}

// ─── Player ──────────────────────────────────────────────

fn register_player_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<PlayerHandle>("Player")
        .register_get("width", |p: &mut PlayerHandle| lock(&p.status).width as FLOAT)
        .register_get("height", |p: &mut PlayerHandle| lock(&p.status).height as FLOAT)
        .register_get("is_playing", |p: &mut PlayerHandle| lock(&p.status).playing)
        .register_fn("stop", |p: &mut PlayerHandle| {
            lock(&p.status).push_command(PlayerCommand::Stop)
        })
        .register_fn(
            "set_size",
            |p: &mut PlayerHandle, width: Dynamic, height: Dynamic| -> FnResult<()> {
                let (width, height) = (num(&width)? as f64, num(&height)? as f64);
                lock(&p.status).push_command(PlayerCommand::SetSize { width, height });
                Ok(())
            },
        );
}

// ─── Logging ─────────────────────────────────────────────

fn register_log_api(engine: &mut Engine) {
    engine.register_fn("log", |msg: Dynamic| {
        info!(target: "stage::script", "{}", msg);
    });
    engine.register_fn("log_warn", |msg: Dynamic| {
        warn!(target: "stage::script", "{}", msg);
    });
    engine.register_fn("log_error", |msg: Dynamic| {
        error!(target: "stage::script", "{}", msg);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhai::Scope;
    use stage_core::{shared, Transform};
    use stage_scene::{Camera, SceneGraph};

    fn engine() -> Engine {
        let mut engine = Engine::new();
        register_all(&mut engine);
        engine
    }

    fn scene() -> SharedScene {
        let mut graph = SceneGraph::new(Node::new("Scene", "Scene").with_uuid("root"));
        let root = graph.root();
        let mut cube = Node::new("Cube", "Mesh")
            .with_uuid("cube")
            .with_transform(Transform::from_position(Vec3::new(1.0, 2.0, 3.0)));
        cube.user_data.insert("speed".into(), serde_json::json!(2.5));
        graph.add_child(root, cube).unwrap();
        shared(graph)
    }

    #[test]
    fn test_node_properties() {
        let engine = engine();
        let scene = scene();
        let cube = lock(&scene).find_by_uuid("cube").unwrap();
        let mut scope = Scope::new();
        scope.push("node", NodeHandle::new(scene.clone(), cube));

        let name: String = engine.eval_with_scope(&mut scope, "node.name").unwrap();
        assert_eq!(name, "Cube");
        let y: FLOAT = engine.eval_with_scope(&mut scope, "node.position.y").unwrap();
        assert_eq!(y, 2.0);
        let speed: FLOAT = engine.eval_with_scope(&mut scope, "node.user_data(\"speed\")").unwrap();
        assert_eq!(speed, 2.5);
    }

    #[test]
    fn test_node_mutation_reaches_scene() {
        let engine = engine();
        let scene = scene();
        let cube = lock(&scene).find_by_uuid("cube").unwrap();
        let mut scope = Scope::new();
        scope.push("node", NodeHandle::new(scene.clone(), cube));

        engine
            .run_with_scope(
                &mut scope,
                r#"
                    node.translate(1, 0, 0.5);
                    node.rotate_y(0.25);
                    node.visible = false;
                    node.set_user_data("hits", 3);
                "#,
            )
            .unwrap();

        let graph = lock(&scene);
        let node = graph.get(cube).unwrap();
        assert_eq!(node.transform.position, Vec3::new(2.0, 2.0, 3.5));
        assert_eq!(node.transform.rotation.y, 0.25);
        assert!(!node.visible);
        assert_eq!(node.user_data["hits"], 3);
    }

    #[test]
    fn test_scene_lookup_and_hierarchy() {
        let engine = engine();
        let mut scope = Scope::new();
        scope.push("scene", SceneHandle::new(scene()));

        let count: INT = engine.eval_with_scope(&mut scope, "scene.node_count()").unwrap();
        assert_eq!(count, 2);
        let parent: String = engine
            .eval_with_scope(&mut scope, "scene.find_by_name(\"Cube\").parent().name")
            .unwrap();
        assert_eq!(parent, "Scene");
        let kids: INT = engine
            .eval_with_scope(&mut scope, "scene.root().children().len()")
            .unwrap();
        assert_eq!(kids, 1);
        let missing: bool = engine
            .eval_with_scope(&mut scope, "scene.find_by_uuid(\"nope\") == ()")
            .unwrap();
        assert!(missing);
    }

    #[test]
    fn test_camera_and_player_handles() {
        let engine = engine();
        let camera = shared(Camera::new());
        let status = shared(PlayerStatus::new(800.0, 600.0));
        let mut scope = Scope::new();
        scope.push("camera", CameraHandle::new(camera.clone()));
        scope.push("player", PlayerHandle::new(status.clone()));

        engine
            .run_with_scope(
                &mut scope,
                r#"
                    camera.fov = 75;
                    camera.look_at(vec3(1.0, 0.0, 0.0));
                    camera.update_projection_matrix();
                    if player.width == 800.0 { player.set_size(320, 240); }
                    player.stop();
                "#,
            )
            .unwrap();

        assert_eq!(lock(&camera).fov, 75.0);
        assert_eq!(lock(&camera).target, Vec3::new(1.0, 0.0, 0.0));
        let commands = lock(&status).drain_commands();
        assert_eq!(
            commands,
            vec![
                PlayerCommand::SetSize {
                    width: 320.0,
                    height: 240.0
                },
                PlayerCommand::Stop
            ]
        );
    }

    #[test]
    fn test_non_numeric_argument_is_script_error() {
        let engine = engine();
        let scene = scene();
        let mut scope = Scope::new();
        scope.push("node", NodeHandle::new(scene.clone(), lock(&scene).root()));
        let err = engine
            .run_with_scope(&mut scope, "node.set_position(\"a\", 0, 0)")
            .unwrap_err();
        assert!(err.to_string().contains("expected a number"));
    }
}
