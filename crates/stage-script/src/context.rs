//! Host state reachable from scripts and the deferred player commands they queue
//!
//! Scripts never call back into the player directly. Player-level requests
//! (`player.stop()`, `player.set_size(w, h)`) are queued here and applied by
//! the player once the current dispatch has finished.

use stage_core::{shared, Shared};
use stage_scene::{SharedCamera, SharedRendererSettings, SharedScene};

/// Deferred actions requested by scripts
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Stop,
    SetSize { width: f64, height: f64 },
}

/// Player state mirrored for scripts
#[derive(Debug, Clone, Default)]
pub struct PlayerStatus {
    pub width: f64,
    pub height: f64,
    pub playing: bool,
    commands: Vec<PlayerCommand>,
}

impl PlayerStatus {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            playing: false,
            commands: Vec::new(),
        }
    }

    pub fn push_command(&mut self, command: PlayerCommand) {
        self.commands.push(command);
    }

    /// Take every queued command, oldest first
    pub fn drain_commands(&mut self) -> Vec<PlayerCommand> {
        std::mem::take(&mut self.commands)
    }
}

/// The handles a script is bound against
#[derive(Clone)]
pub struct ScriptContext {
    pub player: Shared<PlayerStatus>,
    pub renderer: SharedRendererSettings,
    pub scene: SharedScene,
    pub camera: SharedCamera,
}

impl ScriptContext {
    pub fn new(
        player: Shared<PlayerStatus>,
        renderer: SharedRendererSettings,
        scene: SharedScene,
        camera: SharedCamera,
    ) -> Self {
        Self {
            player,
            renderer,
            scene,
            camera,
        }
    }

    /// Context over fresh state, for tests and tools
    pub fn detached(scene: stage_scene::SceneGraph, camera: stage_scene::Camera) -> Self {
        Self {
            player: shared(PlayerStatus::new(500.0, 500.0)),
            renderer: shared(Default::default()),
            scene: shared(scene),
            camera: shared(camera),
        }
    }
}
