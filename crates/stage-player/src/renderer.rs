//! Rendering backend seam and the headless implementation

use log::{debug, trace};
use stage_core::{lock, mat4_mul, Result, Shared, StageError};
use stage_scene::{Camera, NodeIndex, RendererSettings, SceneGraph};

/// A backend that draws the active scene through the active camera
pub trait Renderer {
    /// Apply renderer flags, surface size and pixel ratio
    fn configure(&mut self, settings: &RendererSettings);

    /// Draw one frame
    fn render(
        &mut self,
        settings: &RendererSettings,
        scene: &SceneGraph,
        camera: &Camera,
    ) -> Result<()>;

    /// Release backend resources; later renders fail
    fn dispose(&mut self);
}

/// What the headless renderer observed, readable from outside the player
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderStats {
    pub frames: u64,
    /// Drawing buffer size in device pixels
    pub buffer_size: (u32, u32),
    pub configured: u32,
    /// Nodes drawn in the last frame (visible, with every ancestor visible)
    pub drawn_nodes: usize,
    /// Camera aspect used for the last frame
    pub last_aspect: f32,
    /// Clip-space origin of every drawn node in the last frame
    pub clip_positions: Vec<[f32; 4]>,
    pub disposed: bool,
}

/// Renderer without a GPU surface; walks the scene and records stats
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    stats: Shared<RenderStats>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the stats, valid after the renderer is boxed
    pub fn stats(&self) -> Shared<RenderStats> {
        self.stats.clone()
    }
}

impl Renderer for HeadlessRenderer {
    fn configure(&mut self, settings: &RendererSettings) {
        let mut stats = lock(&self.stats);
        stats.buffer_size = settings.drawing_buffer_size();
        stats.configured += 1;
        debug!(
            target: "stage::render",
            "Configured {}x{} @{} (shadows: {}, tone mapping: {:?} x{})",
            settings.width,
            settings.height,
            settings.pixel_ratio,
            settings.shadows,
            settings.tone_mapping,
            settings.tone_mapping_exposure
        );
    }

    fn render(
        &mut self,
        _settings: &RendererSettings,
        scene: &SceneGraph,
        camera: &Camera,
    ) -> Result<()> {
        let mut stats = lock(&self.stats);
        if stats.disposed {
            return Err(StageError::RenderError("renderer disposed".to_string()));
        }

        let view_projection = mat4_mul(&camera.projection_matrix(), &camera.view_matrix());
        let mut clip_positions = Vec::new();
        for index in visible_nodes(scene) {
            if let Some(world) = scene.world_matrix(index) {
                let mvp = mat4_mul(&view_projection, &world);
                clip_positions.push(mvp[3]);
            }
        }

        stats.frames += 1;
        stats.drawn_nodes = clip_positions.len();
        stats.last_aspect = camera.aspect;
        stats.clip_positions = clip_positions;
        trace!(
            target: "stage::render",
            "Frame {}: {} node(s)",
            stats.frames,
            stats.drawn_nodes
        );
        Ok(())
    }

    fn dispose(&mut self) {
        lock(&self.stats).disposed = true;
    }
}

/// Nodes whose own flag and every ancestor's flag are visible, in pre-order
fn visible_nodes(scene: &SceneGraph) -> Vec<NodeIndex> {
    let mut out = Vec::new();
    let mut stack = vec![scene.root()];
    while let Some(index) = stack.pop() {
        let Some(node) = scene.get(index) else {
            continue;
        };
        if !node.visible {
            continue;
        }
        out.push(index);
        stack.extend(node.children().iter().rev().copied());
    }
    out
}
