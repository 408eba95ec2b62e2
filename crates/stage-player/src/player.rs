//! Player: project loading, lifecycle and the frame loop
//!
//! The host owns scheduling. It calls `on_frame` once per display frame and
//! forwards raw input through `handle_input`; the player does the rest.

use crate::config::PlayerConfig;
use crate::renderer::Renderer;
use log::{debug, error, info, warn};
use serde::Serialize;
use stage_core::{lock, shared, Result, Shared, StageError};
use stage_runtime::{
    Channel, Clock, InputEvent, InputRelay, SystemTimeSource, TimeSource, UpdateEvent,
};
use stage_scene::{
    advance_animations, bind_animations, Camera, JsonSceneParser, ProjectDocument,
    RendererSettings, SceneGraph, SceneParser, SharedCamera, SharedRendererSettings, SharedScene,
};
use stage_script::{
    bind, to_payload, BindReport, DispatchSummary, Payload, PlayerCommand, PlayerStatus,
    RuntimeDiagnostic, ScriptContext, ScriptEngine, ScriptRuntime,
};

/// Where the player is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Nothing loaded yet
    Idle,
    Loaded,
    Playing,
    Stopped,
    /// Terminal; every later call is ignored or fails
    Disposed,
}

/// A scripted scene player
pub struct Player {
    engine: ScriptEngine,
    parser: Box<dyn SceneParser>,
    renderer: Box<dyn Renderer>,
    clock: Clock,
    relay: InputRelay,
    state: PlayerState,

    status: Shared<PlayerStatus>,
    settings: SharedRendererSettings,
    scene: Option<SharedScene>,
    camera: Option<SharedCamera>,
    runtime: ScriptRuntime,
    last_report: BindReport,

    width: f64,
    height: f64,
    start_time: f64,
    prev_time: f64,
}

impl Player {
    /// Create a player on the system clock
    pub fn new(config: &PlayerConfig, renderer: Box<dyn Renderer>) -> Self {
        Self::with_time_source(config, renderer, Box::new(SystemTimeSource::new()))
    }

    pub fn with_time_source(
        config: &PlayerConfig,
        renderer: Box<dyn Renderer>,
        time: Box<dyn TimeSource>,
    ) -> Self {
        let viewport = config.viewport;
        let settings = RendererSettings {
            width: viewport.width,
            height: viewport.height,
            pixel_ratio: viewport.pixel_ratio,
            ..Default::default()
        };

        let mut player = Self {
            engine: ScriptEngine::new(config.scripts),
            parser: Box::new(JsonSceneParser::new()),
            renderer,
            clock: Clock::new(time),
            relay: InputRelay::new(),
            state: PlayerState::Idle,
            status: shared(PlayerStatus::new(viewport.width, viewport.height)),
            settings: shared(settings),
            scene: None,
            camera: None,
            runtime: ScriptRuntime::default(),
            last_report: BindReport::default(),
            width: viewport.width,
            height: viewport.height,
            start_time: 0.0,
            prev_time: 0.0,
        };
        player.configure_renderer();
        player
    }

    /// Replace the scene parser used by `load`
    pub fn set_parser(&mut self, parser: Box<dyn SceneParser>) {
        self.parser = parser;
    }

    // ─── Loading ─────────────────────────────────────────

    /// Parse a project document from JSON and load it
    pub fn load_str(&mut self, json: &str) -> Result<()> {
        let document = ProjectDocument::from_json(json)?;
        self.load(&document)
    }

    /// Load a project: renderer flags, scene, camera, scripts, then `init`.
    ///
    /// A playing player is stopped first. Scene and camera are parsed before
    /// anything changes, so a malformed document leaves the player untouched.
    pub fn load(&mut self, document: &ProjectDocument) -> Result<()> {
        if self.state == PlayerState::Disposed {
            return Err(StageError::Disposed);
        }

        let scene = self.parser.parse_scene(&document.scene)?;
        let camera = self.parser.parse_camera(&document.camera)?;

        if self.state == PlayerState::Playing {
            self.stop();
        }

        lock(&self.settings).apply_flags(&document.project);
        self.configure_renderer();
        self.set_scene(scene);
        self.set_camera(camera);

        let (Some(scene), Some(camera)) = (self.scene.clone(), self.camera.clone()) else {
            return Err(StageError::SceneError("no active scene".to_string()));
        };
        let ctx = ScriptContext::new(self.status.clone(), self.settings.clone(), scene, camera);
        let outcome = bind(&self.engine, &ctx, &document.scripts);
        for diag in &outcome.report.diagnostics {
            debug!(target: "stage::player", "{}", diag);
        }
        self.runtime = outcome.runtime;
        self.last_report = outcome.report;
        self.state = PlayerState::Loaded;

        info!(
            target: "stage::player",
            "Loaded project: {} script node(s), {} script(s) bound, {} handler(s)",
            document.script_node_count(),
            self.last_report.bound_scripts,
            self.last_report.handlers
        );

        self.dispatch(Channel::Init, &to_payload(document));
        Ok(())
    }

    // ─── Lifecycle ───────────────────────────────────────

    pub fn play(&mut self) {
        self.play_with(&());
    }

    /// Start playback, passing `payload` to `start` handlers
    pub fn play_with<T: Serialize>(&mut self, payload: &T) {
        if !matches!(self.state, PlayerState::Loaded | PlayerState::Stopped) {
            warn!(target: "stage::player", "play() ignored in state {:?}", self.state);
            return;
        }

        let now = self.clock.now_ms();
        self.start_time = now;
        self.prev_time = now;
        self.clock.get_delta();
        self.state = PlayerState::Playing;
        lock(&self.status).playing = true;
        self.relay.install();

        self.dispatch(Channel::Start, &to_payload(payload));
    }

    pub fn stop(&mut self) {
        self.stop_with(&());
    }

    /// Stop playback, passing `payload` to `stop` handlers
    pub fn stop_with<T: Serialize>(&mut self, payload: &T) {
        if self.state != PlayerState::Playing {
            warn!(target: "stage::player", "stop() ignored in state {:?}", self.state);
            return;
        }

        self.relay.remove();
        self.state = PlayerState::Stopped;
        lock(&self.status).playing = false;
        self.dispatch(Channel::Stop, &to_payload(payload));
    }

    /// Stop if playing, release the renderer and drop scene, camera and handlers
    pub fn dispose(&mut self) {
        if self.state == PlayerState::Disposed {
            return;
        }
        if self.state == PlayerState::Playing {
            self.stop();
        }

        self.renderer.dispose();
        self.scene = None;
        self.camera = None;
        self.runtime = ScriptRuntime::default();
        self.state = PlayerState::Disposed;
        info!(target: "stage::player", "Player disposed");
    }

    // ─── Scene, camera and viewport ─────────────────────

    /// Make `scene` active and bind its animations
    pub fn set_scene(&mut self, mut scene: SceneGraph) {
        bind_animations(&mut scene);
        self.scene = Some(shared(scene));
    }

    /// Make `camera` active with the current viewport aspect
    pub fn set_camera(&mut self, mut camera: Camera) {
        camera.aspect = (self.width / self.height) as f32;
        camera.update_projection_matrix();
        self.camera = Some(shared(camera));
    }

    /// Resize the viewport. Non-positive or non-finite sizes are rejected.
    pub fn set_size(&mut self, width: f64, height: f64) {
        if let Err(err) = validate_size(width, height) {
            warn!(target: "stage::player", "set_size() ignored: {}", err);
            return;
        }

        self.width = width;
        self.height = height;
        if let Some(camera) = &self.camera {
            let mut camera = lock(camera);
            camera.aspect = (width / height) as f32;
            camera.update_projection_matrix();
        }
        {
            let mut settings = lock(&self.settings);
            settings.width = width;
            settings.height = height;
        }
        {
            let mut status = lock(&self.status);
            status.width = width;
            status.height = height;
        }
        self.configure_renderer();
    }

    pub fn set_pixel_ratio(&mut self, ratio: f64) {
        if !(ratio.is_finite() && ratio > 0.0) {
            warn!(target: "stage::player", "set_pixel_ratio() ignored: {}", ratio);
            return;
        }
        lock(&self.settings).pixel_ratio = ratio;
        self.configure_renderer();
    }

    // ─── Frames and input ────────────────────────────────

    /// Advance one frame. Returns `false` without doing anything unless playing.
    pub fn on_frame(&mut self) -> bool {
        if self.state != PlayerState::Playing {
            return false;
        }

        let delta = self.clock.get_delta();
        if let Some(scene) = &self.scene {
            advance_animations(&mut lock(scene), delta);
        }

        let time = self.clock.now_ms();
        let event = UpdateEvent {
            time: time - self.start_time,
            delta: time - self.prev_time,
        };
        self.dispatch(Channel::Update, &to_payload(&event));
        self.render_frame();

        self.prev_time = time;
        true
    }

    /// Render a single frame at `time` seconds without advancing playback.
    ///
    /// `update` handlers see `time` in milliseconds and a zero delta.
    pub fn render(&mut self, time: f64) {
        if self.state == PlayerState::Disposed {
            warn!(target: "stage::player", "render() ignored: player disposed");
            return;
        }
        let event = UpdateEvent {
            time: time * 1000.0,
            delta: 0.0,
        };
        self.dispatch(Channel::Update, &to_payload(&event));
        self.render_frame();
    }

    /// Forward a raw input event to its channel. Returns whether it was delivered.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        let Some(channel) = self.relay.relay(event) else {
            return false;
        };
        self.dispatch(channel, &to_payload(&event.payload()));
        true
    }

    // ─── Inspection ──────────────────────────────────────

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    /// Diagnostics from the most recent `load`
    pub fn last_bind_report(&self) -> &BindReport {
        &self.last_report
    }

    /// Handler failures recorded since the last call
    pub fn drain_runtime_diagnostics(&mut self) -> Vec<RuntimeDiagnostic> {
        self.runtime.drain_diagnostics()
    }

    pub fn scene(&self) -> Option<SharedScene> {
        self.scene.clone()
    }

    pub fn camera(&self) -> Option<SharedCamera> {
        self.camera.clone()
    }

    pub fn renderer_settings(&self) -> SharedRendererSettings {
        self.settings.clone()
    }

    /// Handler count on `channel`
    pub fn handler_count(&self, channel: Channel) -> usize {
        self.runtime.registry().len(channel)
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn prev_time(&self) -> f64 {
        self.prev_time
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    // ─── Internals ───────────────────────────────────────

    /// Dispatch on `channel`, then apply whatever player commands the handlers queued
    fn dispatch(&mut self, channel: Channel, payload: &Payload) -> DispatchSummary {
        let summary = self.runtime.dispatch(&self.engine, channel, payload);
        if summary.failed > 0 {
            debug!(
                target: "stage::player",
                "{}: {} of {} handler(s) failed",
                channel,
                summary.failed,
                summary.invoked
            );
        }
        self.apply_commands();
        summary
    }

    fn apply_commands(&mut self) {
        loop {
            let commands = lock(&self.status).drain_commands();
            if commands.is_empty() {
                break;
            }
            for command in commands {
                match command {
                    PlayerCommand::Stop => self.stop(),
                    PlayerCommand::SetSize { width, height } => self.set_size(width, height),
                }
            }
        }
    }

    fn render_frame(&mut self) {
        let (Some(scene), Some(camera)) = (&self.scene, &self.camera) else {
            return;
        };
        let settings = lock(&self.settings).clone();
        let scene = lock(scene);
        let camera = lock(camera);
        if let Err(e) = self.renderer.render(&settings, &scene, &camera) {
            error!(target: "stage::player", "Render error: {}", e);
        }
    }

    fn configure_renderer(&mut self) {
        let settings = lock(&self.settings).clone();
        self.renderer.configure(&settings);
    }
}

fn validate_size(width: f64, height: f64) -> Result<()> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(StageError::InvalidSize { width, height })
    }
}
