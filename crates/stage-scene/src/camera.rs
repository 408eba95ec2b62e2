//! Perspective camera

use stage_core::{NodeId, Shared, Vec3};

/// Active camera, shared between the player and script handles
pub type SharedCamera = Shared<Camera>;

/// A perspective camera looking from `position` toward `target`
#[derive(Debug, Clone)]
pub struct Camera {
    pub uuid: NodeId,
    pub name: String,
    pub position: Vec3,
    /// Point the camera looks at
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub zoom: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,
    projection: [[f32; 4]; 4],
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            uuid: NodeId::generate(),
            name: "Camera".to_string(),
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
            up: Vec3::UP,
            fov: 50.0,
            near: 0.01,
            far: 1000.0,
            zoom: 1.0,
            aspect: 1.0,
            projection: [[0.0; 4]; 4],
        };
        camera.update_projection_matrix();
        camera
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the camera at `target`
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Recompute the cached projection after changing fov, zoom, aspect or clip planes
    pub fn update_projection_matrix(&mut self) {
        let half_fov = (self.fov.to_radians() / 2.0).tan();
        let f = self.zoom / half_fov;
        let aspect = if self.aspect > 0.0 { self.aspect } else { 1.0 };
        let depth = self.far - self.near;

        self.projection = [
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, -(self.far + self.near) / depth, -1.0],
            [0.0, 0.0, -(2.0 * self.far * self.near) / depth, 0.0],
        ];
    }

    /// Projection matrix as of the last `update_projection_matrix` (column-major)
    pub fn projection_matrix(&self) -> [[f32; 4]; 4] {
        self.projection
    }

    /// View matrix (4x4, column-major)
    pub fn view_matrix(&self) -> [[f32; 4]; 4] {
        let f = (self.target - self.position).normalized();
        let s = f.cross(&self.up).normalized();
        let u = s.cross(&f);

        [
            [s.x, u.x, -f.x, 0.0],
            [s.y, u.y, -f.y, 0.0],
            [s.z, u.z, -f.z, 0.0],
            [
                -s.dot(&self.position),
                -u.dot(&self.position),
                f.dot(&self.position),
                1.0,
            ],
        ]
    }
}
