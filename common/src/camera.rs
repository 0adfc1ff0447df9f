//! Orthographic camera for the plane view

use glam::{Mat4, Vec2, Vec3};

/// 2D orthographic camera.
///
/// `zoom` is the half-height of the visible region in world units.
#[derive(Debug, Clone)]
pub struct Camera2D {
    pub position: Vec3,
    pub zoom: f32,
    pub aspect_ratio: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Camera2D {
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            zoom: 1.0,
            aspect_ratio,
            min_zoom: 1.0,
            max_zoom: 100.0,
        }
    }

    pub fn with_zoom_limits(mut self, min_zoom: f32, max_zoom: f32) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
        self
    }

    pub fn view_projection(&self) -> Mat4 {
        let half_width = self.zoom * self.aspect_ratio;
        let half_height = self.zoom;

        let projection = Mat4::orthographic_rh(
            -half_width,
            half_width,
            -half_height,
            half_height,
            -1.0,
            1.0,
        );

        let view = Mat4::from_translation(-self.position);

        projection * view
    }

    pub fn update_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Move by a fraction of the visible half-height.
    pub fn pan(&mut self, direction: Vec2, fraction: f32) {
        let step = direction * self.zoom * fraction;
        self.position.x += step.x;
        self.position.y += step.y;
    }

    /// Scroll-wheel zoom; positive `delta` zooms in.
    pub fn zoom_by(&mut self, delta: f32) {
        self.zoom = (self.zoom * (1.0 - delta * 0.1)).clamp(self.min_zoom, self.max_zoom);
    }

    /// Center on `target` so that `half_extent` fits vertically.
    pub fn frame(&mut self, target: Vec2, half_extent: f32) {
        self.position = target.extend(0.0);
        self.zoom = half_extent.clamp(self.min_zoom, self.max_zoom);
    }
}

/// Camera uniform data for shaders
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub position: [f32; 4],
}

impl From<&Camera2D> for CameraUniform {
    fn from(camera: &Camera2D) -> Self {
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            position: [camera.position.x, camera.position.y, camera.position.z, 1.0],
        }
    }
}
