/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Axis the spin angle rotates around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpinAxis {
    Y,
    #[default]
    Z,
}

impl SpinAxis {
    pub fn unit(self) -> Vector3<f32> {
        match self {
            SpinAxis::Y => Vector3::y(),
            SpinAxis::Z => Vector3::z(),
        }
    }
}

/// Fixed camera parameters, set once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    pub near: f32,
    pub far: f32,
    /// Where the model sits before it is rotated and scaled
    pub model_translation: [f32; 3],
    pub spin_axis: SpinAxis,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, -0.5],
            target: [0.0, 0.0, -5.0],
            up: [0.0, 1.0, 0.0],
            near: 1.0,
            far: 10.0,
            model_translation: [0.0, 0.0, -5.0],
            spin_axis: SpinAxis::Z,
        }
    }
}

/// Drawable surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height; a zero height counts as one pixel
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Look-at camera with a frustum projection
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub near: f32,
    pub far: f32,
    view: Matrix4<f32>,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        let position = Point3::from(config.eye);
        let target = Point3::from(config.target);
        let up = Vector3::from(config.up);
        Self {
            position,
            target,
            up,
            near: config.near,
            far: config.far,
            view: Matrix4::look_at_rh(&position, &target, &up),
        }
    }

    /// The view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        self.view
    }

    /// Frustum spanning `[-aspect, aspect] x [-1, 1]` on the near plane
    pub fn projection_matrix(&self, viewport: Viewport) -> Matrix4<f32> {
        let ratio = viewport.aspect();
        frustum(-ratio, ratio, -1.0, 1.0, self.near, self.far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

/// Perspective frustum from near-plane extents, OpenGL clip conventions
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Matrix4<f32> {
    let r_width = 1.0 / (right - left);
    let r_height = 1.0 / (top - bottom);
    let r_depth = 1.0 / (near - far);

    let x = 2.0 * near * r_width;
    let y = 2.0 * near * r_height;
    let a = (right + left) * r_width;
    let b = (top + bottom) * r_height;
    let c = (far + near) * r_depth;
    let d = 2.0 * far * near * r_depth;

    #[rustfmt::skip]
    let m = Matrix4::new(
        x,   0.0, a,    0.0,
        0.0, y,   b,    0.0,
        0.0, 0.0, c,    d,
        0.0, 0.0, -1.0, 0.0,
    );
    m
}

/// Project a model-space point to screen space
///
/// Returns `(x, y, depth)` with `x` in `[0, width]`, `y` growing downward and
/// depth in NDC `[-1, 1]`, or `None` when the point is behind the eye or
/// outside the view volume.
pub fn project_to_screen(
    point: &Point3<f32>,
    mvp: &Matrix4<f32>,
    width: u32,
    height: u32,
) -> Option<(f32, f32, f32)> {
    let clip = mvp * point.to_homogeneous();

    // Prevent division by near-zero depth values
    if clip.w < 1e-6 {
        return None;
    }

    let ndc = clip.xyz() / clip.w;

    // Clip test
    if ndc.iter().any(|c| !(-1.0..=1.0).contains(c)) {
        return None;
    }

    // Convert to screen space
    let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
    let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

    Some((screen_x, screen_y, ndc.z))
}
