/// Model/view/projection composition
use nalgebra::{Matrix4, Vector3};

use crate::orientation::OrientationState;
use crate::projection::{Camera, CameraConfig, SpinAxis, Viewport};

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Rotation of `degrees` around a unit `axis`
    pub fn rotation_matrix(axis: Vector3<f32>, degrees: f32) -> Matrix4<f32> {
        Matrix4::new_rotation(axis * degrees.to_radians())
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Create a uniform scale matrix
    pub fn scale_matrix(s: f32) -> Matrix4<f32> {
        Matrix4::new_scaling(s)
    }

    /// `translate · rotateX(tilt) · rotate<spin_axis>(spin) · scale`
    ///
    /// The order is fixed; swapping the rotations changes what a drag does.
    pub fn model_matrix(
        state: &OrientationState,
        translation: Vector3<f32>,
        spin_axis: SpinAxis,
    ) -> Matrix4<f32> {
        Self::translation_matrix(translation.x, translation.y, translation.z)
            * Self::rotation_matrix(Vector3::x(), state.y_angle_deg)
            * Self::rotation_matrix(spin_axis.unit(), state.x_angle_deg)
            * Self::scale_matrix(state.scale)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}

/// The three matrices a renderer binds for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrices {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl Matrices {
    pub fn model_view(&self) -> Matrix4<f32> {
        self.view * self.model
    }

    pub fn mvp(&self) -> Matrix4<f32> {
        Transform::mvp_matrix(&self.model, &self.view, &self.projection)
    }
}

/// Turns an [`OrientationState`] into per-frame matrices
///
/// The view is fixed at construction; the projection is rebuilt only when
/// the viewport changes.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    camera: Camera,
    model_translation: Vector3<f32>,
    spin_axis: SpinAxis,
    viewport: Viewport,
    projection: Matrix4<f32>,
}

impl TransformPipeline {
    pub fn new(config: &CameraConfig, viewport: Viewport) -> Self {
        let camera = Camera::new(config);
        let projection = camera.projection_matrix(viewport);
        Self {
            camera,
            model_translation: Vector3::from(config.model_translation),
            spin_axis: config.spin_axis,
            viewport,
            projection,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let viewport = Viewport::new(width, height);
        if viewport != self.viewport {
            self.viewport = viewport;
            self.projection = self.camera.projection_matrix(viewport);
        }
    }

    pub fn compute(&self, state: &OrientationState) -> Matrices {
        Matrices {
            model: Transform::model_matrix(state, self.model_translation, self.spin_axis),
            view: self.camera.view_matrix(),
            projection: self.projection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_identity_rotation() {
        let matrix = Transform::rotation_matrix(Vector3::z(), 0.0);
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_model_at_rest_is_translate_then_scale() {
        let state = OrientationState::new(0.0, 0.0, 2.0);
        let model = Transform::model_matrix(&state, Vector3::new(0.0, 0.0, -5.0), SpinAxis::Z);
        let p = model.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(2.0, 0.0, -5.0)).norm() < 1e-6);
    }

    #[test]
    fn test_model_composition_order() {
        // Spin 90 about Z sends +X to +Y, then tilt 90 about X sends +Y to +Z
        let state = OrientationState::new(90.0, 90.0, 1.0);
        let model = Transform::model_matrix(&state, Vector3::zeros(), SpinAxis::Z);
        let p = model.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(0.0, 0.0, 1.0)).norm() < 1e-5, "{p:?}");

        // With a Y spin axis, +X goes to -Z first and tilting leaves it at +Y
        let model = Transform::model_matrix(&state, Vector3::zeros(), SpinAxis::Y);
        let p = model.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-5, "{p:?}");
    }

    #[test]
    fn test_compute_is_idempotent() {
        let pipeline = TransformPipeline::new(&CameraConfig::default(), Viewport::new(640, 480));
        let state = OrientationState::new(37.5, -60.0, 12.0);
        let first = pipeline.compute(&state);
        let second = pipeline.compute(&state);
        assert_eq!(first, second);
    }

    #[test]
    fn test_set_viewport_rebuilds_projection() {
        let mut pipeline =
            TransformPipeline::new(&CameraConfig::default(), Viewport::new(100, 100));
        let state = OrientationState::default();
        let square = pipeline.compute(&state).projection;

        pipeline.set_viewport(200, 100);
        let wide = pipeline.compute(&state).projection;
        assert!((square[(0, 0)] - 1.0).abs() < 1e-6);
        assert!((wide[(0, 0)] - 0.5).abs() < 1e-6);
        assert_eq!(pipeline.viewport(), Viewport::new(200, 100));
    }

    #[test]
    fn test_mvp_order() {
        let pipeline = TransformPipeline::new(&CameraConfig::default(), Viewport::new(100, 100));
        let matrices = pipeline.compute(&OrientationState::default());
        let expected = matrices.projection * matrices.view * matrices.model;
        assert_eq!(matrices.mvp(), expected);
        assert_eq!(matrices.model_view(), matrices.view * matrices.model);
    }
}
