/// Ownership of the mesh and orientation for one rendering surface
use std::sync::{Arc, Mutex, MutexGuard};

use log::info;

use crate::config::Config;
use crate::mesh::Mesh;
use crate::orientation::{GestureDelta, OrientationController, OrientationState};
use crate::projection::Viewport;
use crate::transform::{Matrices, TransformPipeline};

/// One mesh, one orientation, one pipeline
///
/// Gestures, resizes and frame requests all go through `&mut self`, so a
/// single-threaded host needs no locking.
#[derive(Debug, Clone)]
pub struct RenderContext {
    mesh: Arc<Mesh>,
    controller: OrientationController,
    pipeline: TransformPipeline,
}

impl RenderContext {
    pub fn new(mesh: Mesh, config: &Config, viewport: Viewport) -> Self {
        Self {
            mesh: Arc::new(mesh),
            controller: OrientationController::new(config.interaction.clone()),
            pipeline: TransformPipeline::new(&config.camera, viewport),
        }
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Swap in new geometry; the orientation is kept
    pub fn replace_mesh(&mut self, mesh: Mesh) {
        info!(
            "replacing mesh ({} -> {} triangles)",
            self.mesh.triangle_count(),
            mesh.triangle_count()
        );
        self.mesh = Arc::new(mesh);
    }

    pub fn state(&self) -> &OrientationState {
        self.controller.state()
    }

    pub fn controller_mut(&mut self) -> &mut OrientationController {
        &mut self.controller
    }

    pub fn pipeline(&self) -> &TransformPipeline {
        &self.pipeline
    }

    pub fn on_drag(&mut self, delta: GestureDelta) {
        self.controller.on_drag(delta);
    }

    pub fn on_scale(&mut self, factor: f32) {
        self.controller.on_scale(factor);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.pipeline.set_viewport(width, height);
    }

    /// Matrices for the current orientation
    pub fn frame(&self) -> Matrices {
        self.pipeline.compute(self.controller.state())
    }
}

/// Controller behind a mutex, for hosts that deliver gestures and frames on
/// different threads
///
/// The input thread is the only writer; the render thread takes a copy of
/// the state once per frame.
#[derive(Debug, Clone, Default)]
pub struct SharedOrientation {
    inner: Arc<Mutex<OrientationController>>,
}

impl SharedOrientation {
    pub fn new(controller: OrientationController) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    // A panic mid-update cannot leave the state half-written: every field is
    // a plain float assignment.
    fn lock(&self) -> MutexGuard<'_, OrientationController> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn on_drag(&self, delta: GestureDelta) {
        self.lock().on_drag(delta);
    }

    pub fn on_scale(&self, factor: f32) {
        self.lock().on_scale(factor);
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn snapshot(&self) -> OrientationState {
        *self.lock().state()
    }
}
