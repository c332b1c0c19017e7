/// offview core library - OFF mesh ingestion and gesture-driven orientation
///
/// This library provides everything a renderer needs short of drawing:
/// parsing OFF/COFF/STOFF text, deriving vertex normals, packing the mesh into
/// flat arrays, and turning drag/pinch gestures into per-frame matrices.

pub mod config;
pub mod context;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod normals;
pub mod off;
pub mod orientation;
pub mod projection;
pub mod transform;

// Re-export commonly used types
pub use config::Config;
pub use context::{RenderContext, SharedOrientation};
pub use error::{Error, FormatError, MeshBuildError, NormalError, Result};
pub use geometry::{Face, Geometry, MeshFormat, Vertex};
pub use mesh::{load_mesh, Mesh, MeshOptions};
pub use normals::FaceNormalStrategy;
pub use orientation::{
    DragBand, DragTracker, GestureDelta, InteractionConfig, OrientationController,
    OrientationState,
};
pub use projection::{Camera, CameraConfig, SpinAxis, Viewport};
pub use transform::{Matrices, Transform, TransformPipeline};
