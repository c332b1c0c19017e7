/// Renderer-ready packed mesh
use std::path::Path;

use log::{debug, info};
use nalgebra::{Point3, Vector2, Vector3};

use crate::error::{MeshBuildError, Result};
use crate::geometry::{Geometry, DEFAULT_COLOR};
use crate::normals::{self, FaceNormalStrategy};
use crate::off::{self, ParseOptions};

const COORDS_PER_VERTEX: usize = 3;
const COLORS_PER_VERTEX: usize = 4;
const UVS_PER_VERTEX: usize = 2;

/// Everything that influences how a file becomes a [`Mesh`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshOptions {
    pub parse: ParseOptions,
    pub normal_strategy: FaceNormalStrategy,
}

/// Flat vertex attribute arrays plus a triangle list
///
/// Built once and never mutated; swap in a new `Mesh` if geometry changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    vertex_count: usize,
    positions: Vec<f32>,
    colors: Vec<f32>,
    normals: Option<Vec<f32>>,
    tex_coords: Option<Vec<f32>>,
    triangle_indices: Vec<u32>,
}

impl Mesh {
    /// Assemble a mesh from flat arrays, checking every invariant
    pub fn from_parts(
        positions: Vec<f32>,
        colors: Vec<f32>,
        normals: Option<Vec<f32>>,
        tex_coords: Option<Vec<f32>>,
        triangle_indices: Vec<u32>,
    ) -> std::result::Result<Self, MeshBuildError> {
        if positions.len() % COORDS_PER_VERTEX != 0 {
            return Err(MeshBuildError::LengthMismatch {
                array: "positions",
                expected: positions.len() / COORDS_PER_VERTEX * COORDS_PER_VERTEX,
                actual: positions.len(),
            });
        }
        let vertex_count = positions.len() / COORDS_PER_VERTEX;

        check_len("colors", &colors, vertex_count * COLORS_PER_VERTEX)?;
        if let Some(normals) = &normals {
            check_len("normals", normals, vertex_count * COORDS_PER_VERTEX)?;
        }
        if let Some(tex_coords) = &tex_coords {
            check_len("tex_coords", tex_coords, vertex_count * UVS_PER_VERTEX)?;
        }
        check_indices(&triangle_indices, vertex_count)?;

        Ok(Self {
            vertex_count,
            positions,
            colors,
            normals,
            tex_coords,
            triangle_indices,
        })
    }

    /// Pack parsed geometry, deriving vertex normals for lit formats
    pub fn from_geometry(geometry: &Geometry, strategy: FaceNormalStrategy) -> Result<Self> {
        let triangle_indices = geometry.triangle_indices();
        check_indices(&triangle_indices, geometry.vertices.len())?;

        let normals = if geometry.format.is_lit() {
            let normals =
                normals::vertex_normals(&geometry.positions(), &triangle_indices, strategy)?;
            Some(normals.iter().flat_map(|n| [n.x, n.y, n.z]).collect())
        } else {
            None
        };

        let tex_coords = geometry
            .vertices
            .iter()
            .map(|v| v.tex_coord.map(|uv| [uv.x, uv.y]))
            .collect::<Option<Vec<_>>>()
            .map(|uvs| uvs.into_iter().flatten().collect());

        let positions = geometry
            .vertices
            .iter()
            .flat_map(|v| [v.position.x, v.position.y, v.position.z])
            .collect();
        let colors = geometry
            .vertices
            .iter()
            .flat_map(|v| v.color.unwrap_or(DEFAULT_COLOR))
            .collect();

        let mesh = Self::from_parts(positions, colors, normals, tex_coords, triangle_indices)?;
        debug!(
            "packed mesh: {} vertices, {} triangles, normals: {}, uvs: {}",
            mesh.vertex_count,
            mesh.triangle_count(),
            mesh.normals.is_some(),
            mesh.tex_coords.is_some()
        );
        Ok(mesh)
    }

    /// The eight-vertex colored cube used when no mesh can be loaded
    ///
    /// Each vertex differs from its neighbors in one color channel. Unlit, so
    /// no normals are stored.
    pub fn unit_cube() -> Self {
        #[rustfmt::skip]
        let positions = vec![
            -0.5,  0.5,  0.5, // top left
            -0.5, -0.5,  0.5, // bottom left
             0.5, -0.5,  0.5, // bottom right
             0.5,  0.5,  0.5, // top right
            -0.5,  0.5, -0.5, // top left back
            -0.5, -0.5, -0.5, // bottom left back
             0.5, -0.5, -0.5, // bottom right back
             0.5,  0.5, -0.5, // top right back
        ];
        #[rustfmt::skip]
        let colors = vec![
            1.0, 1.0, 1.0, 1.0,
            1.0, 0.0, 1.0, 1.0,
            1.0, 0.0, 0.0, 1.0,
            1.0, 1.0, 0.0, 1.0,
            0.0, 1.0, 1.0, 1.0,
            0.0, 1.0, 0.0, 1.0,
            0.0, 0.0, 0.0, 1.0,
            0.0, 0.0, 1.0, 1.0,
        ];
        #[rustfmt::skip]
        let triangle_indices = vec![
            0, 1, 2, 0, 2, 3,
            3, 2, 6, 3, 6, 7,
            0, 3, 7, 0, 7, 4,
            1, 5, 6, 1, 6, 2,
            4, 5, 1, 4, 1, 0,
            7, 6, 5, 7, 5, 4,
        ];

        Self {
            vertex_count: 8,
            positions,
            colors,
            normals: None,
            tex_coords: None,
            triangle_indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_indices.len() / 3
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn normals(&self) -> Option<&[f32]> {
        self.normals.as_deref()
    }

    pub fn tex_coords(&self) -> Option<&[f32]> {
        self.tex_coords.as_deref()
    }

    pub fn triangle_indices(&self) -> &[u32] {
        &self.triangle_indices
    }

    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.triangle_indices
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }

    /// Position of vertex `i`. Panics if `i >= vertex_count()`.
    pub fn position(&self, i: usize) -> Point3<f32> {
        let p = &self.positions[i * COORDS_PER_VERTEX..][..COORDS_PER_VERTEX];
        Point3::new(p[0], p[1], p[2])
    }

    pub fn normal(&self, i: usize) -> Option<Vector3<f32>> {
        self.normals.as_ref().map(|normals| {
            let n = &normals[i * COORDS_PER_VERTEX..][..COORDS_PER_VERTEX];
            Vector3::new(n[0], n[1], n[2])
        })
    }

    pub fn color(&self, i: usize) -> [f32; 4] {
        let c = &self.colors[i * COLORS_PER_VERTEX..][..COLORS_PER_VERTEX];
        [c[0], c[1], c[2], c[3]]
    }

    pub fn tex_coord(&self, i: usize) -> Option<Vector2<f32>> {
        self.tex_coords.as_ref().map(|uvs| {
            let uv = &uvs[i * UVS_PER_VERTEX..][..UVS_PER_VERTEX];
            Vector2::new(uv[0], uv[1])
        })
    }

    /// Axis-aligned bounding box, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        (0..self.vertex_count).map(|i| self.position(i)).fold(None, |acc, p| match acc {
            None => Some((p, p)),
            Some((min, max)) => Some((min.inf(&p), max.sup(&p))),
        })
    }
}

/// Read, parse and pack a mesh file
pub fn load_mesh<P: AsRef<Path>>(path: P, options: &MeshOptions) -> Result<Mesh> {
    let geometry = off::load_geometry(&path, &options.parse)?;
    let mesh = Mesh::from_geometry(&geometry, options.normal_strategy)?;
    info!(
        "mesh ready: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

fn check_len(
    array: &'static str,
    values: &[f32],
    expected: usize,
) -> std::result::Result<(), MeshBuildError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(MeshBuildError::LengthMismatch {
            array,
            expected,
            actual: values.len(),
        })
    }
}

fn check_indices(indices: &[u32], vertex_count: usize) -> std::result::Result<(), MeshBuildError> {
    if indices.len() % 3 != 0 {
        return Err(MeshBuildError::PartialTriangle { len: indices.len() });
    }
    match indices.iter().find(|&&index| index as usize >= vertex_count) {
        Some(&index) => Err(MeshBuildError::IndexOutOfRange {
            index,
            vertex_count,
        }),
        None => Ok(()),
    }
}
