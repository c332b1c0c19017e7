/// Geometry primitives produced by the mesh parser
use nalgebra::{Point3, Vector2};

/// Opaque white, used when a format carries no per-vertex color
pub const DEFAULT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Which flavor of the OFF text format a mesh came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// `OFF`: positions only, lit with vertex normals
    Plain,
    /// `COFF`: positions plus RGBA per vertex, lit with vertex normals
    Colored,
    /// `STOFF`: positions plus texture coordinates, never lit
    Textured,
}

impl MeshFormat {
    pub fn magic(self) -> &'static str {
        match self {
            MeshFormat::Plain => "OFF",
            MeshFormat::Colored => "COFF",
            MeshFormat::Textured => "STOFF",
        }
    }

    pub fn from_magic(magic: &str) -> Option<Self> {
        match magic {
            "OFF" => Some(MeshFormat::Plain),
            "COFF" => Some(MeshFormat::Colored),
            "STOFF" => Some(MeshFormat::Textured),
            _ => None,
        }
    }

    /// Number of floats on a vertex line
    pub fn vertex_arity(self) -> usize {
        match self {
            MeshFormat::Plain => 3,
            MeshFormat::Colored => 7,
            MeshFormat::Textured => 5,
        }
    }

    /// Whether vertex normals are derived for this format
    pub fn is_lit(self) -> bool {
        !matches!(self, MeshFormat::Textured)
    }
}

/// A parsed vertex. Normals are derived later and live in the packed mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub color: Option<[f32; 4]>,
    pub tex_coord: Option<Vector2<f32>>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            color: None,
            tex_coord: None,
        }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_tex_coord(mut self, u: f32, v: f32) -> Self {
        self.tex_coord = Some(Vector2::new(u, v));
        self
    }
}

/// A polygon face as listed in the file. Vertex order is the winding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    pub indices: Vec<u32>,
}

impl Face {
    pub fn new(indices: Vec<u32>) -> Self {
        Self { indices }
    }

    /// Fan-split from the first vertex: `[a,b,c,d]` becomes `[a,b,c]`, `[a,c,d]`.
    ///
    /// The diagonal matters: splitting along `b-d` instead yields a different
    /// surface for non-planar quads.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        let first = self.indices.first().copied().unwrap_or(0);
        self.indices
            .windows(2)
            .skip(1)
            .map(move |pair| [first, pair[0], pair[1]])
    }
}

/// Raw output of the parser: vertices and faces, nothing derived yet
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub format: MeshFormat,
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

impl Geometry {
    pub fn new(format: MeshFormat) -> Self {
        Self {
            format,
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    pub fn with_capacity(format: MeshFormat, vertices: usize, faces: usize) -> Self {
        Self {
            format,
            vertices: Vec::with_capacity(vertices),
            faces: Vec::with_capacity(faces),
        }
    }

    pub fn positions(&self) -> Vec<Point3<f32>> {
        self.vertices.iter().map(|v| v.position).collect()
    }

    /// Flattened triangle list, every face fan-split
    pub fn triangle_indices(&self) -> Vec<u32> {
        self.faces
            .iter()
            .flat_map(|face| face.triangles())
            .flatten()
            .collect()
    }
}
