/// Face and vertex normal derivation
///
/// Vertex normals are the plain mean of the face normals of every triangle
/// that references the vertex. Accumulation is a single pass over the
/// triangles followed by one division per vertex, O(V + F).
use log::debug;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{NormalError, NormalReason};

/// How a triangle's face normal is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceNormalStrategy {
    /// Cross product of the first two vertex *positions*, not of edges, with
    /// the z component negated. Geometrically wrong: the result depends on
    /// where the triangle sits relative to the origin. Reproduces the old lit
    /// shader's output exactly.
    RawVertex,
    /// `normalize((c - a) x (b - a))`. Points outward for triangles wound
    /// clockwise as seen from outside.
    #[default]
    EdgeCross,
}

impl FaceNormalStrategy {
    /// Face normal of triangle `(a, b, c)`, `None` when it has no direction
    pub fn face_normal(
        self,
        a: &Point3<f32>,
        b: &Point3<f32>,
        c: &Point3<f32>,
    ) -> Option<Vector3<f32>> {
        match self {
            FaceNormalStrategy::RawVertex => Some(Vector3::new(
                a.y * b.z - a.z * b.y,
                a.z * b.x - a.x * b.z,
                a.y * b.x - a.x * b.y,
            )),
            FaceNormalStrategy::EdgeCross => {
                let edge1 = c - a;
                let edge2 = b - a;
                edge1.cross(&edge2).try_normalize(f32::EPSILON)
            }
        }
    }
}

/// Per-triangle face normals, in triangle order
pub fn face_normals(
    positions: &[Point3<f32>],
    triangle_indices: &[u32],
    strategy: FaceNormalStrategy,
) -> Result<Vec<Vector3<f32>>, NormalError> {
    triangle_indices
        .chunks_exact(3)
        .enumerate()
        .map(|(triangle, tri)| {
            let a = vertex(positions, tri[0])?;
            let b = vertex(positions, tri[1])?;
            let c = vertex(positions, tri[2])?;
            strategy
                .face_normal(a, b, c)
                .ok_or(NormalError::from(NormalReason::DegenerateFace { triangle }))
        })
        .collect()
}

/// One averaged normal per vertex
///
/// Fails instead of emitting NaN: a vertex no triangle references has no
/// normal to average.
pub fn vertex_normals(
    positions: &[Point3<f32>],
    triangle_indices: &[u32],
    strategy: FaceNormalStrategy,
) -> Result<Vec<Vector3<f32>>, NormalError> {
    let faces = face_normals(positions, triangle_indices, strategy)?;

    let mut sums = vec![Vector3::zeros(); positions.len()];
    let mut counts = vec![0u32; positions.len()];

    for (tri, normal) in triangle_indices.chunks_exact(3).zip(&faces) {
        for &index in tri {
            sums[index as usize] += normal;
            counts[index as usize] += 1;
        }
    }

    let normals = sums
        .into_iter()
        .zip(counts)
        .enumerate()
        .map(|(vertex, (sum, count))| {
            if count == 0 {
                return Err(NormalError::from(NormalReason::OrphanVertex { vertex }));
            }
            let normal = sum / count as f32;
            if normal.iter().all(|c| c.is_finite()) {
                Ok(normal)
            } else {
                Err(NormalError::from(NormalReason::NonFinite { vertex }))
            }
        })
        .collect::<Result<Vec<_>, NormalError>>()?;

    debug!(
        "derived {} vertex normals from {} faces ({:?})",
        normals.len(),
        faces.len(),
        strategy
    );

    Ok(normals)
}

fn vertex(positions: &[Point3<f32>], index: u32) -> Result<&Point3<f32>, NormalError> {
    positions.get(index as usize).ok_or_else(|| {
        NormalReason::IndexOutOfRange {
            index,
            vertex_count: positions.len(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::off::parse_off;

    const TETRAHEDRON: &str = include_str!("../fixtures/tetrahedron.off");
    const ORPHAN: &str = include_str!("../fixtures/orphan.off");

    #[test]
    fn test_tetrahedron_normals_point_away_from_centroid() {
        let geometry = parse_off(TETRAHEDRON).unwrap();
        let positions = geometry.positions();
        let normals = vertex_normals(
            &positions,
            &geometry.triangle_indices(),
            FaceNormalStrategy::EdgeCross,
        )
        .unwrap();

        let centroid = positions.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / positions.len() as f32;
        for (position, normal) in positions.iter().zip(&normals) {
            let outward = position.coords - centroid;
            assert!(normal.dot(&outward) > 0.0, "normal {normal:?} at {position:?}");
        }
    }

    #[test]
    fn test_edge_cross_faces_are_unit_length() {
        let geometry = parse_off(TETRAHEDRON).unwrap();
        let faces = face_normals(
            &geometry.positions(),
            &geometry.triangle_indices(),
            FaceNormalStrategy::EdgeCross,
        )
        .unwrap();
        assert_eq!(faces.len(), 4);
        for normal in faces {
            assert!((normal.norm() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_vertex_normal_is_unrenormalized_mean() {
        // Two perpendicular triangles sharing the edge 0-1
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let indices = [0, 2, 1, 0, 1, 3];
        let normals =
            vertex_normals(&positions, &indices, FaceNormalStrategy::EdgeCross).unwrap();

        let shared = normals[0];
        assert!((shared - Vector3::new(0.0, 0.5, 0.5)).norm() < 1e-6);
        assert!((normals[2] - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
        assert!((normals[3] - Vector3::new(0.0, 1.0, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn test_raw_vertex_formula() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(4.0, 5.0, 6.0);
        let c = Point3::new(-7.0, 0.5, 2.0);
        let normal = FaceNormalStrategy::RawVertex.face_normal(&a, &b, &c).unwrap();
        // x and y match a x b, z is negated; c plays no part
        assert_eq!(normal, Vector3::new(-3.0, 6.0, 3.0));
    }

    #[test]
    fn test_orphan_vertex_is_an_error() {
        let geometry = parse_off(ORPHAN).unwrap();
        for strategy in [FaceNormalStrategy::EdgeCross, FaceNormalStrategy::RawVertex] {
            let err = vertex_normals(&geometry.positions(), &geometry.triangle_indices(), strategy)
                .unwrap_err();
            assert_eq!(err.reason, NormalReason::OrphanVertex { vertex: 3 });
        }
    }

    #[test]
    fn test_overflowing_normal_is_an_error() {
        let positions = vec![
            Point3::new(1e30, 1e30, 0.0),
            Point3::new(0.0, 1e30, 1e30),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let err = vertex_normals(&positions, &[0, 1, 2], FaceNormalStrategy::RawVertex)
            .unwrap_err();
        assert_eq!(err.reason, NormalReason::NonFinite { vertex: 0 });
    }

    #[test]
    fn test_degenerate_face_is_an_error() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
        ];
        let err = vertex_normals(&positions, &[0, 1, 2], FaceNormalStrategy::EdgeCross)
            .unwrap_err();
        assert_eq!(err.reason, NormalReason::DegenerateFace { triangle: 0 });
    }

    #[test]
    fn test_out_of_range_index() {
        let positions = vec![Point3::origin(); 3];
        let err = face_normals(&positions, &[0, 1, 7], FaceNormalStrategy::RawVertex)
            .unwrap_err();
        assert_eq!(
            err.reason,
            NormalReason::IndexOutOfRange {
                index: 7,
                vertex_count: 3
            }
        );
    }
}
