/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Point3, Vector2, Vector3};
use offview_core::{projection::project_to_screen, Matrices, Mesh};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Floor on diffuse light so faces turned away stay visible
const AMBIENT: f32 = 0.1;

/// Checker squares per unit of texture coordinate
const CHECKER_TILES: f32 = 8.0;

/// A vertex after projection and lighting
#[derive(Debug, Clone, Copy)]
struct ShadedVertex {
    x: f32,
    y: f32,
    depth: f32,
    intensity: f32,
    color: [f32; 3],
    uv: Option<Vector2<f32>>,
}

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<[f32; 3]>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![[1.0; 3]; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill([1.0; 3]);
    }

    pub fn char_at(&self, x: usize, y: usize) -> char {
        self.char_buffer[y * self.width + x]
    }

    pub fn render_mesh(&mut self, mesh: &Mesh, matrices: &Matrices) {
        let mvp = matrices.mvp();
        let model_view = matrices.model_view();
        let light_dir = Vector3::new(0.0, 0.0, 1.0);

        // Project every vertex once; triangles share them
        let projected: Vec<Option<ShadedVertex>> = (0..mesh.vertex_count())
            .map(|i| {
                let (x, y, depth) = project_to_screen(
                    &mesh.position(i),
                    &mvp,
                    self.width as u32,
                    self.height as u32,
                )?;
                // Two-sided: winding conventions differ between meshes
                let intensity = mesh
                    .normal(i)
                    .and_then(|n| model_view.transform_vector(&n).try_normalize(1e-12))
                    .map(|n| n.dot(&light_dir).abs().max(AMBIENT))
                    .unwrap_or(1.0);
                let [r, g, b, _] = mesh.color(i);
                Some(ShadedVertex {
                    x,
                    y,
                    depth,
                    intensity,
                    color: [r, g, b],
                    uv: mesh.tex_coord(i),
                })
            })
            .collect();

        let unlit = mesh.normals().is_none();

        for [a, b, c] in mesh.triangles() {
            // A vertex outside the view volume clips the whole triangle
            let (Some(mut v0), Some(mut v1), Some(mut v2)) = (
                projected[a as usize],
                projected[b as usize],
                projected[c as usize],
            ) else {
                continue;
            };

            if unlit {
                let face = face_intensity(
                    &model_view.transform_point(&mesh.position(a as usize)),
                    &model_view.transform_point(&mesh.position(b as usize)),
                    &model_view.transform_point(&mesh.position(c as usize)),
                    &light_dir,
                );
                v0.intensity = face;
                v1.intensity = face;
                v2.intensity = face;
            }

            self.rasterize_triangle(&[v0, v1, v2]);
        }
    }

    fn rasterize_triangle(&mut self, v: &[ShadedVertex; 3]) {
        // Bounding box
        let min_x = v[0].x.min(v[1].x).min(v[2].x).floor() as i32;
        let max_x = v[0].x.max(v[1].x).max(v[2].x).ceil() as i32;
        let min_y = v[0].y.min(v[1].y).min(v[2].y).floor() as i32;
        let max_y = v[0].y.max(v[1].y).max(v[2].y).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                let Some((w0, w1, w2)) =
                    barycentric((v[0].x, v[0].y), (v[1].x, v[1].y), (v[2].x, v[2].y), (px, py))
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v[0].depth + w1 * v[1].depth + w2 * v[2].depth;
                let idx = y as usize * self.width + x as usize;
                if depth >= self.depth_buffer[idx] {
                    continue;
                }

                let mut intensity =
                    w0 * v[0].intensity + w1 * v[1].intensity + w2 * v[2].intensity;
                if let (Some(uv0), Some(uv1), Some(uv2)) = (v[0].uv, v[1].uv, v[2].uv) {
                    intensity *= checker(uv0 * w0 + uv1 * w1 + uv2 * w2);
                }
                let color: [f32; 3] = std::array::from_fn(|ch| {
                    w0 * v[0].color[ch] + w1 * v[1].color[ch] + w2 * v[2].color[ch]
                });

                self.depth_buffer[idx] = depth;
                self.char_buffer[idx] = ramp(intensity);
                self.color_buffer[idx] = color;
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let [r, g, b] = self.color_buffer[idx].map(|c| (c.clamp(0.0, 1.0) * 255.0) as u8);
                writer.queue(SetForegroundColor(Color::Rgb { r, g, b }))?;
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Map a light intensity in `[0, 1]` to a ramp character. Covered pixels
/// never map to the blank at the bottom of the ramp.
fn ramp(intensity: f32) -> char {
    let char_index =
        1 + (intensity.clamp(0.0, 1.0) * (LUMINOSITY_RAMP.len() - 2) as f32) as usize;
    LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)]
}

/// Alternating full and dimmed squares in texture space
fn checker(uv: Vector2<f32>) -> f32 {
    let tile = (uv.x * CHECKER_TILES).floor() as i64 + (uv.y * CHECKER_TILES).floor() as i64;
    if tile.rem_euclid(2) == 0 {
        1.0
    } else {
        0.4
    }
}

/// Flat, two-sided Lambert term of an eye-space triangle
fn face_intensity(
    a: &Point3<f32>,
    b: &Point3<f32>,
    c: &Point3<f32>,
    light_dir: &Vector3<f32>,
) -> f32 {
    (b - a)
        .cross(&(c - a))
        .try_normalize(1e-12)
        .map(|n| n.dot(light_dir).abs().max(AMBIENT))
        .unwrap_or(AMBIENT)
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use offview_core::{
        CameraConfig, FaceNormalStrategy, OrientationState, TransformPipeline, Viewport,
    };

    fn frame(width: usize, height: usize, scale: f32) -> Matrices {
        let pipeline = TransformPipeline::new(
            &CameraConfig::default(),
            Viewport::new(width as u32, height as u32),
        );
        pipeline.compute(&OrientationState::new(0.0, 0.0, scale))
    }

    #[test]
    fn test_barycentric_center() {
        let (w0, w1, w2) =
            barycentric((0.0, 0.0), (3.0, 0.0), (0.0, 3.0), (1.0, 1.0)).unwrap();
        assert!((w0 - 1.0 / 3.0).abs() < 1e-6);
        assert!((w1 - 1.0 / 3.0).abs() < 1e-6);
        assert!((w2 - 1.0 / 3.0).abs() < 1e-6);
        assert!(barycentric((0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (1.0, 1.0)).is_none());
    }

    #[test]
    fn test_ramp_ends() {
        assert_eq!(ramp(0.0), '.');
        assert_eq!(ramp(1.0), '@');
        assert_eq!(ramp(7.0), '@');
    }

    #[test]
    fn test_cube_front_face_covers_center() {
        let mut renderer = AsciiRenderer::new(40, 40);
        renderer.render_mesh(&Mesh::unit_cube(), &frame(40, 40, 2.0));

        // The front face looks straight at the camera
        assert_eq!(renderer.char_at(20, 20), '@');
        assert_eq!(renderer.char_at(0, 0), ' ');

        renderer.clear();
        assert_eq!(renderer.char_at(20, 20), ' ');
    }

    #[test]
    fn test_lit_mesh_renders() {
        let geometry = offview_core::off::parse_off(
            "OFF\n8 6\n-0.5 0.5 0.5\n-0.5 -0.5 0.5\n0.5 -0.5 0.5\n0.5 0.5 0.5\n\
             -0.5 0.5 -0.5\n-0.5 -0.5 -0.5\n0.5 -0.5 -0.5\n0.5 0.5 -0.5\n\
             4 0 3 2 1\n4 3 7 6 2\n4 0 4 7 3\n4 1 2 6 5\n4 4 0 1 5\n4 7 4 5 6\n",
        )
        .unwrap();
        let mesh = Mesh::from_geometry(&geometry, FaceNormalStrategy::EdgeCross).unwrap();

        let mut renderer = AsciiRenderer::new(40, 40);
        renderer.render_mesh(&mesh, &frame(40, 40, 2.0));
        assert_ne!(renderer.char_at(20, 20), ' ');
    }

    #[test]
    fn test_draw_emits_every_cell() {
        let renderer = AsciiRenderer::new(3, 2);
        let mut out = Vec::new();
        renderer.draw(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("\r\n").count(), 1);
    }
}
