/// Example: Load an OFF file and print what the renderer would receive
///
/// Usage: cargo run --example load_off -- path/to/file.off [raw_vertex]

use std::env;
use std::io;

use offview_core::{
    load_mesh, CameraConfig, FaceNormalStrategy, MeshOptions, OrientationState,
    TransformPipeline, Viewport,
};

fn main() -> io::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <off-file> [edge_cross|raw_vertex]", args[0]);
        std::process::exit(2);
    }

    let normal_strategy = match args.get(2).map(String::as_str) {
        Some("raw_vertex") => FaceNormalStrategy::RawVertex,
        _ => FaceNormalStrategy::EdgeCross,
    };
    let options = MeshOptions {
        normal_strategy,
        ..Default::default()
    };

    let off_path = &args[1];
    println!("Loading OFF file: {}", off_path);

    let mesh = load_mesh(off_path, &options)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("Failed to load mesh: {}", e)))?;

    println!("Vertices:  {}", mesh.vertex_count());
    println!("Triangles: {}", mesh.triangle_count());
    if let Some((min, max)) = mesh.bounds() {
        println!("Bounds:    {:?} .. {:?}", min.coords.as_slice(), max.coords.as_slice());
    }
    match mesh.normals() {
        Some(_) => {
            for i in 0..mesh.vertex_count().min(4) {
                if let Some(n) = mesh.normal(i) {
                    println!("normal[{}] = ({:.4}, {:.4}, {:.4})", i, n.x, n.y, n.z);
                }
            }
        }
        None => println!("Textured mesh: {} uv pairs", mesh.tex_coords().map_or(0, |uv| uv.len() / 2)),
    }

    let pipeline = TransformPipeline::new(&CameraConfig::default(), Viewport::new(640, 480));
    let matrices = pipeline.compute(&OrientationState::default());
    println!("MVP at rest:{}", matrices.mvp());

    Ok(())
}
