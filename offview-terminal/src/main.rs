/// offview terminal viewer
///
/// Usage: offview-terminal [MESH] [--config PATH]
///
/// Controls:
///   - Mouse drag / Arrow Keys: Rotate the mesh
///   - Scroll / +/-: Zoom
///   - R: Reset orientation
///   - Q/ESC: Quit
///
/// Without a config file, logs go to stderr; redirect it (`2>offview.log`)
/// or set `[logging] file` to keep them off the screen.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use offview_core::{load_mesh, Config, Mesh};
use offview_terminal::{init_logging, TerminalApp};

/// Picked up from the working directory when `--config` is not given
const DEFAULT_CONFIG: &str = "offview.toml";

struct Args {
    mesh: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = env::args().skip(1);
    let mut parsed = Args {
        mesh: None,
        config: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().ok_or("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
            path if parsed.mesh.is_none() => parsed.mesh = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument {extra}")),
        }
    }

    Ok(parsed)
}

fn load_config(path: Option<&Path>) -> io::Result<Config> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
        None => return Ok(Config::default()),
    };
    Config::from_file(path).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to load config {}: {}", path.display(), e),
        )
    })
}

fn main() -> io::Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            eprintln!("Usage: offview-terminal [MESH] [--config PATH]");
            std::process::exit(2);
        }
    };

    let config = load_config(args.config.as_deref())?;
    init_logging(&config.logging)?;

    // A broken mesh is not fatal: fall back to the built-in cube
    let mesh = match args.mesh.as_ref().or(config.mesh.path.as_ref()) {
        Some(path) => match load_mesh(path, &config.mesh.options()) {
            Ok(mesh) => mesh,
            Err(e) => {
                error!("failed to load {}: {}", path.display(), e);
                eprintln!("Failed to load {}: {}; showing the default cube", path.display(), e);
                Mesh::unit_cube()
            }
        },
        None => {
            warn!("no mesh given, using the default cube");
            Mesh::unit_cube()
        }
    };

    info!(
        "starting viewer: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    let mut app = TerminalApp::new(mesh, &config)?;
    app.run()?;

    Ok(())
}
