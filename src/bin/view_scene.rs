//! Walk through a portal scene, or render one frame of it to a PPM file.
//!
//! ```bash
//! cargo run --release -- scenes/two_rooms.scene
//! cargo run --release -- scenes/two_rooms.scene --snapshot out.ppm
//! ```

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use glam::{Vec2, Vec3};
use minifb::{Key, Window, WindowOptions};
use rayon::ThreadPool;

use portal_sw::{
    Camera, PixelFormat, PortalRenderer, Scene, SectorId, Surface, build_pool, load_scene,
};

const MOVE_SPEED: f32 = 0.25;
const TURN_SPEED: f32 = 0.04;

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scene file to load.
    #[arg(value_name = "SCENE")]
    scene: PathBuf,

    #[arg(long, default_value_t = 960)]
    width: usize,

    #[arg(long, default_value_t = 600)]
    height: usize,

    /// Horizontal field of view, degrees.
    #[arg(long, default_value_t = 90.0)]
    fov: f32,

    /// Column workers; 0 or less picks one per core.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    threads: i32,

    /// Sector the camera starts in.
    #[arg(long, default_value_t = 0)]
    sector: SectorId,

    /// Start position `x,y,z`; y is the eye height above the sector floor.
    /// Defaults to the middle of the start sector.
    #[arg(long, value_name = "X,Y,Z", value_parser = parse_vec3)]
    pos: Option<Vec3>,

    /// Render a single frame into this PPM file and exit.
    #[arg(long, value_name = "OUT.ppm")]
    snapshot: Option<PathBuf>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("`{p}`: {e}")))
        .collect::<Result<_, _>>()?;
    match parts[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(format!("expected X,Y,Z, got `{s}`")),
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::new();
    match (verbose, std::env::var("RUST_LOG")) {
        (0, Ok(filter)) => {
            builder.parse_filters(&filter);
        }
        (0, Err(_)) => {
            builder.filter_level(log::LevelFilter::Info);
        }
        (1, _) => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.init();
}

/// Middle of the sector's vertices, eye half way up.
fn start_position(scene: &Scene, sector: SectorId) -> Vec3 {
    let s = &scene.sectors[sector as usize];
    let points: Vec<Vec2> = s
        .walls
        .iter()
        .flat_map(|&w| scene.wall_points(w))
        .collect();
    let centre = points.iter().copied().sum::<Vec2>() / points.len().max(1) as f32;
    Vec3::new(centre.x, (s.ceil_height - s.floor_height) * 0.5, centre.y)
}

fn load(path: &Path) -> anyhow::Result<Scene> {
    load_scene(path).with_context(|| format!("cannot load {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // ─────────── load scene ───────────
    let scene = load(&args.scene)?;
    if scene.sectors.get(args.sector as usize).is_none() {
        bail!(
            "sector {} does not exist ({} sectors in scene)",
            args.sector,
            scene.sectors.len()
        );
    }
    if args.width == 0 || args.height == 0 {
        bail!("surface must be at least 1×1");
    }

    let position = args.pos.unwrap_or_else(|| start_position(&scene, args.sector));
    let camera = Camera::new(
        position,
        Vec3::Z,
        args.fov.to_radians(),
        args.width as f32 / args.height as f32,
    );
    let pool = build_pool(args.threads)?;
    log::info!("{} column worker(s)", pool.current_num_threads());

    match &args.snapshot {
        Some(out) => snapshot(&args, &scene, &camera, &pool, out),
        None => run_window(&args, &scene, camera, &pool),
    }
}

/// One frame, written as binary PPM.
fn snapshot(args: &Args, scene: &Scene, camera: &Camera, pool: &ThreadPool, out: &Path) -> anyhow::Result<()> {
    let format = PixelFormat::xrgb8888();
    let mut fb = vec![0u32; args.width * args.height];
    let mut surface = Surface::from_u32(args.width, args.height, format, &mut fb)?;
    let report = PortalRenderer::new().render_parallel(&mut surface, scene, camera, args.sector, pool);
    log::info!(
        "{} sector visit(s), {} wall(s) drawn",
        report.visits.len(),
        report.walls_drawn
    );

    let file = File::create(out).with_context(|| format!("creating {}", out.display()))?;
    let mut w = BufWriter::new(file);
    write!(w, "P6\n{} {}\n255\n", args.width, args.height)?;
    for &px in &fb {
        let [r, g, b, _] = format.unpack(px);
        w.write_all(&[r, g, b])?;
    }
    w.flush()?;
    log::info!("wrote {}", out.display());
    Ok(())
}

fn run_window(args: &Args, scene: &Scene, mut camera: Camera, pool: &ThreadPool) -> anyhow::Result<()> {
    let (w, h) = (args.width, args.height);
    let format = PixelFormat::xrgb8888();
    let mut fb = vec![0u32; w * h];
    let mut renderer = PortalRenderer::new();
    let mut sector = args.sector;

    let mut win = Window::new("Portal Software Render", w, h, WindowOptions::default())?;
    win.set_target_fps(60);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        /* movement --------------------------------------------------------- */
        let mut forward = 0.0;
        let mut side = 0.0;
        if win.is_key_down(Key::W) || win.is_key_down(Key::Up) {
            forward += MOVE_SPEED;
        }
        if win.is_key_down(Key::S) || win.is_key_down(Key::Down) {
            forward -= MOVE_SPEED;
        }
        if win.is_key_down(Key::A) {
            side -= MOVE_SPEED;
        }
        if win.is_key_down(Key::D) {
            side += MOVE_SPEED;
        }
        if win.is_key_down(Key::Left) {
            camera.turn(TURN_SPEED);
        }
        if win.is_key_down(Key::Right) {
            camera.turn(-TURN_SPEED);
        }
        if win.is_key_down(Key::Space) {
            camera.position.y += MOVE_SPEED;
        }
        if win.is_key_down(Key::LeftShift) || win.is_key_down(Key::RightShift) {
            camera.position.y -= MOVE_SPEED;
        }

        if forward != 0.0 || side != 0.0 {
            let from = camera.map_pos();
            camera.step(forward, side);
            let next = scene.sector_after_move(sector, from, camera.map_pos());
            if next != sector {
                log::debug!("entered sector {next}");
                sector = next;
            }
        }

        /* draw */
        let t0 = Instant::now();
        {
            let mut surface = Surface::from_u32(w, h, format, &mut fb)?;
            surface.fill([0, 0, 0, 255]);
            renderer.render_parallel(&mut surface, scene, &camera, sector, pool);
        }
        acc_time += t0.elapsed();
        acc_frames += 1;
        win.update_with_buffer(&fb, w, h)?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            log::info!("avg render: {:.2} ms  ({:.1} FPS)", avg_ms, 1000.0 / avg_ms);
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
