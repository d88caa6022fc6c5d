//! Alembic Recorder CLI - records a small animated demo scene.

use alembic_recorder::archive::memory::ArchiveRecord;
use alembic_recorder::archive::{ArchiveBackend, NodeHandle, XformHandle, XformSampleData};
use alembic_recorder::capture::TargetKind;
use alembic_recorder::prelude::*;

use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const DEFAULT_FRAMES: u32 = 90;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "warn",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "record" | "r" => cmd_record(&filtered_args[1..]),
        "config" | "c" => cmd_config(filtered_args.get(1).copied()),
        "version" | "-V" | "--version" => {
            println!(
                "alembic-recorder {} (built {})",
                env!("CARGO_PKG_VERSION"),
                env!("ALEMBIC_RECORDER_BUILD_STAMP")
            );
            Ok(())
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_help();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_help() {
    println!(
        "alembic-recorder {}

USAGE:
    alembic-recorder [FLAGS] <COMMAND> [ARGS]

COMMANDS:
    record, r  [config.json] [--frames N] [--fps F] [--json]
               Record the built-in demo scene and print what was written
    config, c  [out.json]
               Print (or write) the default recorder configuration
    version    Print version and build stamp
    help       Show this help

FLAGS:
    -v, --verbose   Debug logging
    -vv, --trace    Trace logging (one line per captured frame)
    -q, --quiet     Warnings and errors only

RUST_LOG overrides the level flags.",
        env!("CARGO_PKG_VERSION")
    );
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_config(out: Option<&str>) -> Result<()> {
    let config = RecorderConfig::default();
    match out {
        Some(path) => {
            config
                .save(path)
                .with_context(|| format!("writing {}", path))?;
            println!("Wrote {}", path);
        }
        None => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}

fn cmd_record(args: &[&str]) -> Result<()> {
    let mut config_path: Option<&str> = None;
    let mut frames = DEFAULT_FRAMES;
    let mut fps: Option<f32> = None;
    let mut json = false;

    let mut it = args.iter();
    while let Some(&arg) = it.next() {
        match arg {
            "--frames" | "-n" => {
                let value = it.next().context("--frames needs a value")?;
                frames = value.parse().with_context(|| format!("bad frame count '{}'", value))?;
            }
            "--fps" => {
                let value = it.next().context("--fps needs a value")?;
                fps = Some(value.parse().with_context(|| format!("bad fps '{}'", value))?);
            }
            "--json" | "-j" => json = true,
            path if config_path.is_none() && !path.starts_with('-') => config_path = Some(path),
            other => bail!("unexpected argument '{}'", other),
        }
    }

    let mut config = match config_path {
        Some(path) => RecorderConfig::load(path).with_context(|| format!("loading {}", path))?,
        None => RecorderConfig::new("demo.abc"),
    };
    if let Some(fps) = fps {
        config.archive.frame_rate = fps;
    }
    config.validate()?;
    let delta_time = 1.0 / f64::from(config.archive.frame_rate);

    let mut scene = demo_scene();
    scene.add_custom_recorder(Marker::default());

    let mut driver = SessionDriver::new(RecordingSession::new(MemoryArchive::new(), config));
    driver.session_mut().try_begin(&scene)?;
    print_registry(driver.session().registry());

    let mut animator = Animator { scene: &scene, time: 0.0 };
    let mut frame_loop = FrameLoop::new();
    for _ in 0..frames {
        frame_loop.step(delta_time, &mut [&mut driver, &mut animator])?;
    }

    let session = driver.session_mut();
    session.end();
    let stats = session.stats();
    let archive = session.archive();
    let record = archive.last_archive().context("no archive was written")?;

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!();
    println!("Archive:  {}", record.path.as_deref().unwrap_or(Path::new("?")).display());
    println!("Frames:   {} ({:.3}s)", stats.frames, session.time());
    println!("Samples:  {} written, {} skipped", stats.samples_written, stats.samples_skipped);
    println!();
    print_tree(record, 0, 0);
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

fn print_registry(registry: &Registry) {
    let count = |kind: TargetKind| registry.kinds().iter().filter(|&&k| k == kind).count();
    println!(
        "Discovered {} targets: {} transform, {} camera, {} mesh, {} skinned, {} custom",
        registry.len(),
        count(TargetKind::Transform),
        count(TargetKind::Camera),
        count(TargetKind::Mesh),
        count(TargetKind::SkinnedMesh),
        count(TargetKind::Custom),
    );
}

fn print_tree(record: &ArchiveRecord, index: usize, depth: usize) {
    let object = &record.objects[index];
    let name = if object.name.is_empty() { "/" } else { object.name.as_str() };
    let shape = object.shape.map(|s| format!(" [{:?}]", s)).unwrap_or_default();
    println!("{}{}{} ({} samples)", "  ".repeat(depth), name, shape, object.samples.len());
    for &child in &object.children {
        print_tree(record, child as usize, depth + 1);
    }
}

// ============================================================================
// Demo scene
// ============================================================================

const WAVE_RES: usize = 8;

fn demo_scene() -> MemoryScene {
    let mut scene = MemoryScene::new();
    scene.add_camera(
        "camera",
        WorldTransform::from_trs(Vec3::new(0.0, 2.0, 8.0), Quat::IDENTITY, Vec3::ONE),
        CameraState::default(),
    );
    scene.add_mesh_renderer("cube", WorldTransform::IDENTITY, Some(Mesh::cube()));
    scene.add_skinned_mesh_renderer(
        "wave",
        WorldTransform::from_trs(Vec3::new(0.0, -1.0, 0.0), Quat::IDENTITY, Vec3::splat(4.0)),
        Some(wave_mesh(0.0)),
    );
    scene
}

/// Grid in the XZ plane with a travelling sine on Y.
fn wave_mesh(time: f32) -> Mesh {
    let n = WAVE_RES;
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            let u = i as f32 / n as f32 - 0.5;
            let v = j as f32 / n as f32 - 0.5;
            let y = 0.1 * (6.0 * u + 3.0 * time).sin();
            vertices.push(Vec3::new(u, y, v));
        }
    }
    let stride = (n + 1) as u32;
    let mut indices = Vec::with_capacity(n * n * 6);
    for j in 0..n as u32 {
        for i in 0..n as u32 {
            let a = j * stride + i;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }
    Mesh::new(vertices, indices)
}

/// Animates the demo scene in the update phase.
struct Animator<'a> {
    scene: &'a MemoryScene,
    time: f32,
}

impl FrameListener for Animator<'_> {
    fn update(&mut self, delta_time: f64) {
        self.time += delta_time as f32;
        let t = self.time;

        let spin = Quat::from_rotation_y(t) * Quat::from_rotation_x(0.5 * t);
        self.scene.set_transform("cube", WorldTransform::from_trs(Vec3::ZERO, spin, Vec3::ONE));

        let eye = Vec3::new(8.0 * (0.3 * t).sin(), 2.0, 8.0 * (0.3 * t).cos());
        let look = Quat::from_rotation_y(0.3 * t);
        self.scene.set_transform("camera", WorldTransform::from_trs(eye, look, Vec3::ONE));

        self.scene.set_mesh("wave", Some(wave_mesh(t)));
    }
}

/// Custom recorder writing a bobbing locator under the archive root.
#[derive(Default)]
struct Marker {
    xform: Option<XformHandle>,
    frame: u32,
}

impl CustomRecorder for Marker {
    fn name(&self) -> String {
        "marker".to_string()
    }

    fn set_parent(
        &mut self,
        archive: &mut dyn ArchiveBackend,
        parent: NodeHandle,
    ) -> alembic_recorder::Result<()> {
        let node = archive.create_object(parent, "marker")?;
        self.xform = Some(archive.add_xform(node)?);
        Ok(())
    }

    fn capture(&mut self, archive: &mut dyn ArchiveBackend) -> alembic_recorder::Result<()> {
        let Some(xform) = self.xform else {
            return Ok(());
        };
        self.frame += 1;
        let sample = XformSampleData {
            translation: Vec3::new(0.0, 1.0 + 0.25 * (self.frame as f32 * 0.2).sin(), 0.0),
            scale: Vec3::ONE,
            rotation_angle: 0.0,
            rotation_axis: Vec3::X,
            inherits: false,
        };
        archive.write_xform_sample(xform, &sample)
    }
}
