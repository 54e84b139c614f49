use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scrollreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the sequence frame for a scroll progress as a PNG.
    Frame(FrameArgs),
    /// Simulate a scroll session and print one JSON line per tick.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Progress of the sequence region in [0, 1].
    #[arg(long)]
    progress: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Directory frame locators resolve against (defaults to the scene's directory).
    #[arg(long)]
    assets: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 240)]
    ticks: u64,

    /// Display refresh rate.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Wheel delta fed before every tick, in CSS pixels.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    wheel: f64,

    /// End the intro video on the first tick and skip the scratch reveal.
    #[arg(long, default_value_t = false)]
    skip_intro: bool,

    /// Load the scene's frame sequence before the first tick.
    #[arg(long, default_value_t = false)]
    load_frames: bool,

    /// Directory frame locators resolve against (defaults to the scene's directory).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Write JSON lines here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn assets_root(in_path: &Path, assets: Option<PathBuf>) -> PathBuf {
    assets.unwrap_or_else(|| {
        in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    })
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let scene = scrollreel::SceneConfig::from_path(&args.in_path)?;
    scene.validate()?;
    let seq = scene
        .sequence
        .as_ref()
        .context("scene has no frame sequence")?;

    let loader = scrollreel::FsImageLoader::new(assets_root(&args.in_path, args.assets));
    let surface = scrollreel::PixmapSurface::new(scene.viewport)?;
    let mut player =
        scrollreel::FrameSequencePlayer::new(surface).with_background(seq.background);
    let report = player.load(&loader, &seq.locators()?, seq.threads)?;
    eprintln!(
        "loaded {}/{} frames ({} failed)",
        report.loaded,
        report.requested,
        report.failures.len()
    );

    player.set_progress(scrollreel::Progress::new(args.progress));
    player.render()?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    player.surface().save_png(&args.out)?;

    eprintln!(
        "wrote {} (frame {})",
        args.out.display(),
        player.state().current_frame
    );
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.fps.is_finite() && args.fps > 0.0,
        "--fps must be finite and > 0"
    );
    let scene = scrollreel::SceneConfig::from_path(&args.in_path)?;
    let surface = scrollreel::PixmapSurface::new(scene.viewport)?;
    let mut session = scrollreel::ExperienceSession::new(scene, surface)?;
    session.start();

    if args.load_frames {
        let loader = scrollreel::FsImageLoader::new(assets_root(&args.in_path, args.assets));
        match session.load_frames(&loader) {
            Ok(report) => eprintln!("loaded {}/{} frames", report.loaded, report.requested),
            Err(e) => eprintln!("frame sequence unavailable: {e}"),
        }
    }

    let mut out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("create '{}'", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let dt = 1.0 / args.fps;
    for i in 0..args.ticks {
        if args.skip_intro && i == 0 {
            session.on_video_ended();
            session.skip_intro();
        }
        if args.wheel != 0.0 {
            session.on_wheel(args.wheel);
        }
        let report = session.tick(dt);
        serde_json::to_writer(&mut out, &report).context("serialize tick report")?;
        out.write_all(b"\n").context("write tick report")?;
    }
    out.flush().context("flush tick reports")?;
    session.teardown();
    Ok(())
}
