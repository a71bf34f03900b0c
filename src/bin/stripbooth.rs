use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use stripbooth::{
    AssetStore, BoothConfig, Compositor, Constraints, Countdown, CountdownStep, EditorScript,
    FileHandoff, LogNavigator, PreviewTick, StickerEditor, acquire_live_stream,
};

#[derive(Parser, Debug)]
#[command(name = "stripbooth", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose a strip from two still images and hand it off to the editor stage.
    Upload(UploadArgs),
    /// Capture a strip from a camera (requires the `media-ffmpeg` feature and `ffmpeg` on PATH).
    Capture(CaptureArgs),
    /// Open the handed-off strip, replay a sticker script and export the result.
    Decorate(DecorateArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Theme/config JSON. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Asset root for frame and sticker paths (falls back to $STRIPBOOTH_ASSET_ROOT, then `.`).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Directory holding the handoff slot.
    #[arg(long)]
    handoff: PathBuf,
}

#[derive(Parser, Debug)]
struct UploadArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Image for the top cell.
    #[arg(long)]
    top: PathBuf,

    /// Image for the bottom cell.
    #[arg(long)]
    bottom: PathBuf,

    /// Also write the finished strip here.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct CaptureArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Capture device, e.g. `/dev/video0`; `default` picks the user-facing camera.
    #[arg(long, default_value = stripbooth::media::DEFAULT_DEVICE)]
    device: String,

    /// Prefer the rear camera when `--device default` is used.
    #[arg(long)]
    rear: bool,

    /// CSS-style filter for the live preview (overrides the config).
    #[arg(long)]
    filter: Option<String>,

    /// Preview refresh rate while counting down.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Also write the finished strip here.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct DecorateArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Editor action script (JSON).
    #[arg(long)]
    script: Option<PathBuf>,

    /// Output image; defaults to the configured editor filename.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Upload(args) => cmd_upload(args),
        Command::Capture(args) => cmd_capture(args),
        Command::Decorate(args) => cmd_decorate(args),
    }
}

fn load_config(common: &CommonArgs) -> anyhow::Result<BoothConfig> {
    Ok(match &common.config {
        Some(path) => BoothConfig::load(path)?,
        None => BoothConfig::default(),
    })
}

fn asset_root(common: &CommonArgs) -> PathBuf {
    common
        .assets
        .clone()
        .or_else(|| std::env::var_os("STRIPBOOTH_ASSET_ROOT").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn open_compositor(
    common: &CommonArgs,
) -> anyhow::Result<Compositor<FileHandoff, LogNavigator>> {
    let config = load_config(common)?;
    let handoff = FileHandoff::new(&common.handoff, &config.handoff_key)?;
    let assets = AssetStore::new(asset_root(common));
    Ok(Compositor::new(config, assets, handoff, LogNavigator)?)
}

fn write_strip(
    compositor: &Compositor<FileHandoff, LogNavigator>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    if compositor.strip().is_none() {
        anyhow::bail!("strip was not finalized");
    }
    if let Some(out) = out {
        let bytes = compositor.export()?;
        stripbooth::export::save(out, &bytes)?;
        eprintln!("wrote {}", out.display());
    }
    eprintln!("strip handed off to {}", compositor.handoff().path().display());
    Ok(())
}

fn cmd_upload(args: UploadArgs) -> anyhow::Result<()> {
    let mut compositor = open_compositor(&args.common)?;
    for path in [&args.top, &args.bottom] {
        let bytes =
            std::fs::read(path).with_context(|| format!("read upload '{}'", path.display()))?;
        compositor
            .upload(&bytes)
            .with_context(|| format!("place upload '{}'", path.display()))?;
    }
    write_strip(&compositor, args.out.as_deref())
}

fn cmd_capture(args: CaptureArgs) -> anyhow::Result<()> {
    let mut compositor = open_compositor(&args.common)?;
    if let Some(f) = &args.filter {
        compositor.set_preview_filter(f)?;
    }
    let device = args.device.clone();
    let constraints = Constraints {
        facing_user: !args.rear,
        ..Constraints::default()
    };
    compositor.start_live(|| acquire_live_stream(&device, &constraints))?;

    let frame_interval = Duration::from_secs(1) / args.fps.max(1);
    while compositor.strip().is_none() {
        eprintln!("{}", compositor.take_photo()?);
        loop {
            let tick_deadline = Instant::now() + Countdown::INTERVAL;
            while Instant::now() < tick_deadline {
                if compositor.on_animation_frame()? == PreviewTick::Stop
                    && !compositor.has_live_source()
                {
                    anyhow::bail!("camera stream ended before the strip was complete");
                }
                std::thread::sleep(frame_interval);
            }
            match compositor.on_countdown_tick()? {
                CountdownStep::Show(n) => eprintln!("{n}"),
                CountdownStep::Fire | CountdownStep::Idle => break,
            }
        }
    }
    write_strip(&compositor, args.out.as_deref())
}

fn cmd_decorate(args: DecorateArgs) -> anyhow::Result<()> {
    let config = load_config(&args.common)?;
    let mut handoff = FileHandoff::new(&args.common.handoff, &config.handoff_key)?;
    let assets = AssetStore::new(asset_root(&args.common));
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.export.editor_filename));

    let mut editor = StickerEditor::load(config, assets, &mut handoff, &mut LogNavigator)?;
    if let Some(path) = &args.script {
        EditorScript::load(path)?.apply(&mut editor)?;
    }

    let bytes = editor.export()?;
    stripbooth::export::save(&out, &bytes)?;
    eprintln!(
        "wrote {} ({} stickers)",
        out.display(),
        editor.stickers().len()
    );
    Ok(())
}
