use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tweetreel::{
    AudioMode, AvatarFetcher as _, CardRenderer, HttpAvatarFetcher, Pipeline, PipelineConfig,
    TweetMetadata,
};

#[derive(Parser, Debug)]
#[command(name = "tweetreel", version)]
struct Cli {
    /// Pipeline config JSON; defaults apply to anything it leaves out.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download a post with yt-dlp and render the reel (requires `ffmpeg`, `ffprobe`, `yt-dlp`).
    Render(RenderArgs),
    /// Render the reel from a local video and explicit metadata.
    Local(LocalArgs),
    /// Render only the card as a PNG.
    Card(CardArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Post URL.
    #[arg(long)]
    url: String,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    encode: EncodeArgs,
}

#[derive(Parser, Debug)]
struct LocalArgs {
    /// Source video file.
    #[arg(long)]
    video: PathBuf,

    #[command(flatten)]
    meta: MetaArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    encode: EncodeArgs,
}

#[derive(Parser, Debug)]
struct CardArgs {
    #[command(flatten)]
    meta: MetaArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct MetaArgs {
    /// Display name.
    #[arg(long)]
    name: String,

    /// Username, drawn as `@username`.
    #[arg(long)]
    username: String,

    /// Avatar URL or local image path.
    #[arg(long)]
    avatar: Option<String>,

    #[arg(long, default_value = "")]
    caption: String,
}

impl MetaArgs {
    fn into_metadata(self) -> TweetMetadata {
        TweetMetadata::new(self.name, self.username, self.avatar, self.caption)
    }
}

#[derive(Parser, Debug)]
struct EncodeArgs {
    /// Override the audio handling from the config.
    #[arg(long, value_enum)]
    audio: Option<AudioChoice>,

    /// Composite frames on a single thread.
    #[arg(long, default_value_t = false)]
    serial: bool,

    /// Override the compositing chunk size.
    #[arg(long)]
    chunk_size: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AudioChoice {
    Copy,
    Aac,
}

impl From<AudioChoice> for AudioMode {
    fn from(value: AudioChoice) -> Self {
        match value {
            AudioChoice::Copy => Self::Copy,
            AudioChoice::Aac => Self::Aac,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Render(args) => cmd_render(config, args),
        Command::Local(args) => cmd_local(config, args),
        Command::Card(args) => cmd_card(config, args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    match path {
        Some(path) => Ok(PipelineConfig::from_path(path)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn apply_encode_args(mut config: PipelineConfig, args: &EncodeArgs) -> PipelineConfig {
    if let Some(audio) = args.audio {
        config.encode.audio = audio.into();
    }
    if args.serial {
        config.parallel = false;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    config
}

fn cmd_render(config: PipelineConfig, args: RenderArgs) -> anyhow::Result<()> {
    let config = apply_encode_args(config, &args.encode);
    let mut pipeline = Pipeline::new(config)?;
    let result = pipeline.run(&args.url, &args.out)?;
    eprintln!(
        "wrote {} ({}x{}, {:.2}s, {} frames)",
        result.path.display(),
        result.width,
        result.height,
        result.duration_secs,
        result.frames
    );
    Ok(())
}

fn cmd_local(config: PipelineConfig, args: LocalArgs) -> anyhow::Result<()> {
    let config = apply_encode_args(config, &args.encode);
    let mut pipeline = Pipeline::new(config)?;
    let result = pipeline.run_local(&args.video, args.meta.into_metadata(), &args.out)?;
    eprintln!(
        "wrote {} ({}x{}, {:.2}s, {} frames)",
        result.path.display(),
        result.width,
        result.height,
        result.duration_secs,
        result.frames
    );
    Ok(())
}

fn cmd_card(config: PipelineConfig, args: CardArgs) -> anyhow::Result<()> {
    let metadata = args.meta.into_metadata();
    let avatar = match metadata.avatar_ref.as_deref() {
        Some(avatar_ref) => {
            let fetcher = HttpAvatarFetcher::new(config.fetch_timeout())?;
            match fetcher.fetch_bytes(avatar_ref) {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    tracing::warn!(error = %err, "avatar fetch failed");
                    None
                }
            }
        }
        None => None,
    };

    let mut renderer = CardRenderer::new(config.card)?;
    let card = renderer.render_card(&metadata, avatar.as_deref())?;
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    card.write_png(&args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
