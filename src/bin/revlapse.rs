use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use revlapse::{
    CollectReport, Config, ConverterRegistry, DropboxClient, FfmpegSink, FfmpegSinkOpts,
    FsStorage, HttpFetcher, Ledger,
};

#[derive(Parser, Debug)]
#[command(name = "revlapse", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download preview images captured from a web UI's version history.
    Previews(PreviewsArgs),
    /// Download every revision of a Dropbox file and convert it to PNG.
    Revisions(RevisionsArgs),
    /// Caption the collected versions and encode an MP4 (requires `ffmpeg` on PATH).
    Movie(MovieArgs),
}

#[derive(Parser, Debug)]
struct PreviewsArgs {
    /// Text file holding a request copied with "Copy as cURL".
    #[arg(long)]
    curl_file: PathBuf,

    /// JSON list (or id-keyed map) of `{timestamp, url}` preview records.
    #[arg(long)]
    versions_json: PathBuf,

    /// Directory the previews are written to.
    #[arg(long, default_value = "versions")]
    outdir: PathBuf,

    /// Ledger file written after collection.
    #[arg(long, default_value = "metadata.json")]
    metadata_file: PathBuf,

    /// Optional JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RevisionsArgs {
    /// File holding the Dropbox access token.
    #[arg(long, default_value = ".token")]
    token_file: PathBuf,

    /// Path of the document inside Dropbox, starting with `/`.
    #[arg(long)]
    file_path: String,

    /// Directory the revisions are written to.
    #[arg(long, default_value = "versions")]
    outdir: PathBuf,

    /// Ledger file written after collection.
    #[arg(long, default_value = "metadata.json")]
    metadata_file: PathBuf,

    /// Maximum number of revisions to list (at most 100).
    #[arg(long)]
    limit: Option<u32>,

    /// Optional JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct MovieArgs {
    /// Ledger file produced by `previews` or `revisions`.
    #[arg(long, default_value = "metadata.json")]
    metadata_file: PathBuf,

    /// Output MP4 path.
    #[arg(long, default_value = "timelapse.mp4")]
    output_file: PathBuf,

    /// Versions shown per second.
    #[arg(long)]
    fps: Option<u32>,

    /// Caption font (TrueType/OpenType).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Optional JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Previews(args) => cmd_previews(args),
        Command::Revisions(args) => cmd_revisions(args),
        Command::Movie(args) => cmd_movie(args),
    }
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    Ok(Config::load_or_default(path)?)
}

fn http_timeout(cfg: &Config) -> Option<Duration> {
    cfg.collect.http_timeout_secs.map(Duration::from_secs)
}

fn cmd_previews(args: PreviewsArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;

    let curl = std::fs::read_to_string(&args.curl_file)
        .with_context(|| format!("read curl command '{}'", args.curl_file.display()))?;
    let credentials = revlapse::parse_curl(&curl)?;
    let records_bytes = std::fs::read(&args.versions_json)
        .with_context(|| format!("read versions '{}'", args.versions_json.display()))?;
    let records = revlapse::parse_preview_records(&records_bytes)?;

    let mut fetcher = HttpFetcher::new(credentials, http_timeout(&cfg));
    let mut storage = FsStorage;
    let report = revlapse::collect_previews(&records, &mut fetcher, &mut storage, &args.outdir)?;
    finish_collection(&report, &mut storage, &args.outdir, &args.metadata_file)
}

fn cmd_revisions(args: RevisionsArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let converters = ConverterRegistry::standard(cfg.collect.pdf_dpi);
    // Fail on unsupported documents before the token is even read.
    converters.resolve(&args.file_path)?;

    let mut client = DropboxClient::from_token_file(&args.token_file, http_timeout(&cfg))?;
    let mut storage = FsStorage;
    let limit = args.limit.unwrap_or(cfg.collect.revision_limit);
    let report = revlapse::collect_revisions(
        &args.file_path,
        limit,
        &mut client,
        &converters,
        &mut storage,
        &args.outdir,
    )?;
    finish_collection(&report, &mut storage, &args.outdir, &args.metadata_file)
}

fn finish_collection(
    report: &CollectReport,
    storage: &mut FsStorage,
    outdir: &Path,
    metadata_file: &Path,
) -> anyhow::Result<()> {
    report.log_summary(outdir);
    report.ledger.save(storage, metadata_file)?;
    if report.possibly_truncated {
        eprintln!(
            "note: the listing hit its ceiling; older revisions may exist that were not retrieved"
        );
    }
    eprintln!(
        "collected {} / {} versions in {:.1}s",
        report.succeeded(),
        report.attempted,
        report.elapsed.as_secs_f64()
    );
    eprintln!("wrote {}", metadata_file.display());
    Ok(())
}

fn cmd_movie(args: MovieArgs) -> anyhow::Result<()> {
    let started = Instant::now();
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(fps) = args.fps {
        cfg.timelapse.fps = fps;
    }
    if let Some(font) = args.font {
        cfg.timelapse.font_path = Some(font);
    }
    cfg.validate()?;
    let style = &cfg.timelapse;

    let mut storage = FsStorage;
    let ledger = Ledger::load(&storage, &args.metadata_file)?;
    let mut caption = revlapse::caption_for_style(style)?;

    let frames = revlapse::composite_frames(&ledger, &mut storage, caption.as_mut(), style)?;
    tracing::info!(
        rendered = frames.rendered,
        reused = frames.reused,
        "frames ready"
    );

    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&args.output_file));
    let stats = revlapse::assemble_timelapse(&frames.frames, &storage, &mut sink, style)?;

    eprintln!(
        "{} versions, {:.1}s of video, encoded in {:.1}s",
        stats.plan.main,
        stats.plan.duration_secs(),
        started.elapsed().as_secs_f64()
    );
    eprintln!("wrote {}", args.output_file.display());
    Ok(())
}
