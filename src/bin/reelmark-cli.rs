use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::error;

use reelmark::{
    AssetStore, HttpServices, ProjectFile, RenderService, ServiceConfig, Session, TrackKind,
};

#[derive(Parser, Debug)]
#[command(name = "reelmark")]
#[command(about = "Lay clip and music highlights over a transcript and render them")]
struct Params {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Base URL of the asset and rendering services (overrides REELMARK_SERVICE_URL).
    #[arg(long = "service-url", global = true)]
    service_url: Option<String>,

    /// Per-request timeout in seconds (overrides REELMARK_TIMEOUT_SECS).
    #[arg(long = "timeout-secs", global = true)]
    timeout_secs: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a video with its script and validate the returned transcript.
    Ingest {
        #[arg(long)]
        video: PathBuf,

        /// Plain-text script, one subtitle box per line.
        #[arg(long)]
        script: PathBuf,

        /// Write an empty project file seeded with the transcript.
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// List clips and audio files on the asset store.
    Assets,

    /// Upload a clip or audio file.
    Upload {
        #[arg(long)]
        file: PathBuf,
    },

    /// Apply a project file and submit it for rendering.
    Render {
        #[arg(long)]
        project: PathBuf,

        /// Print the render request instead of submitting it.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Download the rendered output to this path.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Download a rendered output by filename.
    Download {
        #[arg(long)]
        filename: String,

        #[arg(long)]
        out: PathBuf,
    },

    /// Print the download URL for a rendered output.
    DownloadUrl {
        #[arg(long)]
        filename: String,
    },

    /// Show which words a project's highlights cover on one track.
    Coverage {
        #[arg(long)]
        project: PathBuf,

        #[arg(long, value_enum, default_value_t = TrackKind::Clip)]
        track: TrackKind,
    },
}

#[tokio::main]
async fn main() {
    reelmark::init_logging();

    if let Err(err) = run().await {
        error!(error = ?err, "reelmark failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let params = Params::parse();
    let config = service_config(&params.service)?;

    match params.command {
        Command::Ingest {
            video,
            script,
            save,
        } => {
            let services = HttpServices::new(config)?;
            let resp = services.ingest(&video, &script).await?;

            let mut session = Session::new();
            session
                .load_ingest(&resp)
                .context("ingestion service returned an unusable transcript")?;

            print_json(&json!({
                "video_path": resp.video_path,
                "word_count": resp.word_count,
                "subtitles": resp.subtitles.len(),
            }))?;

            if let Some(path) = save {
                ProjectFile::from_ingest(resp)
                    .write_to(&path)
                    .with_context(|| format!("failed to write project to {}", path.display()))?;
            }
        }
        Command::Assets => {
            let services = HttpServices::new(config)?;
            let session = Session::new();
            let listing = session.refresh_assets(&services).await?;
            print_json(&listing)?;
        }
        Command::Upload { file } => {
            let services = HttpServices::new(config)?;
            let session = Session::new();
            let stored = session.upload_asset(&services, &file).await?;
            print_json(&json!({ "file_path": stored }))?;
        }
        Command::Render {
            project,
            dry_run,
            out,
        } => {
            let project = ProjectFile::from_path(&project)
                .with_context(|| format!("failed to load project {}", project.display()))?;
            let (session, _) = project.apply(Session::new())?;

            if dry_run {
                print_json(&session.build_request(project.preserve_audio)?)?;
                return Ok(());
            }

            let services = HttpServices::new(config)?;
            let filename = session.process(&services, project.preserve_audio).await?;
            print_json(&json!({
                "output_filename": filename,
                "download_url": services.download_url(&filename),
            }))?;

            if let Some(out) = out {
                services.download_to(&filename, &out).await?;
            }
        }
        Command::Download { filename, out } => {
            let services = HttpServices::new(config)?;
            let bytes = services.download_to(&filename, &out).await?;
            print_json(&json!({ "path": out, "bytes": bytes }))?;
        }
        Command::DownloadUrl { filename } => {
            let services = HttpServices::new(config)?;
            println!("{}", services.download_url(&filename));
        }
        Command::Coverage { project, track } => {
            let project = ProjectFile::from_path(&project)
                .with_context(|| format!("failed to load project {}", project.display()))?;
            let (session, _) = project.apply(Session::new())?;
            print_coverage(&session, track)?;
        }
    }

    Ok(())
}

fn service_config(args: &ServiceArgs) -> Result<ServiceConfig> {
    let mut config = ServiceConfig::from_env()?;
    if let Some(url) = &args.service_url {
        config = config.with_base_url(url)?;
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

/// One line per word: index, a marker for covered words, the media on top, and the word.
fn print_coverage(session: &Session, kind: TrackKind) -> Result<()> {
    let Some(transcript) = session.transcript() else {
        return Ok(());
    };
    let track = session.track(kind);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for word in transcript.words() {
        let top = track
            .topmost_at(word.index)
            .map(|h| h.media_ref.as_str())
            .unwrap_or("");
        let mark = if track.is_word_covered(word.index) { '*' } else { ' ' };
        writeln!(out, "{:>5} {mark} {:<24} {}", word.index, top, word.text)?;
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
