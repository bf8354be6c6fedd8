use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use posepipe::config::{RunConfig, DEFAULT_RENDER_STRIDE};
use posepipe::pipeline::{
    CommandEstimator, FrameFormat, FrameRenderTransform, PoseExportTransform, RenderSettings,
};
use posepipe::scheduler::Coordinator;
use posepipe::worker::ItemTransform;
use posepipe::{shutdown, source};

#[derive(Parser, Debug)]
#[command(name = "posepipe")]
#[command(version)]
#[command(about = "Batch pose pipeline: export poses from images, render frames from poses")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Estimate a pose for every image in a directory (one JSON per image)
    Export(ExportArgs),

    /// Render pose JSON files into sequentially numbered frames
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Directory of input images; outputs go to <dir>/dist
    input_dir: PathBuf,

    /// Estimator command, invoked as `<cmd...> <image_path>`; must print
    /// the pose as JSON on stdout
    #[arg(long)]
    model_cmd: String,

    /// Worker count (default: available CPUs)
    #[arg(long, short = 'w')]
    workers: Option<usize>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Directory of pose JSON files; frames go to <dir>/dist
    input_dir: PathBuf,

    /// Worker count (default: available CPUs)
    #[arg(long, short = 'w')]
    workers: Option<usize>,

    /// Render every Nth pose file
    #[arg(long, default_value_t = DEFAULT_RENDER_STRIDE)]
    stride: usize,

    /// Frame image format
    #[arg(long, short = 'f', default_value = "jpg")]
    format: FormatArg,
}

#[derive(Debug, Clone, ValueEnum)]
enum FormatArg {
    Jpg,
    Png,
}

impl From<FormatArg> for FrameFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jpg => FrameFormat::Jpg,
            FormatArg::Png => FrameFormat::Png,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Scan the inputs, spawn the pool, and run the batch to completion.
async fn run_batch(
    config: RunConfig,
    transform: Arc<dyn ItemTransform>,
) -> Result<(), Box<dyn std::error::Error>> {
    let jobs = source::scan_input_dir(config.input_dir())?;
    source::ensure_output_dir(config.output_dir())?;

    tracing::info!(
        inputs = jobs.len(),
        pool_size = config.pool_size,
        stride = config.stride.get(),
        input_dir = %config.input_dir().display(),
        output_dir = %config.output_dir().display(),
        "Starting batch run"
    );

    let token = shutdown::shutdown_token();
    let summary = Coordinator::new(jobs, transform, &config).run(token).await;

    tracing::info!(
        jobs = summary.jobs_total,
        assigned = summary.assigned,
        succeeded = summary.succeeded,
        failed = summary.failed,
        lost = summary.lost,
        respawns = summary.respawns,
        "Run complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    match args.command {
        Commands::Export(export) => {
            let mut config = RunConfig::new(export.input_dir);
            if let Some(workers) = export.workers {
                config = config.with_pool_size(workers);
            }

            let estimator = Arc::new(CommandEstimator::from_command_line(&export.model_cmd)?);
            let transform = Arc::new(PoseExportTransform::new(
                config.input_dir().to_path_buf(),
                config.output_dir().to_path_buf(),
                estimator,
            ));
            run_batch(config, transform).await?;
        }
        Commands::Render(render) => {
            let mut config = RunConfig::new(render.input_dir).with_stride(render.stride);
            if let Some(workers) = render.workers {
                config = config.with_pool_size(workers);
            }

            let settings = RenderSettings {
                format: render.format.into(),
                ..RenderSettings::default()
            };
            let transform = Arc::new(FrameRenderTransform::new(
                config.input_dir().to_path_buf(),
                config.output_dir().to_path_buf(),
                settings,
            ));
            run_batch(config, transform).await?;
        }
    }

    Ok(())
}
