use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use speech_music::{
    classify_batch, init_logging, AppConfig, BatchPipeline, ClipSource, FailurePolicy,
    FeatureBatch, LinearModel, WavDirectorySource,
};

#[derive(Parser, Debug)]
#[command(
    name = "speech_music_cli",
    about = "Extract speech/music features from a directory of clips"
)]
struct Cli {
    /// JSON configuration file (missing keys use defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log per-clip features at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the feature triple of every clip and print the batch as JSON
    Extract {
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Extract features, classify them and score against filename ground truth
    Classify {
        #[command(flatten)]
        batch: BatchArgs,
        /// Linear model weights (JSON)
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// List the clips a directory provides, in batch order
    List {
        /// Clip directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Clip directory
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Write JSON here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Worker threads (0 = one per core)
    #[arg(long)]
    jobs: Option<usize>,
    /// Abort on the first failing clip instead of skipping it
    #[arg(long)]
    fail_fast: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => AppConfig::try_load_from_file(path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Extract { batch } => run_extract(config, batch),
        Commands::Classify { batch, model } => run_classify(config, batch, model),
        Commands::List { dir } => run_list(&config, dir),
    }
}

fn clip_source(config: &AppConfig, dir: Option<PathBuf>) -> Result<WavDirectorySource> {
    let dir = dir
        .or_else(|| config.source.clip_dir.clone())
        .ok_or_else(|| anyhow!("no clip directory: pass --dir or set source.clip_dir"))?;
    Ok(WavDirectorySource::new(dir).with_extension(config.source.extension.clone()))
}

fn extract(config: &mut AppConfig, args: &BatchArgs) -> Result<FeatureBatch> {
    if let Some(jobs) = args.jobs {
        config.pipeline.workers = jobs;
    }
    if args.fail_fast {
        config.pipeline.failure_policy = FailurePolicy::FailFast;
    }

    let source = clip_source(config, args.dir.clone())?;
    let pipeline = BatchPipeline::new(config.pipeline.clone());
    pipeline
        .extract_all(&source)
        .with_context(|| format!("extracting features from {}", source.root().display()))
}

fn run_extract(mut config: AppConfig, args: BatchArgs) -> Result<ExitCode> {
    let batch = extract(&mut config, &args)?;
    emit_json(&batch, args.output.as_deref())?;
    Ok(exit_code(&batch))
}

fn run_classify(
    mut config: AppConfig,
    args: BatchArgs,
    model: Option<PathBuf>,
) -> Result<ExitCode> {
    let model_path = model
        .or_else(|| config.classifier.model_path.clone())
        .ok_or_else(|| anyhow!("no model: pass --model or set classifier.model_path"))?;
    let model = LinearModel::load(&model_path)
        .with_context(|| format!("loading model {}", model_path.display()))?;

    let batch = extract(&mut config, &args)?;
    let report = classify_batch(&batch, &model, &config.classifier.music_marker)?;
    emit_json(&report, args.output.as_deref())?;
    Ok(exit_code(&batch))
}

fn run_list(config: &AppConfig, dir: Option<PathBuf>) -> Result<ExitCode> {
    let source = clip_source(config, dir)?;
    let mut entries = source
        .enumerate()
        .with_context(|| format!("listing {}", source.root().display()))?;
    if entries.is_empty() {
        println!("No clips found under {}", source.root().display());
        return Ok(ExitCode::from(0));
    }

    entries.sort();
    for entry in entries {
        println!("{}", entry.file_name);
    }
    Ok(ExitCode::from(0))
}

fn emit_json<T: Serialize>(value: &T, output_path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(path) = output_path {
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }
    Ok(())
}

/// 2 when some clips were skipped or the batch was cancelled
fn exit_code(batch: &FeatureBatch) -> ExitCode {
    if batch.failures.is_empty() && !batch.cancelled {
        ExitCode::from(0)
    } else {
        ExitCode::from(2)
    }
}
