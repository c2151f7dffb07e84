use anyhow::{Context, Result, bail};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::progress::create_spinner;
use crate::ui::prelude::{Level, emit};

use super::aws::AwsCli;
use super::cli::{ConfigCommands, SrtArgs, TranscribeCommands};
use super::config::{TranscribeConfig, config_path};
use super::jobs::{ObjectStore, job_name};
use super::local::{DirectorySink, LocalStore};
use super::pipeline::Pipeline;
use super::srt::transcript_to_srt;

pub fn handle_transcribe_command(
    command: TranscribeCommands,
    config_override: Option<&Path>,
) -> Result<()> {
    match command {
        TranscribeCommands::Srt(args) => handle_srt(args),
        TranscribeCommands::List => with_pipeline(config_override, |pipeline, config| {
            handle_list(pipeline, config)
        }),
        TranscribeCommands::Status(args) => {
            with_pipeline(config_override, |pipeline, _| handle_status(pipeline, &args.video))
        }
        TranscribeCommands::Transcribe(args) => {
            with_pipeline(config_override, |pipeline, config| {
                let outcome = pipeline
                    .transcribe_video(&args.video, args.force || config.force_transcribe)?;
                emit(
                    Level::Info,
                    "transcribe.video.outcome",
                    &format!("{}: {}", args.video, outcome.describe()),
                    None,
                );
                Ok(())
            })
        }
        TranscribeCommands::Convert(args) => with_pipeline(config_override, |pipeline, _| {
            let outcome = pipeline.convert_to_srt(&args.video)?;
            emit(
                Level::Info,
                "transcribe.srt.outcome",
                &format!("{}: {}", args.video, outcome.describe()),
                None,
            );
            Ok(())
        }),
        TranscribeCommands::Run(args) => with_pipeline(config_override, |pipeline, config| {
            handle_run(pipeline, args.force || config.force_transcribe)
        }),
    }
}

/// Build the bucket-backed pipeline from the configuration and hand it to `f`.
fn with_pipeline<T>(
    config_override: Option<&Path>,
    f: impl FnOnce(&Pipeline<'_>, &TranscribeConfig) -> Result<T>,
) -> Result<T> {
    let config = load_config(config_override)?;
    config.require_buckets()?;

    let aws = AwsCli::from_config(&config);
    let local_store = config.store_root.as_ref().map(LocalStore::new);
    let store: &dyn ObjectStore = match &local_store {
        Some(store) => store,
        None => &aws,
    };
    let sink = DirectorySink::new(config.subtitle_dir());
    let pipeline = Pipeline::new(&config, store, &aws, &sink);

    f(&pipeline, &config)
}

fn handle_list(pipeline: &Pipeline<'_>, config: &TranscribeConfig) -> Result<()> {
    let pb = create_spinner(format!("Listing {}", config.input_bucket));
    let videos = pipeline.list_videos();
    pb.finish_and_clear();
    let videos = videos?;

    if videos.is_empty() {
        emit(
            Level::Info,
            "transcribe.list.empty",
            &format!("No video files in {}", config.input_bucket),
            None,
        );
    }
    for video in &videos {
        emit(
            Level::Info,
            "transcribe.list.video",
            video,
            Some(json!({ "video": video, "job": job_name(video) })),
        );
    }
    Ok(())
}

fn handle_status(pipeline: &Pipeline<'_>, video: &str) -> Result<()> {
    let pb = create_spinner(format!("Checking {video}"));
    let status = pipeline.job_status(video);
    pb.finish_and_clear();
    let status = status?;

    let name = job_name(video);
    emit(
        Level::Info,
        "transcribe.job.status",
        &status.describe(&name),
        Some(json!({ "video": video, "job": name, "status": status.code() })),
    );
    Ok(())
}

fn handle_run(pipeline: &Pipeline<'_>, force: bool) -> Result<()> {
    let reports = pipeline.transcribe_all(force)?;
    for (video, report) in &reports {
        emit(
            Level::Info,
            "transcribe.run.report",
            &format!(
                "{video}: {} / {}",
                report.transcribe.describe(),
                report.convert.describe()
            ),
            Some(json!({
                "video": video,
                "transcribe": report.transcribe.describe(),
                "convert": report.convert.describe(),
            })),
        );
    }
    emit(
        Level::Success,
        "transcribe.run.done",
        &format!("Processed {} video files", reports.len()),
        Some(json!({ "videos": reports.len() })),
    );
    Ok(())
}

fn handle_srt(args: SrtArgs) -> Result<()> {
    let document = fs::read_to_string(&args.transcript)
        .with_context(|| format!("reading transcript {}", args.transcript.display()))?;

    let out_path = args
        .out_file
        .clone()
        .unwrap_or_else(|| args.transcript.with_extension("srt"));
    if out_path.exists() && !args.force {
        bail!(
            "{} already exists, pass --force to overwrite",
            out_path.display()
        );
    }

    let (srt, cues) = transcript_to_srt(&document)
        .with_context(|| format!("converting {}", args.transcript.display()))?;
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating subtitle directory {}", parent.display()))?;
    }
    fs::write(&out_path, srt)
        .with_context(|| format!("writing subtitles to {}", out_path.display()))?;

    emit(
        Level::Success,
        "transcribe.srt.written",
        &format!("Wrote {cues} cues to {}", out_path.display()),
        Some(json!({ "cues": cues, "path": out_path })),
    );
    Ok(())
}

pub fn handle_config_command(command: ConfigCommands, config_override: Option<&Path>) -> Result<()> {
    let path = resolve_config_path(config_override)?;
    match command {
        ConfigCommands::Path => {
            emit(
                Level::Info,
                "config.path",
                &path.display().to_string(),
                Some(json!({ "path": path })),
            );
        }
        ConfigCommands::Show => {
            let config = TranscribeConfig::load_from_path(&path)?;
            let rendered =
                toml::to_string_pretty(&config).context("serializing transcribe config")?;
            emit(
                Level::Info,
                "config.show",
                rendered.trim_end(),
                Some(serde_json::to_value(&config).context("serializing transcribe config")?),
            );
        }
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists, pass --force to overwrite", path.display());
            }
            TranscribeConfig::default().save_to_path(&path)?;
            emit(
                Level::Success,
                "config.init",
                &format!("Wrote default configuration to {}", path.display()),
                None,
            );
        }
    }
    Ok(())
}

fn resolve_config_path(config_override: Option<&Path>) -> Result<PathBuf> {
    match config_override {
        Some(path) => Ok(path.to_path_buf()),
        None => config_path(),
    }
}

fn load_config(config_override: Option<&Path>) -> Result<TranscribeConfig> {
    TranscribeConfig::load_from_path(resolve_config_path(config_override)?)
}
