use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::paths;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscribeConfig {
    /// Bucket holding the source videos
    pub input_bucket: String,
    /// Bucket Amazon Transcribe writes transcripts into
    pub output_bucket: String,
    /// Language code passed to every transcription job
    pub language_code: String,
    /// Start jobs even when a transcript already exists
    pub force_transcribe: bool,
    /// AWS region of the input bucket and the transcription service
    pub region: String,
    /// Named AWS CLI profile, if not the default one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_profile: Option<String>,
    /// Where SRT files are written (defaults to the working directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle_dir: Option<PathBuf>,
    /// Read buckets from this directory (one subdirectory per bucket) instead of S3
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_root: Option<PathBuf>,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            input_bucket: String::new(),
            output_bucket: String::new(),
            language_code: Self::DEFAULT_LANGUAGE_CODE.to_string(),
            force_transcribe: false,
            region: Self::DEFAULT_REGION.to_string(),
            aws_profile: None,
            subtitle_dir: None,
            store_root: None,
        }
    }
}

impl TranscribeConfig {
    pub const DEFAULT_LANGUAGE_CODE: &'static str = "hi-IN";
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save_to_path(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading transcribe config from {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing transcribe config {}", path.display()))?;
        if config.language_code.trim().is_empty() {
            config.language_code = Self::DEFAULT_LANGUAGE_CODE.to_string();
        }
        if config.region.trim().is_empty() {
            config.region = Self::DEFAULT_REGION.to_string();
        }
        Ok(config)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("creating transcribe config directory {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("serializing transcribe config")?;
        fs::write(path, toml)
            .with_context(|| format!("writing transcribe config to {}", path.display()))?;
        Ok(())
    }

    pub fn require_buckets(&self) -> Result<()> {
        if self.input_bucket.trim().is_empty() {
            bail!("input_bucket is not configured (see `subcue config path`)");
        }
        if self.output_bucket.trim().is_empty() {
            bail!("output_bucket is not configured (see `subcue config path`)");
        }
        Ok(())
    }

    pub fn subtitle_dir(&self) -> PathBuf {
        self.subtitle_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(paths::subcue_config_dir()?.join("config.toml"))
}
