use anyhow::{Context, Result, bail};
use duct::cmd;
use serde::Deserialize;

use crate::ui::prelude::{Level, emit};

use super::config::TranscribeConfig;
use super::jobs::{JobStatus, ObjectStore, StartJobRequest, TranscriptionService};

/// S3 and Amazon Transcribe access through the `aws` command line tool.
pub struct AwsCli {
    region: String,
    profile: Option<String>,
}

struct AwsOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

impl AwsCli {
    pub fn new(region: impl Into<String>, profile: Option<String>) -> Self {
        Self {
            region: region.into(),
            profile,
        }
    }

    pub fn from_config(config: &TranscribeConfig) -> Self {
        Self::new(config.region.clone(), config.aws_profile.clone())
    }

    fn run(&self, args: &[&str]) -> Result<AwsOutput> {
        let mut full_args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        full_args.extend(["--output".to_string(), "json".to_string()]);
        full_args.extend(["--region".to_string(), self.region.clone()]);
        if let Some(profile) = &self.profile {
            full_args.extend(["--profile".to_string(), profile.clone()]);
        }

        emit(
            Level::Debug,
            "transcribe.aws.command",
            &format!("aws {}", full_args.join(" ")),
            None,
        );

        let output = cmd("aws", &full_args)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
            .with_context(|| format!("Failed to run `aws {}` (is the AWS CLI installed?)", args.join(" ")))?;

        Ok(AwsOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn run_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.success {
            bail!("`aws {}` failed: {}", args.join(" "), output.stderr);
        }
        Ok(output.stdout)
    }
}

impl ObjectStore for AwsCli {
    fn list_keys(&self, bucket: &str) -> Result<Vec<String>> {
        let stdout = self.run_checked(&["s3api", "list-objects-v2", "--bucket", bucket])?;
        parse_listing(&stdout)
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let output = self.run(&["s3api", "head-object", "--bucket", bucket, "--key", key])?;
        if output.success {
            return Ok(true);
        }
        if is_missing_object(&output.stderr) {
            return Ok(false);
        }
        bail!(
            "Failed to check s3://{}/{}: {}",
            bucket,
            key,
            output.stderr
        );
    }

    fn read(&self, bucket: &str, key: &str) -> Result<String> {
        let uri = format!("s3://{bucket}/{key}");
        self.run_checked(&["s3", "cp", &uri, "-"])
    }
}

impl TranscriptionService for AwsCli {
    fn job_status(&self, job_name: &str) -> Result<JobStatus> {
        let output = self.run(&[
            "transcribe",
            "get-transcription-job",
            "--transcription-job-name",
            job_name,
        ])?;
        if output.success {
            return parse_job_status(&output.stdout);
        }
        if is_missing_job(&output.stderr) {
            return Ok(JobStatus::NotStarted);
        }
        bail!(
            "Failed to get transcription job {}: {}",
            job_name,
            output.stderr
        );
    }

    fn start_job(&self, request: &StartJobRequest) -> Result<()> {
        let media = format!("MediaFileUri={}", request.media_uri);
        let stdout = self.run_checked(&[
            "transcribe",
            "start-transcription-job",
            "--transcription-job-name",
            &request.job_name,
            "--language-code",
            &request.language_code,
            "--output-bucket-name",
            &request.output_bucket,
            "--media",
            &media,
        ])?;
        emit(
            Level::Debug,
            "transcribe.aws.job_started",
            &format!("Transcription service response: {}", stdout.trim()),
            None,
        );
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ListObjectsResponse {
    #[serde(rename = "Contents", default)]
    contents: Vec<S3Object>,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    #[serde(rename = "Key")]
    key: String,
}

#[derive(Debug, Deserialize)]
struct GetJobResponse {
    #[serde(rename = "TranscriptionJob")]
    job: TranscriptionJob,
}

#[derive(Debug, Deserialize)]
struct TranscriptionJob {
    #[serde(rename = "TranscriptionJobStatus")]
    status: String,
    #[serde(rename = "Transcript", default)]
    transcript: Option<TranscriptLocation>,
    #[serde(rename = "FailureReason", default)]
    failure_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptLocation {
    #[serde(rename = "TranscriptFileUri", default)]
    uri: Option<String>,
}

// An empty bucket produces no output at all.
fn parse_listing(stdout: &str) -> Result<Vec<String>> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    let response: ListObjectsResponse =
        serde_json::from_str(stdout).context("Failed to parse list-objects-v2 output")?;
    Ok(response.contents.into_iter().map(|obj| obj.key).collect())
}

fn parse_job_status(stdout: &str) -> Result<JobStatus> {
    let response: GetJobResponse =
        serde_json::from_str(stdout).context("Failed to parse get-transcription-job output")?;
    let job = response.job;
    let location = job.transcript.and_then(|t| t.uri);
    Ok(JobStatus::from_service(
        &job.status,
        location,
        job.failure_reason,
    ))
}

fn is_missing_object(stderr: &str) -> bool {
    stderr.contains("(404)") || stderr.contains("Not Found") || stderr.contains("NoSuchKey")
}

fn is_missing_job(stderr: &str) -> bool {
    stderr.contains("BadRequestException")
}
