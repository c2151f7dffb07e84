use anyhow::Result;
use std::path::PathBuf;

const JOB_SUFFIX: &str = "_transcript_job";

/// State of the transcription job belonging to one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    NotStarted,
    InProgress,
    Completed { location: String },
    Failed { reason: String },
    Unknown { status: String },
}

impl JobStatus {
    /// Map an Amazon Transcribe `TranscriptionJobStatus` value.
    pub fn from_service(
        status: &str,
        location: Option<String>,
        failure_reason: Option<String>,
    ) -> Self {
        match status {
            "IN_PROGRESS" | "QUEUED" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed {
                location: location.unwrap_or_default(),
            },
            "FAILED" => JobStatus::Failed {
                reason: failure_reason.unwrap_or_else(|| "no reason given".to_string()),
            },
            other => JobStatus::Unknown {
                status: other.to_string(),
            },
        }
    }

    /// Failed and unknown jobs are retried; running or finished ones are left alone.
    pub fn should_start(&self) -> bool {
        !matches!(self, JobStatus::InProgress | JobStatus::Completed { .. })
    }

    pub fn describe(&self, job_name: &str) -> String {
        match self {
            JobStatus::NotStarted => format!("Transcription job {job_name} does not exist"),
            JobStatus::InProgress => format!("Transcription job {job_name} is already in progress"),
            JobStatus::Completed { location } => format!(
                "Transcription job {job_name} has completed. Transcript is located at {location}"
            ),
            JobStatus::Failed { reason } => format!(
                "Transcription job {job_name} has failed ({reason}), it will be started again"
            ),
            JobStatus::Unknown { status } => {
                format!("Transcription job {job_name} is in unknown status {status}")
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            JobStatus::NotStarted => "not_started",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed { .. } => "completed",
            JobStatus::Failed { .. } => "failed",
            JobStatus::Unknown { .. } => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartJobRequest {
    pub job_name: String,
    pub language_code: String,
    pub output_bucket: String,
    pub media_uri: String,
}

/// Bucket-style object storage holding input videos and finished transcripts.
pub trait ObjectStore {
    fn list_keys(&self, bucket: &str) -> Result<Vec<String>>;
    fn exists(&self, bucket: &str, key: &str) -> Result<bool>;
    fn read(&self, bucket: &str, key: &str) -> Result<String>;
}

pub trait TranscriptionService {
    fn job_status(&self, job_name: &str) -> Result<JobStatus>;
    fn start_job(&self, request: &StartJobRequest) -> Result<()>;
}

/// Destination for rendered subtitle files.
pub trait SubtitleSink {
    fn write(&self, name: &str, contents: &str) -> Result<PathBuf>;
}

/// `talk.final.mp4` becomes `talk.final_transcript_job`.
pub fn job_name(video: &str) -> String {
    let stem = video
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(video);
    format!("{stem}{JOB_SUFFIX}")
}

pub fn transcript_key(video: &str) -> String {
    format!("{}.json", job_name(video))
}

pub fn subtitle_name(video: &str) -> String {
    format!("{}.srt", job_name(video))
}

pub fn media_uri(region: &str, bucket: &str, key: &str) -> String {
    format!("https://s3.{region}.amazonaws.com/{bucket}/{key}")
}
