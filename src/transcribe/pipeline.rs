use anyhow::{Context, Result};
use serde_json::json;
use std::path::PathBuf;

use crate::ui::prelude::{Level, emit};

use super::config::TranscribeConfig;
use super::jobs::{
    JobStatus, ObjectStore, StartJobRequest, SubtitleSink, TranscriptionService, job_name,
    media_uri, subtitle_name, transcript_key,
};
use super::srt::transcript_to_srt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscribeOutcome {
    AlreadyTranscribed,
    JobStarted { job_name: String },
    Skipped { job_name: String, status: JobStatus },
}

impl TranscribeOutcome {
    pub fn describe(&self) -> String {
        match self {
            TranscribeOutcome::AlreadyTranscribed => "Transcript already exists".to_string(),
            TranscribeOutcome::JobStarted { job_name } => {
                format!("Transcription job {job_name} started")
            }
            TranscribeOutcome::Skipped { job_name, status } => status.describe(job_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    TranscriptMissing,
    Written { path: PathBuf, cues: usize },
    Failed { error: String },
}

impl ConvertOutcome {
    pub fn describe(&self) -> String {
        match self {
            ConvertOutcome::TranscriptMissing => {
                "Failed to convert to SRT, transcript does not exist".to_string()
            }
            ConvertOutcome::Written { path, cues } => {
                format!("Wrote {cues} cues to {}", path.display())
            }
            ConvertOutcome::Failed { error } => format!("Failed to convert to SRT: {error}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub transcribe: TranscribeOutcome,
    pub convert: ConvertOutcome,
}

/// Drives transcription jobs and SRT conversion for the videos of one input bucket.
pub struct Pipeline<'a> {
    config: &'a TranscribeConfig,
    store: &'a dyn ObjectStore,
    service: &'a dyn TranscriptionService,
    sink: &'a dyn SubtitleSink,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a TranscribeConfig,
        store: &'a dyn ObjectStore,
        service: &'a dyn TranscriptionService,
        sink: &'a dyn SubtitleSink,
    ) -> Self {
        Self {
            config,
            store,
            service,
            sink,
        }
    }

    pub fn list_videos(&self) -> Result<Vec<String>> {
        self.store
            .list_keys(&self.config.input_bucket)
            .with_context(|| {
                format!(
                    "Failed to list video files from bucket {}",
                    self.config.input_bucket
                )
            })
    }

    pub fn transcript_exists(&self, video: &str) -> Result<bool> {
        self.store
            .exists(&self.config.output_bucket, &transcript_key(video))
    }

    pub fn job_status(&self, video: &str) -> Result<JobStatus> {
        let name = job_name(video);
        emit(
            Level::Debug,
            "transcribe.job.status_check",
            &format!("Checking the status of transcription job {name}"),
            None,
        );
        self.service
            .job_status(&name)
            .with_context(|| format!("Failed to query transcription job {name}"))
    }

    pub fn transcribe_video(&self, video: &str, force: bool) -> Result<TranscribeOutcome> {
        if !force && self.transcript_exists(video)? {
            emit(
                Level::Info,
                "transcribe.transcript.exists",
                &format!("Transcript already exists for {video}"),
                Some(json!({ "video": video })),
            );
            return Ok(TranscribeOutcome::AlreadyTranscribed);
        }

        let name = job_name(video);
        let status = self.job_status(video)?;
        emit(
            Level::Info,
            "transcribe.job.status",
            &status.describe(&name),
            Some(json!({ "video": video, "job": name, "status": status.code() })),
        );

        if !status.should_start() {
            return Ok(TranscribeOutcome::Skipped {
                job_name: name,
                status,
            });
        }

        let request = StartJobRequest {
            job_name: name.clone(),
            language_code: self.config.language_code.clone(),
            output_bucket: self.config.output_bucket.clone(),
            media_uri: media_uri(&self.config.region, &self.config.input_bucket, video),
        };
        emit(
            Level::Info,
            "transcribe.job.starting",
            &format!(
                "Starting transcription job {} for {}",
                request.job_name, request.media_uri
            ),
            None,
        );
        self.service
            .start_job(&request)
            .with_context(|| format!("Failed to start transcription job {name}"))?;

        emit(
            Level::Success,
            "transcribe.job.started",
            &format!("Transcription job {name} started"),
            Some(json!({ "video": video, "job": name })),
        );
        Ok(TranscribeOutcome::JobStarted { job_name: name })
    }

    pub fn convert_to_srt(&self, video: &str) -> Result<ConvertOutcome> {
        if !self.transcript_exists(video)? {
            emit(
                Level::Info,
                "transcribe.srt.missing",
                &format!("Transcript for {video} does not exist"),
                None,
            );
            return Ok(ConvertOutcome::TranscriptMissing);
        }

        let key = transcript_key(video);
        let document = self
            .store
            .read(&self.config.output_bucket, &key)
            .with_context(|| format!("Failed to read transcript {key}"))?;
        let (srt, cues) = transcript_to_srt(&document)
            .with_context(|| format!("Failed to convert transcript {key}"))?;
        let path = self.sink.write(&subtitle_name(video), &srt)?;

        emit(
            Level::Success,
            "transcribe.srt.written",
            &format!("Wrote {cues} cues to {}", path.display()),
            Some(json!({ "video": video, "cues": cues, "path": path })),
        );
        Ok(ConvertOutcome::Written { path, cues })
    }

    /// Transcribe and convert every video of the input bucket, in listing order.
    pub fn transcribe_all(&self, force: bool) -> Result<Vec<(String, RunReport)>> {
        let videos = self.list_videos()?;
        let mut reports = Vec::with_capacity(videos.len());

        for video in videos {
            emit(
                Level::Info,
                "transcribe.video.start",
                &format!("Processing video file {video}"),
                None,
            );
            let transcribe = self.transcribe_video(&video, force)?;
            let convert = self.convert_to_srt(&video).unwrap_or_else(|err| {
                emit(
                    Level::Warn,
                    "transcribe.srt.failed",
                    &format!("Failed to convert {video} to SRT: {err:#}"),
                    None,
                );
                ConvertOutcome::Failed {
                    error: format!("{err:#}"),
                }
            });
            reports.push((video, RunReport { transcribe, convert }));
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        objects: HashMap<(String, String), String>,
    }

    impl MemoryStore {
        fn with(mut self, bucket: &str, key: &str, contents: &str) -> Self {
            self.objects
                .insert((bucket.to_string(), key.to_string()), contents.to_string());
            self
        }
    }

    impl ObjectStore for MemoryStore {
        fn list_keys(&self, bucket: &str) -> Result<Vec<String>> {
            let mut keys: Vec<String> = self
                .objects
                .keys()
                .filter(|(b, _)| b == bucket)
                .map(|(_, k)| k.clone())
                .collect();
            keys.sort();
            Ok(keys)
        }

        fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
            Ok(self
                .objects
                .contains_key(&(bucket.to_string(), key.to_string())))
        }

        fn read(&self, bucket: &str, key: &str) -> Result<String> {
            self.objects
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such object {bucket}/{key}"))
        }
    }

    #[derive(Default)]
    struct FakeService {
        statuses: HashMap<String, JobStatus>,
        started: RefCell<Vec<StartJobRequest>>,
    }

    impl FakeService {
        fn with(mut self, job: &str, status: JobStatus) -> Self {
            self.statuses.insert(job.to_string(), status);
            self
        }
    }

    impl TranscriptionService for FakeService {
        fn job_status(&self, job_name: &str) -> Result<JobStatus> {
            Ok(self
                .statuses
                .get(job_name)
                .cloned()
                .unwrap_or(JobStatus::NotStarted))
        }

        fn start_job(&self, request: &StartJobRequest) -> Result<()> {
            self.started.borrow_mut().push(request.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemorySink {
        written: RefCell<Vec<(String, String)>>,
    }

    impl SubtitleSink for MemorySink {
        fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
            self.written
                .borrow_mut()
                .push((name.to_string(), contents.to_string()));
            Ok(PathBuf::from("/subs").join(name))
        }
    }

    const TRANSCRIPT: &str = r#"{"results": {"items": [
        {"type": "pronunciation", "start_time": "0.0", "end_time": "0.5", "alternatives": [{"content": "Hello"}]},
        {"type": "punctuation", "alternatives": [{"content": "."}]}
    ]}}"#;

    fn config() -> TranscribeConfig {
        TranscribeConfig {
            input_bucket: "in".into(),
            output_bucket: "out".into(),
            ..TranscribeConfig::default()
        }
    }

    #[test]
    fn starts_job_for_new_video() {
        let config = config();
        let store = MemoryStore::default().with("in", "intro.mp4", "");
        let service = FakeService::default();
        let sink = MemorySink::default();
        let pipeline = Pipeline::new(&config, &store, &service, &sink);

        let outcome = pipeline.transcribe_video("intro.mp4", false).unwrap();
        assert_eq!(
            outcome,
            TranscribeOutcome::JobStarted {
                job_name: "intro_transcript_job".into()
            }
        );

        let started = service.started.borrow();
        assert_eq!(
            started[0],
            StartJobRequest {
                job_name: "intro_transcript_job".into(),
                language_code: "hi-IN".into(),
                output_bucket: "out".into(),
                media_uri: "https://s3.us-east-1.amazonaws.com/in/intro.mp4".into(),
            }
        );
    }

    #[test]
    fn existing_transcript_short_circuits_unless_forced() {
        let config = config();
        let store = MemoryStore::default().with("out", "intro_transcript_job.json", TRANSCRIPT);
        let service = FakeService::default().with(
            "intro_transcript_job",
            JobStatus::Failed {
                reason: "timeout".into(),
            },
        );
        let sink = MemorySink::default();
        let pipeline = Pipeline::new(&config, &store, &service, &sink);

        assert_eq!(
            pipeline.transcribe_video("intro.mp4", false).unwrap(),
            TranscribeOutcome::AlreadyTranscribed
        );
        assert!(service.started.borrow().is_empty());

        assert!(matches!(
            pipeline.transcribe_video("intro.mp4", true).unwrap(),
            TranscribeOutcome::JobStarted { .. }
        ));
    }

    #[test]
    fn running_job_is_left_alone() {
        let config = config();
        let store = MemoryStore::default();
        let service = FakeService::default().with("intro_transcript_job", JobStatus::InProgress);
        let sink = MemorySink::default();
        let pipeline = Pipeline::new(&config, &store, &service, &sink);

        let outcome = pipeline.transcribe_video("intro.mp4", false).unwrap();
        assert_eq!(
            outcome,
            TranscribeOutcome::Skipped {
                job_name: "intro_transcript_job".into(),
                status: JobStatus::InProgress
            }
        );
        assert!(outcome.describe().contains("already in progress"));
        assert!(service.started.borrow().is_empty());
    }

    #[test]
    fn converts_existing_transcript() {
        let config = config();
        let store = MemoryStore::default().with("out", "intro_transcript_job.json", TRANSCRIPT);
        let service = FakeService::default();
        let sink = MemorySink::default();
        let pipeline = Pipeline::new(&config, &store, &service, &sink);

        let outcome = pipeline.convert_to_srt("intro.mp4").unwrap();
        assert_eq!(
            outcome,
            ConvertOutcome::Written {
                path: PathBuf::from("/subs/intro_transcript_job.srt"),
                cues: 1
            }
        );

        let written = sink.written.borrow();
        assert_eq!(written[0].0, "intro_transcript_job.srt");
        assert_eq!(written[0].1, "1\n00:00:00,000 --> 00:00:00,500\nHello.\n\n");
    }

    #[test]
    fn missing_transcript_is_reported_not_raised() {
        let config = config();
        let store = MemoryStore::default();
        let service = FakeService::default();
        let sink = MemorySink::default();
        let pipeline = Pipeline::new(&config, &store, &service, &sink);

        assert_eq!(
            pipeline.convert_to_srt("intro.mp4").unwrap(),
            ConvertOutcome::TranscriptMissing
        );
        assert!(sink.written.borrow().is_empty());
    }

    #[test]
    fn run_reports_every_video_and_survives_bad_transcripts() {
        let config = config();
        let store = MemoryStore::default()
            .with("in", "a.mp4", "")
            .with("in", "b.mp4", "")
            .with("in", "c.mp4", "")
            .with("out", "a_transcript_job.json", TRANSCRIPT)
            .with("out", "b_transcript_job.json", "{\"results\": {\"items\": []}}");
        let service = FakeService::default().with("c_transcript_job", JobStatus::InProgress);
        let sink = MemorySink::default();
        let pipeline = Pipeline::new(&config, &store, &service, &sink);

        let reports = pipeline.transcribe_all(false).unwrap();
        let videos: Vec<&str> = reports.iter().map(|(video, _)| video.as_str()).collect();
        assert_eq!(videos, vec!["a.mp4", "b.mp4", "c.mp4"]);

        assert_eq!(reports[0].1.transcribe, TranscribeOutcome::AlreadyTranscribed);
        assert!(matches!(reports[0].1.convert, ConvertOutcome::Written { cues: 1, .. }));

        assert!(matches!(
            &reports[1].1.convert,
            ConvertOutcome::Failed { error } if error.contains("no items")
        ));

        assert!(matches!(reports[2].1.transcribe, TranscribeOutcome::Skipped { .. }));
        assert_eq!(reports[2].1.convert, ConvertOutcome::TranscriptMissing);
        assert!(service.started.borrow().is_empty());
    }
}
