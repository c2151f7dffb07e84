//! Orchestrate Amazon Transcribe jobs for a bucket of videos and turn the
//! finished transcripts into SRT subtitles.

pub mod common;
pub mod transcribe;
pub mod ui;
