//! Amazon Transcribe job orchestration and transcript-to-SRT conversion.

pub mod aws;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod jobs;
pub mod local;
pub mod pipeline;
pub mod srt;
pub mod transcript;

pub use cli::{ConfigCommands, TranscribeCommands};
pub use commands::{handle_config_command, handle_transcribe_command};
pub use error::TranscriptError;
