use clap::{Args, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum TranscribeCommands {
    /// List the video files in the input bucket
    List,
    /// Show the transcription job status of a video
    Status(VideoArgs),
    /// Start a transcription job for a video unless one is running or done
    Transcribe(TranscribeArgs),
    /// Convert the finished transcript of a video into SRT subtitles
    Convert(VideoArgs),
    /// Transcribe and convert every video in the input bucket
    Run(RunArgs),
    /// Convert a local Amazon Transcribe JSON file into SRT subtitles
    Srt(SrtArgs),
}

#[derive(Args, Debug, Clone)]
pub struct VideoArgs {
    /// Key of the video in the input bucket
    pub video: String,
}

#[derive(Args, Debug, Clone)]
pub struct TranscribeArgs {
    /// Key of the video in the input bucket
    pub video: String,

    /// Start a job even if a transcript already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Start jobs even for videos that already have a transcript
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SrtArgs {
    /// Amazon Transcribe output document
    #[arg(value_hint = ValueHint::FilePath)]
    pub transcript: PathBuf,

    /// Optional output path; defaults to the transcript path with an .srt extension
    #[arg(short = 'o', long = "out-file", value_hint = ValueHint::FilePath)]
    pub out_file: Option<PathBuf>,

    /// Overwrite an existing subtitle file
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the active configuration
    Show,
    /// Print the configuration file location
    Path,
    /// Write a configuration file with default values
    Init {
        /// Replace an existing configuration file
        #[arg(long)]
        force: bool,
    },
}
