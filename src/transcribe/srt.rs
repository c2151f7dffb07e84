use std::time::Duration;

use super::error::TranscriptError;
use super::transcript::{Token, TokenKind, parse_transcribe_json};

/// A word lasting longer than this is treated as a pause and starts a new cue.
pub const LONG_PAUSE_SECONDS: f64 = 5.0;

// Relative slack, in ulps, for decimal inputs like 3661.234 whose binary
// product lands just below the millisecond.
const MILLIS_ULPS: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl Cue {
    pub fn to_srt_block(&self) -> String {
        format!(
            "{}\n{} --> {}\n{}\n\n",
            self.index,
            format_duration(self.start),
            format_duration(self.end),
            self.text
        )
    }
}

/// Format seconds as `HH:MM:SS,mmm`, truncating to the millisecond.
///
/// Values within a few ulps below a millisecond boundary count as reaching it,
/// so `3661.234` renders as `,234`; anything further below is truncated.
pub fn format_timestamp(seconds: f64) -> Result<String, TranscriptError> {
    Ok(millis_to_srt_time(seconds_to_millis(seconds)?))
}

pub fn format_duration(duration: Duration) -> String {
    millis_to_srt_time(duration.as_millis() as u64)
}

fn seconds_to_millis(seconds: f64) -> Result<u64, TranscriptError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(TranscriptError::InvalidTime(seconds));
    }
    let millis = seconds * 1000.0;
    Ok((millis + millis * MILLIS_ULPS * f64::EPSILON).floor() as u64)
}

fn millis_to_srt_time(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let mins = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, millis)
}

/// Split a token stream into subtitle cues.
///
/// Punctuation closes the running cue and attaches to the preceding word.
/// A word longer than [`LONG_PAUSE_SECONDS`] closes the running cue and opens
/// a new one starting with that word. Words left over after the last
/// punctuation mark form a final cue.
pub fn segment(tokens: &[Token]) -> Result<Vec<Cue>, TranscriptError> {
    let first = tokens
        .first()
        .ok_or_else(|| TranscriptError::malformed("transcript contains no items"))?;
    if first.is_punctuation() {
        return Err(TranscriptError::malformed(
            "transcript starts with a punctuation token",
        ));
    }

    let mut cues = CueBuilder::default();
    let mut current_start = seconds_to_millis(first.start_seconds(0)?)?;
    let mut last_end = current_start;
    let mut buffer = String::new();

    for (position, token) in tokens.iter().enumerate() {
        let content = token.content().ok_or_else(|| {
            TranscriptError::malformed(format!("item {position} has no alternatives"))
        })?;

        match token.kind {
            TokenKind::Punctuation => {
                if buffer.ends_with(' ') {
                    buffer.pop();
                }
                buffer.push_str(content);
                cues.push(current_start, last_end, &buffer)?;
                buffer.clear();

                if let Some(next) = tokens.get(position + 1) {
                    current_start = match next.kind {
                        TokenKind::Pronunciation => {
                            seconds_to_millis(next.start_seconds(position + 1)?)?
                        }
                        TokenKind::Punctuation => last_end,
                    };
                }
            }
            TokenKind::Pronunciation => {
                let (start, end) = token.timing(position)?;
                let start_ms = seconds_to_millis(start)?;
                let end_ms = seconds_to_millis(end)?;

                if end - start > LONG_PAUSE_SECONDS {
                    if !buffer.is_empty() {
                        cues.push(current_start, last_end, buffer.trim_end())?;
                        buffer.clear();
                    }
                    current_start = start_ms;
                }

                buffer.push_str(content);
                buffer.push(' ');
                last_end = end_ms;
            }
        }
    }

    let trailing = buffer.trim_end();
    if !trailing.is_empty() {
        cues.push(current_start, last_end, trailing)?;
    }

    Ok(cues.finish())
}

#[derive(Default)]
struct CueBuilder {
    cues: Vec<Cue>,
}

impl CueBuilder {
    /// Word timings that run backwards would give a cue ending before it starts.
    fn push(&mut self, start_ms: u64, end_ms: u64, text: &str) -> Result<(), TranscriptError> {
        let index = self.cues.len() + 1;
        let start = Duration::from_millis(start_ms);
        let end = Duration::from_millis(end_ms);
        if end < start {
            return Err(TranscriptError::malformed(format!(
                "cue {index} ends ({}) before it starts ({})",
                format_duration(end),
                format_duration(start)
            )));
        }
        self.cues.push(Cue {
            index,
            start,
            end,
            text: text.to_string(),
        });
        Ok(())
    }

    fn finish(self) -> Vec<Cue> {
        self.cues
    }
}

pub fn render_srt(cues: &[Cue]) -> String {
    cues.iter().map(Cue::to_srt_block).collect()
}

/// Decode an Amazon Transcribe document and render it as SRT text.
pub fn transcript_to_srt(json_str: &str) -> Result<(String, usize), TranscriptError> {
    let tokens = parse_transcribe_json(json_str)?;
    let cues = segment(&tokens)?;
    Ok((render_srt(&cues), cues.len()))
}
