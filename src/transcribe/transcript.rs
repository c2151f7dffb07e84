use serde::Deserialize;

use super::error::TranscriptError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Pronunciation,
    Punctuation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub content: String,
    pub confidence: Option<f64>,
}

/// A single transcribed unit: a spoken word with timing, or a punctuation
/// mark that carries no timing of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    /// Ranked by confidence; only the first one is ever displayed.
    pub alternatives: Vec<Alternative>,
}

impl Token {
    pub fn word(content: &str, start_time: f64, end_time: f64) -> Self {
        Self {
            kind: TokenKind::Pronunciation,
            start_time: Some(start_time),
            end_time: Some(end_time),
            alternatives: vec![Alternative {
                content: content.to_string(),
                confidence: None,
            }],
        }
    }

    pub fn punctuation(content: &str) -> Self {
        Self {
            kind: TokenKind::Punctuation,
            start_time: None,
            end_time: None,
            alternatives: vec![Alternative {
                content: content.to_string(),
                confidence: None,
            }],
        }
    }

    pub fn is_punctuation(&self) -> bool {
        self.kind == TokenKind::Punctuation
    }

    pub fn content(&self) -> Option<&str> {
        self.alternatives.first().map(|alt| alt.content.as_str())
    }

    pub(crate) fn start_seconds(&self, position: usize) -> Result<f64, TranscriptError> {
        self.start_time.ok_or_else(|| {
            TranscriptError::malformed(format!("item {position} is missing start_time"))
        })
    }

    /// Start and end of a pronunciation token, checked for presence and order.
    pub(crate) fn timing(&self, position: usize) -> Result<(f64, f64), TranscriptError> {
        let start = self.start_seconds(position)?;
        let end = self.end_time.ok_or_else(|| {
            TranscriptError::malformed(format!("item {position} is missing end_time"))
        })?;
        if end < start {
            return Err(TranscriptError::malformed(format!(
                "item {position} ends ({end}) before it starts ({start})"
            )));
        }
        Ok((start, end))
    }
}

#[derive(Debug, Deserialize)]
struct TranscribeOutput {
    results: TranscribeResults,
}

#[derive(Debug, Deserialize)]
struct TranscribeResults {
    items: Vec<TranscribeItem>,
}

#[derive(Debug, Deserialize)]
struct TranscribeItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    start_time: Option<Decimal>,
    #[serde(default)]
    end_time: Option<Decimal>,
    #[serde(default)]
    alternatives: Vec<TranscribeAlternative>,
}

#[derive(Debug, Deserialize)]
struct TranscribeAlternative {
    content: String,
    #[serde(default)]
    confidence: Option<Decimal>,
}

// Amazon Transcribe writes numbers as strings ("0.35"); accept both.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Decimal {
    Number(f64),
    Text(String),
}

impl Decimal {
    fn parse(&self, field: &str, position: usize) -> Result<f64, TranscriptError> {
        match self {
            Decimal::Number(value) => Ok(*value),
            Decimal::Text(raw) => raw.trim().parse::<f64>().map_err(|_| {
                TranscriptError::malformed(format!(
                    "item {position} has a non-numeric {field}: '{raw}'"
                ))
            }),
        }
    }
}

/// Decode the `results.items` sequence of an Amazon Transcribe output document.
pub fn parse_transcribe_json(json_str: &str) -> Result<Vec<Token>, TranscriptError> {
    let output: TranscribeOutput = serde_json::from_str(json_str)
        .map_err(|err| TranscriptError::malformed(format!("invalid transcript JSON: {err}")))?;

    output
        .results
        .items
        .into_iter()
        .enumerate()
        .map(|(position, item)| convert_item(position, item))
        .collect()
}

fn convert_item(position: usize, item: TranscribeItem) -> Result<Token, TranscriptError> {
    let kind = match item.kind.as_str() {
        "pronunciation" => TokenKind::Pronunciation,
        "punctuation" => TokenKind::Punctuation,
        other => {
            return Err(TranscriptError::malformed(format!(
                "item {position} has unknown type '{other}'"
            )));
        }
    };

    if item.alternatives.is_empty() {
        return Err(TranscriptError::malformed(format!(
            "item {position} has no alternatives"
        )));
    }

    let start_time = item
        .start_time
        .map(|value| value.parse("start_time", position))
        .transpose()?;
    let end_time = item
        .end_time
        .map(|value| value.parse("end_time", position))
        .transpose()?;

    let alternatives = item
        .alternatives
        .into_iter()
        .map(|alt| {
            let confidence = alt
                .confidence
                .map(|value| value.parse("confidence", position))
                .transpose()?;
            Ok(Alternative {
                content: alt.content,
                confidence,
            })
        })
        .collect::<Result<Vec<_>, TranscriptError>>()?;

    let token = Token {
        kind,
        start_time,
        end_time,
        alternatives,
    };

    if kind == TokenKind::Pronunciation {
        token.timing(position)?;
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_amazon_transcribe_items() {
        let json = r#"
        {
            "jobName": "talk_transcript_job",
            "accountId": "123456789012",
            "results": {
                "transcripts": [{"transcript": "Hello world."}],
                "items": [
                    {"start_time": "0.04", "end_time": "0.5", "alternatives": [{"confidence": "0.99", "content": "Hello"}], "type": "pronunciation"},
                    {"start_time": "0.5", "end_time": "0.91", "alternatives": [{"confidence": "1.0", "content": "world"}], "type": "pronunciation"},
                    {"alternatives": [{"confidence": "0.0", "content": "."}], "type": "punctuation"}
                ]
            },
            "status": "COMPLETED"
        }
        "#;

        let tokens = parse_transcribe_json(json).expect("parse transcript");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].content(), Some("Hello"));
        assert_eq!(tokens[0].start_time, Some(0.04));
        assert_eq!(tokens[1].end_time, Some(0.91));
        assert_eq!(tokens[1].alternatives[0].confidence, Some(1.0));
        assert!(tokens[2].is_punctuation());
        assert_eq!(tokens[2].start_time, None);
    }

    #[test]
    fn accepts_numeric_times() {
        let json = r#"{"results": {"items": [
            {"type": "pronunciation", "start_time": 1.5, "end_time": 2.0, "alternatives": [{"content": "hi"}]}
        ]}}"#;

        let tokens = parse_transcribe_json(json).expect("parse transcript");
        assert_eq!(tokens[0].start_time, Some(1.5));
        assert_eq!(tokens[0].alternatives[0].confidence, None);
    }

    #[test]
    fn rejects_word_without_end_time() {
        let json = r#"{"results": {"items": [
            {"type": "pronunciation", "start_time": "0.1", "alternatives": [{"content": "hi"}]}
        ]}}"#;

        let err = parse_transcribe_json(json).unwrap_err();
        assert_eq!(
            err,
            TranscriptError::Malformed("item 0 is missing end_time".to_string())
        );
    }

    #[test]
    fn rejects_word_ending_before_it_starts() {
        let json = r#"{"results": {"items": [
            {"type": "pronunciation", "start_time": "0.0", "end_time": "0.3", "alternatives": [{"content": "ok"}]},
            {"type": "pronunciation", "start_time": "2.75", "end_time": "2.5", "alternatives": [{"content": "then"}]}
        ]}}"#;

        assert_eq!(
            parse_transcribe_json(json).unwrap_err(),
            TranscriptError::Malformed("item 1 ends (2.5) before it starts (2.75)".to_string())
        );
    }

    #[test]
    fn rejects_missing_alternatives() {
        let json = r#"{"results": {"items": [
            {"type": "punctuation", "alternatives": []}
        ]}}"#;

        assert!(matches!(
            parse_transcribe_json(json),
            Err(TranscriptError::Malformed(msg)) if msg.contains("no alternatives")
        ));
    }

    #[test]
    fn rejects_unknown_type_and_bad_numbers() {
        let unknown = r#"{"results": {"items": [
            {"type": "speaker", "alternatives": [{"content": "x"}]}
        ]}}"#;
        assert!(matches!(
            parse_transcribe_json(unknown),
            Err(TranscriptError::Malformed(msg)) if msg.contains("unknown type 'speaker'")
        ));

        let bad_number = r#"{"results": {"items": [
            {"type": "pronunciation", "start_time": "soon", "end_time": "1.0", "alternatives": [{"content": "x"}]}
        ]}}"#;
        assert!(matches!(
            parse_transcribe_json(bad_number),
            Err(TranscriptError::Malformed(msg)) if msg.contains("non-numeric start_time")
        ));
    }

    #[test]
    fn rejects_document_without_items() {
        let err = parse_transcribe_json(r#"{"results": {}}"#).unwrap_err();
        assert!(matches!(err, TranscriptError::Malformed(msg) if msg.starts_with("invalid transcript JSON")));
    }
}
