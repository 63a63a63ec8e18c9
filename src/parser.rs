use serde_json::Value;
use thiserror::Error;

use crate::schema::{SchemaContract, ValidationError};
use crate::types::{ClassificationRecord, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The reply is not well-formed JSON.
    #[error("reply is not valid JSON: {0}")]
    Syntax(String),

    /// The reply is JSON but does not satisfy the schema.
    #[error("reply violates schema: {0}")]
    Schema(#[from] ValidationError),
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Syntax(_) => ErrorKind::SyntaxFailure,
            ParseError::Schema(_) => ErrorKind::SchemaFailure,
        }
    }

    pub fn reason(&self) -> &'static str {
        self.kind().as_str()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputParser {
    schema: SchemaContract,
}

impl OutputParser {
    pub fn new(schema: SchemaContract) -> Self {
        Self { schema }
    }

    pub fn parse(&self, reply: &str) -> Result<ClassificationRecord, ParseError> {
        let candidate: Value = serde_json::from_str(strip_code_fence(reply))
            .map_err(|e| ParseError::Syntax(e.to_string()))?;

        Ok(self.schema.validate(&candidate)?)
    }
}

/// Removes one enclosing Markdown code fence (```` ``` ```` or ```` ```json ````), if present.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening fence line.
    match inner.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with(['{', '[']) => body.trim(),
        _ => inner.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sentiment;

    #[test]
    fn parses_valid_reply() {
        let record = OutputParser::default()
            .parse(r#"{"sentiment":"positive","tags":["romance","acting"]}"#)
            .unwrap();
        assert_eq!(
            record,
            ClassificationRecord {
                sentiment: Sentiment::Positive,
                tags: vec!["romance".to_string(), "acting".to_string()],
            }
        );
    }

    #[test]
    fn out_of_enumeration_sentiment_is_schema_failure() {
        let err = OutputParser::default()
            .parse(r#"{"sentiment":"neutral","tags":[]}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaFailure);
        assert_eq!(err.reason(), "schema_failure");
    }

    #[test]
    fn plain_text_is_syntax_failure() {
        let err = OutputParser::default()
            .parse("this is not structured data")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxFailure);
    }

    #[test]
    fn accepts_fenced_json() {
        let reply = "```json\n{\"sentiment\": \"negative\", \"tags\": [\"pacing\"]}\n```";
        let record = OutputParser::default().parse(reply).unwrap();
        assert_eq!(record.sentiment, Sentiment::Negative);
        assert_eq!(record.tags, vec!["pacing"]);

        let bare = "```\n{\"sentiment\": \"positive\", \"tags\": []}\n```";
        assert!(OutputParser::default().parse(bare).is_ok());
    }

    #[test]
    fn no_partial_recovery_from_surrounding_prose() {
        let reply = "Sure! {\"sentiment\": \"positive\", \"tags\": []}";
        let err = OutputParser::default().parse(reply).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxFailure);
    }
}
