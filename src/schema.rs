use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::types::{ClassificationRecord, Sentiment};

pub const SENTIMENT_FIELD: &str = "sentiment";
pub const TAGS_FIELD: &str = "tags";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unexpected field `{0}`")]
    UnexpectedField(String),

    #[error("`sentiment` must be one of \"positive\" or \"negative\", got {0}")]
    InvalidSentiment(String),

    #[error("`tags` must be an array of strings, got {0}")]
    InvalidTags(&'static str),

    #[error("`tags[{index}]` must be a string, got {found}")]
    InvalidTagElement { index: usize, found: &'static str },
}

/// The closed reply shape: `{"sentiment": "positive" | "negative", "tags": [string]}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaContract;

impl SchemaContract {
    pub fn json_schema(&self) -> Value {
        let labels: Vec<&str> = Sentiment::ALL.iter().map(Sentiment::as_str).collect();
        json!({
            "type": "object",
            "properties": {
                SENTIMENT_FIELD: {
                    "type": "string",
                    "enum": labels,
                    "description": "Overall sentiment of the review"
                },
                TAGS_FIELD: {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Short free-text tags describing what the review talks about"
                }
            },
            "required": [SENTIMENT_FIELD, TAGS_FIELD],
            "additionalProperties": false
        })
    }

    /// Format instructions embedded into every prompt.
    pub fn describe(&self) -> String {
        format!(
            "The output must be a single JSON object that conforms to the JSON schema below. \
             Reply with the JSON object only, without any additional text.\n\
             ```\n{}\n```",
            self.json_schema()
        )
    }

    pub fn validate(&self, candidate: &Value) -> Result<ClassificationRecord, ValidationError> {
        let object = candidate
            .as_object()
            .ok_or_else(|| ValidationError::NotAnObject(type_name(candidate)))?;

        if let Some(extra) = object
            .keys()
            .find(|key| key.as_str() != SENTIMENT_FIELD && key.as_str() != TAGS_FIELD)
        {
            return Err(ValidationError::UnexpectedField(extra.clone()));
        }

        let sentiment = validate_sentiment(object)?;
        let tags = validate_tags(object)?;

        Ok(ClassificationRecord { sentiment, tags })
    }
}

fn validate_sentiment(object: &Map<String, Value>) -> Result<Sentiment, ValidationError> {
    let value = object
        .get(SENTIMENT_FIELD)
        .ok_or(ValidationError::MissingField(SENTIMENT_FIELD))?;

    value
        .as_str()
        .and_then(Sentiment::from_literal)
        .ok_or_else(|| ValidationError::InvalidSentiment(value.to_string()))
}

fn validate_tags(object: &Map<String, Value>) -> Result<Vec<String>, ValidationError> {
    let value = object
        .get(TAGS_FIELD)
        .ok_or(ValidationError::MissingField(TAGS_FIELD))?;

    let Value::Array(elements) = value else {
        return Err(ValidationError::InvalidTags(type_name(value)));
    };

    elements
        .iter()
        .enumerate()
        .map(|(index, element)| match element {
            Value::String(tag) => Ok(tag.clone()),
            other => Err(ValidationError::InvalidTagElement {
                index,
                found: type_name(other),
            }),
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_record() {
        let record = SchemaContract
            .validate(&json!({"sentiment": "positive", "tags": ["romance", "acting"]}))
            .unwrap();
        assert_eq!(record.sentiment, Sentiment::Positive);
        assert_eq!(record.tags, vec!["romance", "acting"]);
    }

    #[test]
    fn accepts_empty_tags() {
        let empty = SchemaContract
            .validate(&json!({"sentiment": "negative", "tags": []}))
            .unwrap();
        assert!(empty.tags.is_empty());
    }

    #[test]
    fn null_tags_violate_the_described_array_type() {
        assert_eq!(SchemaContract.json_schema()["properties"][TAGS_FIELD]["type"], "array");
        assert_eq!(
            SchemaContract
                .validate(&json!({"sentiment": "positive", "tags": null}))
                .unwrap_err(),
            ValidationError::InvalidTags("null")
        );
    }

    #[test]
    fn rejects_out_of_enumeration_sentiment() {
        let err = SchemaContract
            .validate(&json!({"sentiment": "neutral", "tags": []}))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidSentiment("\"neutral\"".into()));
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert_eq!(
            SchemaContract.validate(&json!(["positive"])).unwrap_err(),
            ValidationError::NotAnObject("array")
        );
        assert_eq!(
            SchemaContract.validate(&json!({"tags": []})).unwrap_err(),
            ValidationError::MissingField(SENTIMENT_FIELD)
        );
        assert_eq!(
            SchemaContract
                .validate(&json!({"sentiment": "positive"}))
                .unwrap_err(),
            ValidationError::MissingField(TAGS_FIELD)
        );
        assert_eq!(
            SchemaContract
                .validate(&json!({"sentiment": "positive", "tags": [], "score": 0.9}))
                .unwrap_err(),
            ValidationError::UnexpectedField("score".into())
        );
    }

    #[test]
    fn rejects_non_string_tags() {
        assert_eq!(
            SchemaContract
                .validate(&json!({"sentiment": "positive", "tags": "acting"}))
                .unwrap_err(),
            ValidationError::InvalidTags("string")
        );
        assert_eq!(
            SchemaContract
                .validate(&json!({"sentiment": "positive", "tags": ["acting", 3]}))
                .unwrap_err(),
            ValidationError::InvalidTagElement {
                index: 1,
                found: "number"
            }
        );
    }

    #[test]
    fn description_embeds_schema() {
        let description = SchemaContract.describe();
        assert!(description.contains("\"enum\":[\"positive\",\"negative\"]"));
        assert!(description.contains("\"required\":[\"sentiment\",\"tags\"]"));
    }
}
