use crate::types::RenderedRequest;

const SYSTEM_FRAMING: &str = "You are a movie review assistant. \
You will receive a review of a movie, classify whether the review is positive or negative \
and generate tags describing the review.";

const REVIEW_PLACEHOLDER: &str = "{review}";
const FORMAT_PLACEHOLDER: &str = "{format_instructions}";
const HUMAN_TEMPLATE: &str = "Review: {review}\n\nRespond in the following JSON format:\n{format_instructions}";

/// Renders the fixed system framing and human turn for one review.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    schema_description: String,
}

impl PromptBuilder {
    pub fn new(schema_description: impl Into<String>) -> Self {
        Self {
            schema_description: schema_description.into(),
        }
    }

    pub fn build(&self, item: &str) -> RenderedRequest {
        build(item, &self.schema_description)
    }
}

pub fn build(item: &str, schema_description: &str) -> RenderedRequest {
    // Substitute format instructions first so review text containing a
    // placeholder is never expanded.
    let user = HUMAN_TEMPLATE
        .replace(FORMAT_PLACEHOLDER, schema_description)
        .replacen(REVIEW_PLACEHOLDER, item, 1);

    RenderedRequest {
        system: SYSTEM_FRAMING.to_string(),
        user,
    }
}
