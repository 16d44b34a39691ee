use serde::{Deserialize, Serialize};

pub const ASSISTANT_PATH: &str = "/api/assistant";

pub const MISSING_FIELDS_ERROR: &str = "Missing city or question in request body";
pub const EMPTY_RESPONSE_ERROR: &str = "AI returned an empty response or invalid structure.";
pub const UPSTREAM_ERROR: &str = "Failed to communicate with AI assistant.";

/// Body of `POST /api/assistant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantRequest {
    pub city: String,
    pub question: String,
}

impl AssistantRequest {
    pub fn new(city: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            question: question.into(),
        }
    }

    /// Both fields present and non-blank.
    pub fn is_complete(&self) -> bool {
        !self.city.trim().is_empty() && !self.question.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantAnswer {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::{AssistantAnswer, AssistantRequest};

    #[test]
    fn request_wire_shape() {
        let req = AssistantRequest::new("Kota Denpasar", "Apa itu Kecak?");
        let value = serde_json::to_value(&req).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({ "city": "Kota Denpasar", "question": "Apa itu Kecak?" })
        );
        assert!(req.is_complete());
        assert!(!AssistantRequest::new("Bali", "   ").is_complete());
    }

    #[test]
    fn answer_ignores_extra_fields() {
        let answer: AssistantAnswer =
            serde_json::from_str(r#"{"answer":"Tentu, mari kita bahas...","model":"x"}"#)
                .expect("decode");
        assert_eq!(answer.answer, "Tentu, mari kita bahas...");
    }
}
