use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    Http(String),
    Status { status: u16, body: String },
    Decode(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::Http(reason) => write!(f, "request failed: {reason}"),
            ModelError::Status { status, body } => {
                write!(f, "model responded with {status}: {body}")
            }
            ModelError::Decode(reason) => write!(f, "undecodable model response: {reason}"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Text generation backend behind the assistant endpoint.
pub trait LanguageModel: Send + Sync {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        temperature: f32,
    ) -> BoxFuture<'a, Result<GenerateContentResponse, ModelError>>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

/// The subset of a `generateContent` reply the endpoint reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// `candidates[0].content.parts[0].text`, if every step exists.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(Content {
                    parts: vec![Part {
                        text: Some(text.to_string()),
                    }],
                }),
            }],
        }
    }
}

/// Gemini REST client (`models/{model}:generateContent`).
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, base_url: &str, model: &str, api_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate_inner(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<GenerateContentResponse, ModelError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature },
        };

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<GenerateContentResponse>()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))
    }
}

impl LanguageModel for GeminiClient {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        temperature: f32,
    ) -> BoxFuture<'a, Result<GenerateContentResponse, ModelError>> {
        Box::pin(self.generate_inner(prompt, temperature))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        GeminiClient, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
        RequestContent, RequestPart, DEFAULT_BASE_URL,
    };
    use serde_json::json;

    #[test]
    fn request_body_matches_rest_shape() {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: "halo" }],
            }],
            generation_config: GenerationConfig { temperature: 0.5 },
        };
        assert_eq!(
            serde_json::to_value(&body).expect("serialize"),
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "halo" }] }],
                "generationConfig": { "temperature": 0.5 }
            })
        );
    }

    #[test]
    fn first_text_walks_the_reply() {
        let reply: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": " Tentu " }, { "text": "x" }] },
                             "finishReason": "STOP" }],
            "usageMetadata": { "totalTokenCount": 12 }
        }))
        .expect("decode");
        assert_eq!(reply.first_text(), Some(" Tentu "));

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
                .expect("decode");
        assert_eq!(blocked.first_text(), None);

        let no_text: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "content": { "parts": [{}] } }] }))
                .expect("decode");
        assert_eq!(no_text.first_text(), None);
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(
            reqwest::Client::new(),
            &format!("{DEFAULT_BASE_URL}/"),
            "gemini-2.5-flash",
            "k".into(),
        );
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
