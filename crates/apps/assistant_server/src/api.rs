use assistant::prompt::{tour_guide_prompt, TEMPERATURE};
use assistant::{
    AssistantAnswer, AssistantRequest, EMPTY_RESPONSE_ERROR, MISSING_FIELDS_ERROR, UPSTREAM_ERROR,
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::AppState;

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

/// Accepts any body; anything that is not a JSON object with non-blank
/// string `city` and `question` is a missing-field error.
fn parse_request(body: &[u8]) -> Option<AssistantRequest> {
    let req: AssistantRequest = serde_json::from_slice(body).ok()?;
    req.is_complete().then_some(req)
}

pub async fn ask_assistant(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AssistantAnswer>, (StatusCode, Json<Value>)> {
    let Some(req) = parse_request(&body) else {
        return Err(api_error(StatusCode::BAD_REQUEST, MISSING_FIELDS_ERROR));
    };

    let prompt = tour_guide_prompt(&req.city, &req.question);
    let reply = state
        .model
        .generate(&prompt, TEMPERATURE)
        .await
        .map_err(|e| {
            error!(city = %req.city, "language model call failed: {e}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_ERROR)
        })?;

    let Some(answer) = reply.first_text().map(str::trim).filter(|t| !t.is_empty()) else {
        warn!(city = %req.city, "language model returned no text");
        return Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            EMPTY_RESPONSE_ERROR,
        ));
    };

    info!(city = %req.city, chars = answer.len(), "assistant answered");
    Ok(Json(AssistantAnswer {
        answer: answer.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use futures_util::future::BoxFuture;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::gemini::{GenerateContentResponse, LanguageModel, ModelError};
    use crate::{router, AppState};

    struct StubModel {
        reply: Result<GenerateContentResponse, ModelError>,
        prompts: Mutex<Vec<(String, f32)>>,
    }

    impl StubModel {
        fn new(reply: Result<GenerateContentResponse, ModelError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    impl LanguageModel for StubModel {
        fn generate<'a>(
            &'a self,
            prompt: &'a str,
            temperature: f32,
        ) -> BoxFuture<'a, Result<GenerateContentResponse, ModelError>> {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), temperature));
            let reply = self.reply.clone();
            Box::pin(async move { reply })
        }
    }

    async fn post(model: Arc<StubModel>, body: &str) -> (StatusCode, Value) {
        let app = router(AppState { model }, Path::new("assets"));
        let resp = app
            .oneshot(
                Request::post("/api/assistant")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn answers_with_trimmed_text() {
        let model = StubModel::new(Ok(GenerateContentResponse::from_text(
            "  Tentu, mari kita bahas Bandung.\n",
        )));
        let (status, body) = post(
            model.clone(),
            r#"{"city":"Kota Bandung","question":"Apa makanan khasnya?"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "answer": "Tentu, mari kita bahas Bandung." }));
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].0.contains("Kota Bandung"));
        assert_eq!(prompts[0].1, 0.5);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_the_model() {
        let model = StubModel::new(Ok(GenerateContentResponse::from_text("x")));
        for body in [
            r#"{"city":"Bali"}"#,
            r#"{"city":"","question":"Halo?"}"#,
            r#"{"city":"Bali","question":42}"#,
            "not json",
        ] {
            let (status, resp) = post(model.clone(), body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
            assert_eq!(
                resp,
                json!({ "error": "Missing city or question in request body" })
            );
        }
        assert!(model.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_or_malformed_model_reply_is_500() {
        for reply in [
            GenerateContentResponse::default(),
            GenerateContentResponse::from_text("   "),
        ] {
            let (status, body) = post(
                StubModel::new(Ok(reply)),
                r#"{"city":"Bali","question":"Halo?"}"#,
            )
            .await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                body,
                json!({ "error": "AI returned an empty response or invalid structure." })
            );
        }
    }

    #[tokio::test]
    async fn upstream_failure_is_500() {
        let model = StubModel::new(Err(ModelError::Status {
            status: 429,
            body: "quota".into(),
        }));
        let (status, body) = post(model, r#"{"city":"Bali","question":"Halo?"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "error": "Failed to communicate with AI assistant." })
        );
    }
}
