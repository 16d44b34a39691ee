use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod gemini;

use gemini::{GeminiClient, LanguageModel, DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn LanguageModel>,
}

pub fn router(state: AppState, assets_root: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(healthz))
        .route(assistant::ASSISTANT_PATH, post(api::ask_assistant))
        .fallback_service(ServeDir::new(assets_root))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let api_key = match env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            error!("GEMINI_API_KEY is not set in environment variables");
            std::process::exit(1);
        }
    };
    let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let base_url = env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let addr: SocketAddr = env::var("ASSISTANT_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
        .parse()
        .expect("invalid ASSISTANT_ADDR");
    let assets_root = env::var("ASSETS_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("crates/apps/viewer_web/assets"));

    if !assets_root.is_dir() {
        warn!("assets root {} does not exist", assets_root.display());
    }

    let gemini = GeminiClient::new(reqwest::Client::new(), &base_url, &model, api_key);
    info!(model = gemini.model(), assets = %assets_root.display(), "assistant server listening on http://{addr}");
    let state = AppState {
        model: Arc::new(gemini),
    };
    let app = router(state, &assets_root);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind ASSISTANT_ADDR");
    axum::serve(listener, app).await.expect("server error");
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use futures_util::future::BoxFuture;
    use tower::ServiceExt;

    use crate::gemini::{GenerateContentResponse, LanguageModel, ModelError};
    use crate::{router, AppState};

    struct Unused;

    impl LanguageModel for Unused {
        fn generate<'a>(
            &'a self,
            _prompt: &'a str,
            _temperature: f32,
        ) -> BoxFuture<'a, Result<GenerateContentResponse, ModelError>> {
            Box::pin(async { Err(ModelError::Http("not used".into())) })
        }
    }

    fn app() -> axum::Router {
        let assets = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../viewer_web/assets");
        router(
            AppState {
                model: Arc::new(Unused),
            },
            &assets,
        )
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let resp = app()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn serves_bundled_datasets() {
        let resp = app()
            .oneshot(Request::get("/budaya.json").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(value.get("Bali").is_some());
    }
}
