use std::time::Duration;

use assistant::client::{AssistantTransport, TransportError, parse_answer};
use assistant::protocol::{ASSISTANT_PATH, AssistantRequest};
use assistant::retry::Sleeper;
use gloo_net::http::Request;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

/// `fetch` transport against the page's own origin.
#[derive(Debug, Clone)]
pub struct GlooTransport {
    url: String,
}

impl GlooTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for GlooTransport {
    fn default() -> Self {
        Self::new(ASSISTANT_PATH)
    }
}

impl AssistantTransport for GlooTransport {
    async fn send(&self, request: &AssistantRequest) -> Result<String, TransportError> {
        let resp = Request::post(&self.url)
            .json(request)
            .map_err(|e| TransportError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        if !resp.ok() {
            return Err(TransportError::Status(resp.status()));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        parse_answer(&body)
    }
}

/// `setTimeout`-backed delay between attempts.
#[derive(Debug, Copy, Clone, Default)]
pub struct JsSleeper;

impl Sleeper for JsSleeper {
    async fn sleep(&self, duration: Duration) {
        let ms = duration.as_millis().min(i32::MAX as u128) as i32;
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().map(|window| {
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            });
            if !matches!(scheduled, Some(Ok(_))) {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        let _ = JsFuture::from(promise).await;
    }
}
