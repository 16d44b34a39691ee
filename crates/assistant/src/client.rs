use tracing::{error, warn};

use crate::protocol::{AssistantAnswer, AssistantRequest};
use crate::retry::{RetryPolicy, Sleeper};

/// Spoken and shown to the user once every attempt has failed.
pub const FALLBACK_MESSAGE: &str =
    "Maaf, terjadi kesalahan saat menghubungi AI setelah beberapa kali percobaan. Coba lagi nanti.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint answered with a non-2xx status.
    Status(u16),
    Network(String),
    Decode(String),
    /// A 2xx body without an `answer` string.
    MissingAnswer,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Status(code) => write!(f, "server responded with status {code}"),
            TransportError::Network(reason) => write!(f, "network error: {reason}"),
            TransportError::Decode(reason) => write!(f, "invalid response body: {reason}"),
            TransportError::MissingAnswer => write!(f, "response has no answer"),
        }
    }
}

impl std::error::Error for TransportError {}

/// One POST of `{city, question}` to the assistant endpoint.
#[allow(async_fn_in_trait)]
pub trait AssistantTransport {
    async fn send(&self, request: &AssistantRequest) -> Result<String, TransportError>;
}

/// Decodes a successful endpoint body into the answer text.
pub fn parse_answer(body: &str) -> Result<String, TransportError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| TransportError::Decode(e.to_string()))?;
    let answer: AssistantAnswer =
        serde_json::from_value(value).map_err(|_| TransportError::MissingAnswer)?;
    Ok(answer.answer)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskFailure {
    pub attempts: u32,
    pub last_error: TransportError,
}

impl AskFailure {
    pub fn user_message(&self) -> &'static str {
        FALLBACK_MESSAGE
    }
}

impl std::fmt::Display for AskFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "all {} assistant attempts failed, last error: {}",
            self.attempts, self.last_error
        )
    }
}

impl std::error::Error for AskFailure {}

/// Asks the assistant endpoint with a bounded, fixed-delay retry.
#[derive(Debug, Clone)]
pub struct AssistantClient<T, S> {
    transport: T,
    sleeper: S,
    policy: RetryPolicy,
}

impl<T: AssistantTransport, S: Sleeper> AssistantClient<T, S> {
    pub fn new(transport: T, sleeper: S) -> Self {
        Self::with_policy(transport, sleeper, RetryPolicy::default())
    }

    pub fn with_policy(transport: T, sleeper: S, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
        }
    }

    /// `on_attempt(attempt, max_attempts)` fires before each attempt.
    pub async fn ask(
        &self,
        city: &str,
        question: &str,
        on_attempt: impl FnMut(u32, u32),
    ) -> Result<String, AskFailure> {
        let request = AssistantRequest::new(city, question);
        let request = &request;
        let max = self.policy.max_attempts.max(1);

        self.policy
            .run(&self.sleeper, on_attempt, |attempt| async move {
                let result = self.transport.send(request).await;
                if let Err(err) = &result {
                    warn!(attempt, max, "assistant attempt failed: {err}");
                }
                result
            })
            .await
            .map_err(|exhausted| {
                error!(
                    attempts = exhausted.attempts,
                    "all assistant attempts failed: {}", exhausted.last_error
                );
                AskFailure {
                    attempts: exhausted.attempts,
                    last_error: exhausted.last_error,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AssistantClient, AssistantTransport, FALLBACK_MESSAGE, TransportError, parse_answer,
    };
    use crate::protocol::AssistantRequest;
    use crate::retry::tests::RecordingSleeper;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays scripted results and records what was sent.
    #[derive(Default)]
    struct ScriptedTransport {
        script: RefCell<VecDeque<Result<String, TransportError>>>,
        sent: RefCell<Vec<AssistantRequest>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<String, TransportError>>) -> Self {
            Self {
                script: RefCell::new(script.into()),
                sent: RefCell::default(),
            }
        }
    }

    impl AssistantTransport for ScriptedTransport {
        async fn send(&self, request: &AssistantRequest) -> Result<String, TransportError> {
            self.sent.borrow_mut().push(request.clone());
            self.script
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(TransportError::Network("script exhausted".into())))
        }
    }

    #[test]
    fn parses_answer_bodies() {
        assert_eq!(parse_answer(r#"{"answer":"Halo"}"#), Ok("Halo".to_string()));
        assert_eq!(
            parse_answer(r#"{"error":"nope"}"#),
            Err(TransportError::MissingAnswer)
        );
        assert!(matches!(
            parse_answer("<html>"),
            Err(TransportError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn two_failures_then_answer() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Status(500)),
            Err(TransportError::Network("reset".into())),
            Ok("Tentu, mari kita bahas Denpasar.".into()),
        ]);
        let client = AssistantClient::new(transport, RecordingSleeper::default());
        let mut statuses = Vec::new();

        let answer = client
            .ask("Kota Denpasar", "Apa yang khas?", |n, max| {
                statuses.push(format!("{n}/{max}"))
            })
            .await
            .expect("answer");

        assert_eq!(answer, "Tentu, mari kita bahas Denpasar.");
        assert_eq!(statuses, vec!["1/3", "2/3", "3/3"]);
        let sent = client.transport.sent.borrow();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], AssistantRequest::new("Kota Denpasar", "Apa yang khas?"));
    }

    #[tokio::test]
    async fn exhaustion_yields_fallback() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Status(500)),
            Err(TransportError::Status(502)),
            Err(TransportError::Status(503)),
        ]);
        let sleeper = RecordingSleeper::default();
        let client = AssistantClient::new(transport, sleeper);

        let failure = client.ask("Bali", "Halo?", |_, _| {}).await.unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert_eq!(failure.last_error, TransportError::Status(503));
        assert_eq!(failure.user_message(), FALLBACK_MESSAGE);
        assert_eq!(client.sleeper.slept.borrow().len(), 2);
        assert_eq!(client.transport.sent.borrow().len(), 3);
    }
}
