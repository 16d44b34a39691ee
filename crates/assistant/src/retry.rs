use std::future::Future;
use std::time::Duration;

/// Fixed-delay retry: no backoff, no jitter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

/// Waits between attempts. Implemented with tokio natively and a JS timer in
/// the browser.
#[allow(async_fn_in_trait)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl RetryPolicy {
    /// Runs `op` until it succeeds or the attempt bound is reached.
    ///
    /// `on_attempt(attempt, max_attempts)` fires before every attempt, 1-based.
    /// The delay is applied between attempts only, never after the last one.
    pub async fn run<T, E, S, F, Fut>(
        &self,
        sleeper: &S,
        mut on_attempt: impl FnMut(u32, u32),
        mut op: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        S: Sleeper,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            on_attempt(attempt, max);
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(last_error) if attempt >= max => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error,
                    });
                }
                Err(_) => {
                    sleeper.sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{RetryExhausted, RetryPolicy, Sleeper};
    use std::cell::RefCell;
    use std::time::Duration;

    /// Records requested delays without waiting.
    #[derive(Default)]
    pub(crate) struct RecordingSleeper {
        pub(crate) slept: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.borrow_mut().push(duration);
        }
    }

    #[tokio::test]
    async fn succeeds_after_two_failures() {
        let sleeper = RecordingSleeper::default();
        let mut seen = Vec::new();
        let result = RetryPolicy::default()
            .run(
                &sleeper,
                |n, max| seen.push((n, max)),
                |attempt| async move {
                    if attempt < 3 { Err(attempt) } else { Ok("jawaban") }
                },
            )
            .await;

        assert_eq!(result, Ok("jawaban"));
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(sleeper.slept.borrow().len(), 2);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts_without_trailing_delay() {
        let sleeper = RecordingSleeper::default();
        let result: Result<(), _> = RetryPolicy::default()
            .run(&sleeper, |_, _| {}, |attempt| async move { Err(format!("gagal {attempt}")) })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last_error, "gagal 3");
        assert_eq!(
            *sleeper.slept.borrow(),
            vec![Duration::from_millis(1000), Duration::from_millis(1000)]
        );
    }

    #[tokio::test]
    async fn first_success_makes_one_attempt() {
        let sleeper = RecordingSleeper::default();
        let mut calls = 0;
        let result: Result<u8, RetryExhausted<()>> = RetryPolicy::default()
            .run(&sleeper, |_, _| calls += 1, |_| async { Ok(7) })
            .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls, 1);
        assert!(sleeper.slept.borrow().is_empty());
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            delay: Duration::ZERO,
        };
        let result: Result<(), _> = policy
            .run(&RecordingSleeper::default(), |_, _| {}, |_| async { Err(()) })
            .await;
        assert_eq!(result.unwrap_err().attempts, 1);
    }
}
