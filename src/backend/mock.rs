//! Mock backend for testing without a live model.
//!
//! [`MockBackend`] returns pre-configured replies in order, allowing
//! deterministic tests of the fetcher and the HTTP surface.
//!
//! # Example
//!
//! ```
//! use trivia_forge::backend::MockBackend;
//!
//! let mock = MockBackend::fixed("[]");
//! assert_eq!(mock.calls(), 0);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::ModelError;

/// One canned outcome of a [`MockBackend`] call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Succeed with this text.
    Text(String),
    /// Fail with [`ModelError::Other`] carrying this message.
    Fail(String),
}

/// A test backend that returns canned replies in order.
///
/// Cycles back to the beginning when all replies have been consumed.
#[derive(Debug)]
pub struct MockBackend {
    replies: Vec<MockReply>,
    index: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockBackend {
    /// Create a mock backend with the given canned replies.
    ///
    /// An empty list behaves like a single failing reply.
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies,
            index: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same text.
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new(vec![MockReply::Text(response.into())])
    }

    /// Create a mock that returns each text in turn.
    pub fn texts<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            responses
                .into_iter()
                .map(|r| MockReply::Text(r.into()))
                .collect(),
        )
    }

    /// Create a mock whose every call fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(vec![MockReply::Fail(message.into())])
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.index.load(Ordering::Relaxed)
    }

    /// The prompt of the most recent call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .ok()
            .and_then(|prompt| prompt.clone())
    }

    fn next_reply(&self) -> MockReply {
        let idx = self.index.fetch_add(1, Ordering::Relaxed);
        if self.replies.is_empty() {
            return MockReply::Fail("mock backend has no replies".into());
        }
        self.replies[idx % self.replies.len()].clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(
        &self,
        _client: &Client,
        _base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, ModelError> {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(request.prompt.clone());
        }
        match self.next_reply() {
            MockReply::Text(text) => Ok(LlmResponse {
                text,
                status: 200,
                metadata: Default::default(),
            }),
            MockReply::Fail(message) => Err(ModelError::Other(message)),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> LlmRequest {
        LlmRequest {
            model: "test".to_string(),
            prompt: "test prompt".to_string(),
            config: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_mock_fixed_response() {
        let mock = MockBackend::fixed("Hello!");
        let client = Client::new();
        let resp = mock.complete(&client, "http://unused", &request()).await.unwrap();
        assert_eq!(resp.text, "Hello!");
        assert_eq!(resp.status, 200);
        assert_eq!(mock.last_prompt().as_deref(), Some("test prompt"));
    }

    #[tokio::test]
    async fn test_mock_cycles_replies() {
        let mock = MockBackend::new(vec![
            MockReply::Text("first".into()),
            MockReply::Fail("quota".into()),
        ]);
        let client = Client::new();
        let r1 = mock.complete(&client, "http://unused", &request()).await;
        let r2 = mock.complete(&client, "http://unused", &request()).await;
        let r3 = mock.complete(&client, "http://unused", &request()).await;
        assert_eq!(r1.unwrap().text, "first");
        assert!(matches!(r2, Err(ModelError::Other(ref m)) if m == "quota"));
        assert_eq!(r3.unwrap().text, "first"); // cycles
        assert_eq!(mock.calls(), 3);
    }

    #[test]
    fn test_mock_empty_fails() {
        let mock = MockBackend::new(Vec::new());
        let client = Client::new();
        let result = tokio_test::block_on(mock.complete(&client, "http://unused", &request()));
        assert!(result.is_err());
    }
}
