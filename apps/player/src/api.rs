//! REST client for lessons and lesson completion.

use async_trait::async_trait;
use lesson_core::types::RawLesson;
use lesson_core::{parser, Lesson};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::adapters::{CompletionError, CompletionSink, LessonSource, SourceError};

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Not authenticated - please log in again")]
    NotAuthenticated,

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize)]
struct CompleteLessonRequest {
    xp_earned: u32,
}

/// Body returned by `POST lessons/{id}/complete/`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteLessonResponse {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// HTTP client for the lesson API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new client. `base_url` is the API root, e.g. `http://localhost:8000/api/`.
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => {
                builder.header(reqwest::header::AUTHORIZATION, format!("Token {}", token))
            }
            None => builder,
        }
    }

    /// Fetch the unvalidated lesson payload.
    pub async fn get_lesson(&self, lesson_id: i64) -> Result<RawLesson, ApiError> {
        let url = self.url(&format!("lessons/{}/", lesson_id));
        tracing::debug!("GET {}", url);

        let resp = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        check(resp)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Report a finished lesson with the experience earned.
    pub async fn complete_lesson(
        &self,
        lesson_id: i64,
        experience: u32,
    ) -> Result<CompleteLessonResponse, ApiError> {
        let url = self.url(&format!("lessons/{}/complete/", lesson_id));
        tracing::debug!("POST {} xp_earned={}", url, experience);

        let resp = self
            .authorized(self.client.post(&url))
            .json(&CompleteLessonRequest {
                xp_earned: experience,
            })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        check(resp)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// Turn non-2xx responses into errors, keeping the backend's message when it sent one.
async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::NotAuthenticated);
    }
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.error.or(body.detail))
        .unwrap_or(text);

    Err(ApiError::Backend {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl LessonSource for ApiClient {
    async fn fetch_lesson(&self, lesson_id: i64) -> Result<Lesson, SourceError> {
        let raw = self.get_lesson(lesson_id).await?;
        Ok(parser::from_raw(raw)?)
    }
}

#[async_trait]
impl CompletionSink for ApiClient {
    async fn complete(&self, lesson_id: i64, experience: u32) -> Result<(), CompletionError> {
        let response = self.complete_lesson(lesson_id, experience).await?;
        if response.status == "success" {
            Ok(())
        } else {
            Err(CompletionError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "Lesson completion failed".to_string()),
            ))
        }
    }
}
