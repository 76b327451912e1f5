//! Hugging Face 추론 API 텍스트 분류기.
//!
//! `POST {base}/models/{model}`에 `{"inputs": text}`를 보내고
//! `[{label, score}]` 또는 `[[{label, score}]]` 응답을 후보 목록으로 변환합니다.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::instrument;

use super::{SentimentCandidate, SentimentClassifier};
use crate::error::{PipelineError, Result};
use crate::provider::{http_client, join_segments};

/// Hugging Face 분류기.
pub struct HuggingFaceClassifier {
    client: reqwest::Client,
    base_url: String,
    model: String,
    token: SecretString,
}

impl HuggingFaceClassifier {
    /// 새 분류기 생성.
    ///
    /// # Arguments
    /// * `base_url` - 추론 API 기본 URL
    /// * `model` - 모델 ID (예: `mrm8488/distilroberta-...`)
    /// * `token` - Bearer 토큰
    /// * `timeout` - 요청 타임아웃
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        token: &SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
            model: model.into(),
            token: SecretString::from(token.expose_secret().to_owned()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl SentimentClassifier for HuggingFaceClassifier {
    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn classify(&self, text: &str) -> Result<Vec<SentimentCandidate>> {
        // 모델 ID의 '/'는 경로 구분자로 유지
        let mut segments = vec!["models"];
        segments.extend(self.model.split('/'));
        let url = join_segments(&self.base_url, &segments)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.expose_secret())
            .json(&json!({ "inputs": text }))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        parse_candidates(body)
    }
}

/// 응답 본문을 후보 목록으로 변환.
fn parse_candidates(body: Value) -> Result<Vec<SentimentCandidate>> {
    let list = match body {
        Value::Array(mut outer) => {
            if matches!(outer.first(), Some(Value::Array(_))) {
                match outer.swap_remove(0) {
                    Value::Array(inner) => inner,
                    _ => Vec::new(),
                }
            } else {
                outer
            }
        }
        other => {
            return Err(PipelineError::MalformedResponse(format!(
                "unexpected classifier response: {}",
                other
            )))
        }
    };

    list.into_iter()
        .map(|item| serde_json::from_value(item).map_err(PipelineError::from))
        .collect()
}
