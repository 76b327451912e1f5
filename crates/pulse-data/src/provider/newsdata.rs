//! NewsData.io API 클라이언트.
//!
//! `GET /latest?apikey=...&q=...` 응답의 `results` 배열을 원본 순서대로
//! 반환합니다. 객체가 아닌 항목은 건너뜁니다.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{http_client, join_segments, NewsSource};
use crate::error::{PipelineError, Result};

/// 뉴스 원본 레코드.
///
/// NewsData는 누락 필드를 `null`로 내려주므로 모든 필드는 관대하게 파싱합니다.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawNewsItem {
    /// 헤드라인
    #[serde(default)]
    pub title: Option<String>,
    /// 게시 시각 (ISO-8601 또는 `YYYY-MM-DD HH:MM:SS`, UTC)
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    /// 국가 목록
    #[serde(default, deserialize_with = "string_list")]
    pub country: Vec<String>,
    /// 언어
    #[serde(default)]
    pub language: Option<String>,
    /// 카테고리 목록
    #[serde(default, deserialize_with = "string_list")]
    pub category: Vec<String>,
    /// 발행처 ID
    #[serde(default)]
    pub source_id: Option<String>,
}

/// 문자열 배열, 단일 문자열, null 모두 허용.
fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => vec![s],
        _ => Vec::new(),
    })
}

/// NewsData REST 클라이언트.
pub struct NewsDataClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    query: String,
}

impl NewsDataClient {
    /// 새 클라이언트 생성.
    ///
    /// # Arguments
    /// * `base_url` - REST 기본 URL (예: `https://newsdata.io/api/1`)
    /// * `api_key` - API 키
    /// * `query` - 검색어
    /// * `timeout` - 요청 타임아웃
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<&SecretString>,
        query: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
            api_key: api_key.map(|k| SecretString::from(k.expose_secret().to_owned())),
            query: query.into(),
        })
    }
}

#[async_trait]
impl NewsSource for NewsDataClient {
    #[instrument(skip(self))]
    async fn fetch_latest(&self) -> Result<Vec<RawNewsItem>> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            PipelineError::UpstreamUnavailable("news api key not configured".to_string())
        })?;

        let url = join_segments(&self.base_url, &["latest"])?;
        let response = self
            .client
            .get(url)
            .query(&[("apikey", api_key.expose_secret()), ("q", self.query.as_str())])
            .send()
            .await?
            .error_for_status()?;

        let mut body: Value = response.json().await?;
        let results = match body.get_mut("results").map(Value::take) {
            Some(Value::Array(results)) => results,
            Some(other) if other.is_object() || other.is_string() => {
                // 오류 응답은 results 자리에 메시지 객체가 옴
                return Err(PipelineError::MalformedResponse(format!(
                    "news provider returned an error payload: {}",
                    other
                )));
            }
            _ => {
                return Err(PipelineError::MalformedResponse(
                    "missing results array".to_string(),
                ))
            }
        };

        let total = results.len();
        let items: Vec<RawNewsItem> = results
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();

        debug!(total, parsed = items.len(), "뉴스 목록 수신");
        Ok(items)
    }
}
