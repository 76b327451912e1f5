//! CoinGecko API 클라이언트.
//!
//! # 엔드포인트
//!
//! - `GET /coins/markets?vs_currency=usd&ids=...` - 시세 묶음
//! - `GET /coins/{id}/market_chart?vs_currency=usd&days=N` - 가격 차트
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use pulse_data::provider::CoinGeckoClient;
//!
//! let client = CoinGeckoClient::new(
//!     "https://api.coingecko.com/api/v3",
//!     None,
//!     vec!["bitcoin".to_string()],
//!     std::time::Duration::from_secs(10),
//! )?;
//! let prices = client.fetch_prices().await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{http_client, join_segments, MarketDataSource};
use crate::error::{PipelineError, Result};

/// API 키 헤더.
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// 시세 기준 통화.
const VS_CURRENCY: &str = "usd";

/// CoinGecko REST 클라이언트.
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
    coins: Vec<String>,
}

impl CoinGeckoClient {
    /// 새 클라이언트 생성.
    ///
    /// # Arguments
    /// * `base_url` - REST 기본 URL
    /// * `api_key` - demo API 키 (없으면 헤더 생략)
    /// * `coins` - 시세 묶음 조회 대상 코인 ID
    /// * `timeout` - 요청별 타임아웃
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<&SecretString>,
        coins: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
            api_key: api_key.map(|k| SecretString::from(k.expose_secret().to_owned())),
            coins,
        })
    }

    /// 조회 대상 코인 목록.
    pub fn coins(&self) -> &[String] {
        &self.coins
    }

    async fn get_json(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Value> {
        let url = join_segments(&self.base_url, segments)?;
        let mut request = self
            .client
            .get(url)
            .query(query)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key.expose_secret());
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    #[instrument(skip(self))]
    async fn fetch_prices(&self) -> Result<Vec<Value>> {
        let ids = self.coins.join(",");
        let body = self
            .get_json(&["coins", "markets"], &[("vs_currency", VS_CURRENCY), ("ids", ids.as_str())])
            .await?;

        match body {
            Value::Array(records) => {
                debug!(count = records.len(), "시세 묶음 수신");
                Ok(records)
            }
            other => Err(PipelineError::MalformedResponse(format!(
                "expected price list, got {}",
                json_kind(&other)
            ))),
        }
    }

    #[instrument(skip(self))]
    async fn fetch_chart(&self, coin: &str, days: &str) -> Result<Value> {
        let body = self
            .get_json(
                &["coins", coin, "market_chart"],
                &[("vs_currency", VS_CURRENCY), ("days", days)],
            )
            .await?;

        if body.is_object() {
            Ok(body)
        } else {
            Err(PipelineError::MalformedResponse(format!(
                "expected chart object, got {}",
                json_kind(&body)
            )))
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
