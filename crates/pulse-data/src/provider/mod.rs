//! 업스트림 데이터 Provider 모듈.
//!
//! ## CoinGecko
//! - `CoinGeckoClient`: 코인 시세 묶음, 코인별 가격 차트
//! - `x-cg-demo-api-key` 헤더 인증
//!
//! ## NewsData
//! - `NewsDataClient`: 검색어 기반 최신 뉴스
//! - 쿼리스트링 `apikey` 인증
//!
//! 모든 호출은 단일 시도이며 고정 타임아웃을 가집니다. 재시도는 하지 않고,
//! 실패 시 다음 요청이 캐시 만료 후 자연스럽게 다시 시도합니다.

pub mod coingecko;
pub mod newsdata;

pub use coingecko::CoinGeckoClient;
pub use newsdata::{NewsDataClient, RawNewsItem};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// 시장 데이터 소스.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 고정 코인 목록의 시세 묶음 조회.
    ///
    /// 각 레코드는 해석하지 않고 그대로 전달합니다.
    async fn fetch_prices(&self) -> Result<Vec<Value>>;

    /// 코인 하나의 가격 차트 시계열 조회.
    async fn fetch_chart(&self, coin: &str, days: &str) -> Result<Value>;
}

/// 뉴스 소스.
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// 최신 뉴스 원본 목록 조회 (원본 순서 유지).
    async fn fetch_latest(&self) -> Result<Vec<RawNewsItem>>;
}

/// 타임아웃이 설정된 HTTP 클라이언트 생성.
pub(crate) fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("market-pulse/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            crate::error::PipelineError::UpstreamUnavailable(format!(
                "HTTP client build failed: {}",
                e
            ))
        })
}

/// 기본 URL 뒤에 경로 세그먼트를 붙입니다 (세그먼트는 퍼센트 인코딩됨).
pub(crate) fn join_segments(base_url: &str, segments: &[&str]) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(base_url).map_err(|e| {
        crate::error::PipelineError::UpstreamUnavailable(format!(
            "invalid base url {}: {}",
            base_url, e
        ))
    })?;
    url.path_segments_mut()
        .map_err(|_| {
            crate::error::PipelineError::UpstreamUnavailable(format!(
                "base url cannot be a base: {}",
                base_url
            ))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
