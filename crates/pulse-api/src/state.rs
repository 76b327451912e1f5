//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 `Arc`로 래핑되어 Axum의 State extractor를 통해 핸들러에 주입됩니다.

use std::sync::Arc;

use pulse_data::MarketAggregator;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 캐시 조율 집계기 (시세, 차트, 뉴스)
    pub aggregator: Arc<MarketAggregator>,

    /// 감성 분석 모델 ID (분류기 설정 시)
    pub sentiment_model: Option<String>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(aggregator: MarketAggregator) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            sentiment_model: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 감성 분석 모델 이름 설정.
    pub fn with_sentiment_model(mut self, model: impl Into<String>) -> Self {
        self.sentiment_model = Some(model.into());
        self
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }

    /// 감성 분석 분류기 설정 여부.
    pub fn has_enricher(&self) -> bool {
        self.aggregator.enrichment_enabled()
    }
}

/// 테스트용 AppState 생성.
///
/// 고정 응답을 반환하는 업스트림과 비활성화된 감성 분석기를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use pulse_data::{SentimentEnricher, SnapshotStore};

    let aggregator = MarketAggregator::new(
        Arc::new(stub::StubMarket),
        Arc::new(stub::StubNews),
        SentimentEnricher::disabled(),
        Arc::new(SnapshotStore::new()),
    );
    AppState::new(aggregator)
}

#[cfg(any(test, feature = "test-utils"))]
mod stub {
    use async_trait::async_trait;
    use pulse_data::{MarketDataSource, NewsSource, PipelineError, RawNewsItem, Result};
    use serde_json::{json, Value};

    /// 고정 시세/차트 소스. `not-a-coin`은 조회 실패.
    pub struct StubMarket;

    #[async_trait]
    impl MarketDataSource for StubMarket {
        async fn fetch_prices(&self) -> Result<Vec<Value>> {
            Ok(vec![
                json!({ "id": "bitcoin", "symbol": "btc", "current_price": 42000.0 }),
                json!({ "id": "ethereum", "symbol": "eth", "current_price": 2300.0 }),
            ])
        }

        async fn fetch_chart(&self, coin: &str, days: &str) -> Result<Value> {
            if coin == "not-a-coin" {
                return Err(PipelineError::UpstreamUnavailable(
                    "HTTP status client error (404 Not Found)".to_string(),
                ));
            }
            Ok(json!({
                "prices": [[1704067200000u64, 42000.0]],
                "coin": coin,
                "days": days,
            }))
        }
    }

    /// 고정 뉴스 소스.
    pub struct StubNews;

    #[async_trait]
    impl NewsSource for StubNews {
        async fn fetch_latest(&self) -> Result<Vec<RawNewsItem>> {
            Ok(vec![
                RawNewsItem {
                    title: Some("Bitcoin ETF sees record inflows".to_string()),
                    pub_date: Some("2024-01-01 00:00:00".to_string()),
                    country: vec!["united states of america".to_string()],
                    language: Some("english".to_string()),
                    category: vec!["business".to_string()],
                    source_id: Some("coindesk".to_string()),
                },
                RawNewsItem {
                    title: Some(String::new()),
                    ..Default::default()
                },
            ])
        }
    }
}
