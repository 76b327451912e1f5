//! 캐시 기반 시장/뉴스 데이터 집계.
//!
//! 이 crate는 다음을 제공합니다:
//! - TTL 기반 인메모리 스냅샷 캐시
//! - CoinGecko / NewsData 업스트림 클라이언트
//! - Hugging Face 추론 API 기반 뉴스 감성 분석
//! - 캐시 확인 → 업스트림 호출 → 보강 → 저장을 조율하는 집계 파이프라인

pub mod aggregator;
pub mod cache;
pub mod clock;
pub mod display_time;
pub mod error;
pub mod provider;
pub mod sentiment;
pub mod telemetry;

pub use aggregator::{
    empty_chart, MarketAggregator, DEFAULT_CHART_DAYS, DEFAULT_ENRICHMENT_BUDGET,
};
pub use cache::{CacheEntry, SnapshotStore, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PipelineError, Result};
pub use provider::{
    CoinGeckoClient, MarketDataSource, NewsDataClient, NewsSource, RawNewsItem,
};
pub use sentiment::{
    HuggingFaceClassifier, SentimentCandidate, SentimentClassifier, SentimentEnricher,
};
