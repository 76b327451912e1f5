//! 캐시 조율 집계 파이프라인.
//!
//! 요청 종류(시세, 차트, 뉴스)마다 다음 순서로 처리합니다:
//!
//! 1. 캐시 키 계산 후 조회
//! 2. 신선하면 캐시된 페이로드 반환 (업스트림 호출 없음)
//! 3. 없거나 만료되었으면 업스트림 호출
//!    - 성공: 변환 및 보강 후 저장하고 반환
//!    - 실패: 문서화된 대체값 반환, 캐시는 건드리지 않음
//!
//! 같은 키에 대한 동시 요청은 합치지 않습니다. 둘 다 업스트림을 호출할 수
//! 있으며 마지막 쓰기가 남습니다.
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! let aggregator = MarketAggregator::new(market, news, enricher, Arc::new(SnapshotStore::new()))
//!     .with_ttl(Duration::from_secs(40));
//!
//! let prices = aggregator.get_prices().await;
//! let chart = aggregator.get_chart("bitcoin", "7").await;
//! let feed = aggregator.get_sentiment_feed().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use pulse_core::{CacheKey, NewsItem, ResultEnvelope, Sentiment};
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::cache::SnapshotStore;
use crate::clock::{Clock, SystemClock};
use crate::display_time::to_display_time;
use crate::provider::{MarketDataSource, NewsSource, RawNewsItem};
use crate::sentiment::SentimentEnricher;
use crate::telemetry;

/// 기본 차트 기간 (일).
pub const DEFAULT_CHART_DAYS: &str = "1";

/// 기본 캐시 TTL.
pub const DEFAULT_TTL: Duration = Duration::from_secs(40);

/// 뉴스 갱신 한 번에 허용하는 기본 분류 시간.
pub const DEFAULT_ENRICHMENT_BUDGET: Duration = Duration::from_secs(15);

/// 목록 필드 구분자.
const LIST_SEPARATOR: &str = ", ";

/// 차트 조회 실패 시 반환하는 빈 시계열 `{"prices": []}`.
pub fn empty_chart() -> Value {
    json!({ "prices": [] })
}

/// 시세/차트/뉴스 집계기.
pub struct MarketAggregator {
    market: Arc<dyn MarketDataSource>,
    news: Arc<dyn NewsSource>,
    enricher: SentimentEnricher,
    store: Arc<SnapshotStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    enrichment_budget: Duration,
    display_tz: Tz,
}

impl MarketAggregator {
    /// 새 집계기 생성.
    ///
    /// 시스템 시계, 40초 TTL, `Asia/Jakarta` 표시 타임존을 기본으로 사용합니다.
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        news: Arc<dyn NewsSource>,
        enricher: SentimentEnricher,
        store: Arc<SnapshotStore>,
    ) -> Self {
        Self {
            market,
            news,
            enricher,
            store,
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_TTL,
            enrichment_budget: DEFAULT_ENRICHMENT_BUDGET,
            display_tz: chrono_tz::Asia::Jakarta,
        }
    }

    /// 시계 설정.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 캐시 TTL 설정.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// 뉴스 갱신 한 번의 분류 시간 예산 설정.
    pub fn with_enrichment_budget(mut self, budget: Duration) -> Self {
        self.enrichment_budget = budget;
        self
    }

    /// 게시 시각 표시 타임존 설정.
    pub fn with_display_timezone(mut self, tz: Tz) -> Self {
        self.display_tz = tz;
        self
    }

    /// 스냅샷 저장소.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// 감성 분석 활성화 여부.
    pub fn enrichment_enabled(&self) -> bool {
        self.enricher.is_enabled()
    }

    /// 캐시 TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 고정 코인 목록의 시세 묶음.
    ///
    /// 실패 시 `data: []`와 오류 메시지를 담은 실패 봉투를 반환합니다.
    #[instrument(skip(self))]
    pub async fn get_prices(&self) -> ResultEnvelope<Vec<Value>> {
        let key = CacheKey::prices();
        let now = self.clock.now();

        if let Some(cached) = self.store.prices.get_fresh(&key, now, self.ttl) {
            telemetry::record_cache_lookup("prices", true);
            debug!(count = cached.len(), "시세 캐시 적중");
            return ResultEnvelope::success(cached);
        }
        telemetry::record_cache_lookup("prices", false);

        match self.market.fetch_prices().await {
            Ok(records) => {
                self.store.prices.put(key, records.clone(), now);
                debug!(count = records.len(), "시세 캐시 저장");
                ResultEnvelope::success(records)
            }
            Err(e) => {
                warn!(error = %e, "시세 조회 실패");
                telemetry::record_upstream_failure("prices", e.kind());
                ResultEnvelope::degraded(Vec::new(), e.to_string())
            }
        }
    }

    /// 코인 하나의 가격 차트.
    ///
    /// `days`가 비어 있으면 [`DEFAULT_CHART_DAYS`]를 사용합니다.
    /// 실패 시 [`empty_chart`]를 반환합니다.
    #[instrument(skip(self))]
    pub async fn get_chart(&self, coin: &str, days: &str) -> Value {
        let days = if days.trim().is_empty() {
            DEFAULT_CHART_DAYS
        } else {
            days
        };
        let key = CacheKey::chart(coin, days);
        let now = self.clock.now();

        if let Some(cached) = self.store.charts.get_fresh(&key, now, self.ttl) {
            telemetry::record_cache_lookup("chart", true);
            debug!(key = %key, "차트 캐시 적중");
            return cached;
        }
        telemetry::record_cache_lookup("chart", false);

        match self.market.fetch_chart(coin, days).await {
            Ok(series) => {
                self.store.charts.put(key, series.clone(), now);
                series
            }
            Err(e) => {
                warn!(coin, days, error = %e, "차트 조회 실패");
                telemetry::record_upstream_failure("chart", e.kind());
                empty_chart()
            }
        }
    }

    /// 감성 분석된 최신 뉴스 목록.
    ///
    /// 제목이 빈 항목은 분석 전에 제외하고, 나머지는 원본 순서대로
    /// 하나씩 분석합니다. 분류 예산을 넘기면 남은 항목은 중립으로 채운 뒤
    /// 그대로 캐시합니다. 조회 실패 시 빈 목록을 반환합니다.
    #[instrument(skip(self))]
    pub async fn get_sentiment_feed(&self) -> Vec<NewsItem> {
        let key = CacheKey::news();
        let now = self.clock.now();

        if let Some(cached) = self.store.news.get_fresh(&key, now, self.ttl) {
            telemetry::record_cache_lookup("news", true);
            debug!(count = cached.len(), "뉴스 캐시 적중");
            return cached;
        }
        telemetry::record_cache_lookup("news", false);

        let raw_items = match self.news.fetch_latest().await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "뉴스 조회 실패");
                telemetry::record_upstream_failure("news", e.kind());
                return Vec::new();
            }
        };

        let deadline = Instant::now() + self.enrichment_budget;
        let mut over_budget = false;
        let mut feed = Vec::with_capacity(raw_items.len());
        for raw in raw_items {
            let Some(title) = raw.title.clone().filter(|t| !t.is_empty()) else {
                continue;
            };
            let sentiment = if over_budget {
                telemetry::record_sentiment_fallback();
                Sentiment::neutral()
            } else {
                match tokio::time::timeout_at(deadline, self.enricher.classify(&title)).await {
                    Ok(sentiment) => sentiment,
                    Err(_) => {
                        warn!(
                            budget_ms = self.enrichment_budget.as_millis() as u64,
                            "감성 분석 예산 초과, 남은 헤드라인은 중립 처리"
                        );
                        over_budget = true;
                        telemetry::record_sentiment_fallback();
                        Sentiment::neutral()
                    }
                }
            };
            feed.push(self.to_news_item(title, sentiment, raw));
        }

        self.store.news.put(key, feed.clone(), now);
        debug!(count = feed.len(), "뉴스 캐시 저장");
        feed
    }

    fn to_news_item(
        &self,
        title: String,
        sentiment: Sentiment,
        raw: RawNewsItem,
    ) -> NewsItem {
        NewsItem {
            text: title,
            sentiment: sentiment.label,
            confidence: sentiment.confidence,
            date: to_display_time(raw.pub_date.as_deref().unwrap_or_default(), self.display_tz),
            country: raw.country.join(LIST_SEPARATOR),
            language: raw.language.unwrap_or_default(),
            category: raw.category.join(LIST_SEPARATOR),
            publisher: raw.source_id.unwrap_or_default(),
        }
    }
}
