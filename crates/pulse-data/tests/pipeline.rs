//! 집계 파이프라인 통합 테스트.
//!
//! 호출 횟수를 세는 가짜 업스트림과 수동 시계로 캐시 동작을 검증합니다.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pulse_core::{CacheKey, EnvelopeStatus};
use pulse_data::{
    ManualClock, MarketAggregator, MarketDataSource, NewsSource, PipelineError, RawNewsItem,
    Result, SentimentCandidate, SentimentClassifier, SentimentEnricher, SnapshotStore,
};
use serde_json::{json, Value};

/// 호출 횟수를 세는 시장 데이터 소스.
#[derive(Default)]
struct CountingMarket {
    price_calls: AtomicUsize,
    chart_calls: AtomicUsize,
    fail: Mutex<bool>,
    /// 시세 응답 전 대기 시간 (동시성 테스트용)
    delay: Option<Duration>,
}

impl CountingMarket {
    fn set_failing(&self, failing: bool) {
        *self.fail.lock().unwrap() = failing;
    }

    fn failing(&self) -> bool {
        *self.fail.lock().unwrap()
    }
}

#[async_trait]
impl MarketDataSource for CountingMarket {
    async fn fetch_prices(&self) -> Result<Vec<Value>> {
        let call = self.price_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            // 먼저 시작한 호출이 더 오래 걸림
            tokio::time::sleep(delay / call as u32).await;
        }
        if self.failing() {
            return Err(PipelineError::UpstreamUnavailable("HTTP status 500".into()));
        }
        Ok(vec![json!({ "id": "bitcoin", "call": call })])
    }

    async fn fetch_chart(&self, coin: &str, days: &str) -> Result<Value> {
        let call = self.chart_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failing() {
            return Err(PipelineError::MalformedResponse("not an object".into()));
        }
        Ok(json!({ "coin": coin, "days": days, "call": call, "prices": [[1, 2.0]] }))
    }
}

/// 호출 횟수를 세는 뉴스 소스.
struct CountingNews {
    calls: AtomicUsize,
    items: Mutex<Option<Vec<RawNewsItem>>>,
}

impl CountingNews {
    fn with_items(items: Vec<RawNewsItem>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            items: Mutex::new(Some(items)),
        }
    }

    /// `None`이면 업스트림 실패.
    fn set_items(&self, items: Option<Vec<RawNewsItem>>) {
        *self.items.lock().unwrap() = items;
    }
}

#[async_trait]
impl NewsSource for CountingNews {
    async fn fetch_latest(&self) -> Result<Vec<RawNewsItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.items
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| PipelineError::MalformedResponse("missing results array".into()))
    }
}

/// 받은 텍스트를 기록하는 분류기.
#[derive(Default)]
struct RecordingClassifier {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl SentimentClassifier for RecordingClassifier {
    async fn classify(&self, text: &str) -> Result<Vec<SentimentCandidate>> {
        self.seen.lock().unwrap().push(text.to_string());
        Ok(vec![
            SentimentCandidate::new("Positive", 0.6),
            SentimentCandidate::new("Negative", 0.9),
        ])
    }
}

/// 호출마다 지정된 시간만큼 지연되는 분류기.
struct SlowClassifier {
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl SentimentClassifier for SlowClassifier {
    async fn classify(&self, _text: &str) -> Result<Vec<SentimentCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(vec![SentimentCandidate::new("Positive", 0.8)])
    }
}

fn raw(title: &str) -> RawNewsItem {
    RawNewsItem {
        title: Some(title.to_string()),
        pub_date: Some("2024-01-01T00:00:00Z".to_string()),
        ..Default::default()
    }
}

struct Harness {
    market: Arc<CountingMarket>,
    news: Arc<CountingNews>,
    clock: Arc<ManualClock>,
    store: Arc<SnapshotStore>,
    aggregator: MarketAggregator,
}

fn harness_with(
    market: CountingMarket,
    news: Vec<RawNewsItem>,
    enricher: SentimentEnricher,
) -> Harness {
    let market = Arc::new(market);
    let news = Arc::new(CountingNews::with_items(news));
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let store = Arc::new(SnapshotStore::new());
    let aggregator = MarketAggregator::new(
        market.clone(),
        news.clone(),
        enricher,
        store.clone(),
    )
    .with_clock(clock.clone())
    .with_ttl(Duration::from_secs(40));

    Harness {
        market,
        news,
        clock,
        store,
        aggregator,
    }
}

fn harness() -> Harness {
    harness_with(
        CountingMarket::default(),
        vec![raw("Bitcoin tops $100k")],
        SentimentEnricher::disabled(),
    )
}

#[tokio::test]
async fn prices_within_ttl_served_from_cache() {
    let h = harness();

    let first = h.aggregator.get_prices().await;
    h.clock.advance(chrono::Duration::seconds(39));
    let second = h.aggregator.get_prices().await;

    assert_eq!(first.status, EnvelopeStatus::Success);
    assert_eq!(first, second);
    assert_eq!(h.market.price_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn prices_refetched_after_ttl() {
    let h = harness();

    h.aggregator.get_prices().await;
    let first_fetch = h.store.prices.entry(&CacheKey::prices()).unwrap().fetched_at;

    h.clock.advance(chrono::Duration::seconds(40));
    let refreshed = h.aggregator.get_prices().await;

    assert_eq!(h.market.price_calls.load(Ordering::SeqCst), 2);
    assert_eq!(refreshed.data.unwrap()[0]["call"], 2);
    let entry = h.store.prices.entry(&CacheKey::prices()).unwrap();
    assert_eq!(entry.fetched_at, first_fetch + chrono::Duration::seconds(40));
}

#[tokio::test]
async fn prices_failure_keeps_previous_entry() {
    let h = harness();

    h.aggregator.get_prices().await;
    h.clock.advance(chrono::Duration::seconds(60));
    h.market.set_failing(true);

    let degraded = h.aggregator.get_prices().await;

    assert_eq!(degraded.status, EnvelopeStatus::Error);
    assert_eq!(degraded.data, Some(vec![]));
    assert!(degraded.message.is_some());
    let entry = h.store.prices.entry(&CacheKey::prices()).unwrap();
    assert_eq!(entry.payload[0]["call"], 1);

    // 실패는 캐시되지 않으므로 다음 요청도 업스트림을 호출
    h.aggregator.get_prices().await;
    assert_eq!(h.market.price_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn chart_repeated_within_ttl_is_identical() {
    let h = harness();

    let first = h.aggregator.get_chart("bitcoin", "7").await;
    h.clock.advance(chrono::Duration::seconds(10));
    let second = h.aggregator.get_chart("bitcoin", "7").await;

    assert_eq!(first, second);
    assert_eq!(h.market.chart_calls.load(Ordering::SeqCst), 1);
    assert!(h
        .store
        .charts
        .entry(&CacheKey::chart("bitcoin", "7"))
        .is_some());
}

#[tokio::test]
async fn chart_refetched_after_ttl() {
    let h = harness();
    let key = CacheKey::chart("bitcoin", "7");

    let first = h.aggregator.get_chart("bitcoin", "7").await;
    let first_fetch = h.store.charts.entry(&key).unwrap().fetched_at;

    h.clock.advance(chrono::Duration::seconds(40));
    let refreshed = h.aggregator.get_chart("bitcoin", "7").await;

    assert_eq!(h.market.chart_calls.load(Ordering::SeqCst), 2);
    assert_eq!(first["call"], 1);
    assert_eq!(refreshed["call"], 2);
    let entry = h.store.charts.entry(&key).unwrap();
    assert_eq!(entry.fetched_at, first_fetch + chrono::Duration::seconds(40));
    assert_eq!(entry.payload, refreshed);
}

#[tokio::test]
async fn chart_keys_are_per_coin_and_days() {
    let h = harness();

    h.aggregator.get_chart("bitcoin", "7").await;
    h.aggregator.get_chart("bitcoin", "30").await;
    h.aggregator.get_chart("ethereum", "7").await;

    assert_eq!(h.market.chart_calls.load(Ordering::SeqCst), 3);
    assert_eq!(h.store.charts.len(), 3);
}

#[tokio::test]
async fn chart_failure_returns_empty_series() {
    let h = harness();
    h.market.set_failing(true);

    let chart = h.aggregator.get_chart("not-a-coin", "1").await;

    assert_eq!(chart, json!({ "prices": [] }));
    assert!(h.store.charts.is_empty());
}

#[tokio::test]
async fn news_failure_returns_empty_and_leaves_cache() {
    let h = harness();

    let feed = h.aggregator.get_sentiment_feed().await;
    assert_eq!(feed.len(), 1);

    h.clock.advance(chrono::Duration::seconds(41));
    h.news.set_items(None);

    let after_failure = h.aggregator.get_sentiment_feed().await;

    assert!(after_failure.is_empty());
    let entry = h.store.news.entry(&CacheKey::news()).unwrap();
    assert_eq!(entry.payload, feed);
    assert_eq!(h.news.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn news_without_enricher_is_neutral() {
    let h = harness_with(
        CountingMarket::default(),
        vec![raw("first"), raw("second")],
        SentimentEnricher::disabled(),
    );

    let feed = h.aggregator.get_sentiment_feed().await;

    assert_eq!(feed.len(), 2);
    for item in &feed {
        assert_eq!(item.sentiment, "neutral");
        assert_eq!(item.confidence, 0.0);
        assert_eq!(item.date, "01 Jan 2024 07:00:00");
    }
}

#[tokio::test]
async fn news_empty_titles_skip_enrichment() {
    let classifier = Arc::new(RecordingClassifier::default());
    let untitled = RawNewsItem {
        title: None,
        ..Default::default()
    };
    let h = harness_with(
        CountingMarket::default(),
        vec![raw("first"), raw(""), untitled, raw("second")],
        SentimentEnricher::new(classifier.clone()),
    );

    let feed = h.aggregator.get_sentiment_feed().await;

    let texts: Vec<_> = feed.iter().map(|item| item.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert_eq!(*classifier.seen.lock().unwrap(), vec!["first", "second"]);
    assert!(feed
        .iter()
        .all(|item| item.sentiment == "negative" && item.confidence == 0.9));
}

#[tokio::test]
async fn news_within_ttl_does_not_reenrich() {
    let classifier = Arc::new(RecordingClassifier::default());
    let h = harness_with(
        CountingMarket::default(),
        vec![raw("only")],
        SentimentEnricher::new(classifier.clone()),
    );

    h.aggregator.get_sentiment_feed().await;
    h.clock.advance(chrono::Duration::seconds(20));
    h.aggregator.get_sentiment_feed().await;

    assert_eq!(h.news.calls.load(Ordering::SeqCst), 1);
    assert_eq!(classifier.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn news_refetched_after_ttl() {
    let classifier = Arc::new(RecordingClassifier::default());
    let h = harness_with(
        CountingMarket::default(),
        vec![raw("old headline")],
        SentimentEnricher::new(classifier.clone()),
    );

    h.aggregator.get_sentiment_feed().await;
    let first_fetch = h.store.news.entry(&CacheKey::news()).unwrap().fetched_at;

    h.clock.advance(chrono::Duration::seconds(40));
    h.news.set_items(Some(vec![raw("new headline")]));
    let refreshed = h.aggregator.get_sentiment_feed().await;

    assert_eq!(h.news.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        *classifier.seen.lock().unwrap(),
        vec!["old headline", "new headline"]
    );
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].text, "new headline");
    assert_eq!(refreshed[0].sentiment, "negative");

    let entry = h.store.news.entry(&CacheKey::news()).unwrap();
    assert_eq!(entry.fetched_at, first_fetch + chrono::Duration::seconds(40));
    assert_eq!(entry.payload, refreshed);
}

#[tokio::test(start_paused = true)]
async fn news_over_budget_falls_back_to_neutral_and_caches() {
    let classifier = Arc::new(SlowClassifier {
        delay: Duration::from_secs(9),
        calls: AtomicUsize::new(0),
    });
    let titles: Vec<_> = (0..10).map(|i| raw(&format!("headline {i}"))).collect();
    let h = harness_with(
        CountingMarket::default(),
        titles,
        SentimentEnricher::new(classifier.clone()),
    );

    let started = tokio::time::Instant::now();
    let feed = h.aggregator.get_sentiment_feed().await;

    // 기본 예산 15초: 첫 항목만 분류되고 두 번째 호출은 예산 만료로 중단
    assert!(started.elapsed() <= Duration::from_secs(15));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
    assert_eq!(feed.len(), 10);
    assert_eq!(feed[0].sentiment, "positive");
    assert!(feed[1..]
        .iter()
        .all(|item| item.sentiment == "neutral" && item.confidence == 0.0));

    let entry = h.store.news.entry(&CacheKey::news()).unwrap();
    assert_eq!(entry.payload, feed);
}

#[tokio::test(start_paused = true)]
async fn concurrent_prices_on_empty_cache_last_write_wins() {
    let market = CountingMarket {
        delay: Some(Duration::from_millis(100)),
        ..Default::default()
    };
    let h = harness_with(market, vec![], SentimentEnricher::disabled());

    let (a, b) = tokio::join!(h.aggregator.get_prices(), h.aggregator.get_prices());

    assert!(a.is_success() && b.is_success());
    assert!(!a.data.unwrap().is_empty());
    assert!(!b.data.unwrap().is_empty());
    assert_eq!(h.market.price_calls.load(Ordering::SeqCst), 2);

    // 첫 호출은 100ms, 두 번째 호출은 50ms 대기하므로 첫 호출이 나중에 씀
    let entry = h.store.prices.entry(&CacheKey::prices()).unwrap();
    assert_eq!(entry.payload[0]["call"], 1);
}
