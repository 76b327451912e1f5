//! 파이프라인 메트릭 헬퍼.
//!
//! 레코더가 설치되지 않은 경우(테스트 등) 모든 호출은 no-op입니다.

use metrics::counter;

/// 캐시 조회 결과 기록.
///
/// - `cache`: "prices" | "chart" | "news"
pub fn record_cache_lookup(cache: &'static str, hit: bool) {
    counter!(
        "cache_lookups_total",
        "cache" => cache,
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

/// 업스트림 실패 기록.
pub fn record_upstream_failure(source: &'static str, kind: &'static str) {
    counter!("upstream_failures_total", "source" => source, "kind" => kind).increment(1);
}

/// 감성 분석 중립 대체 기록.
pub fn record_sentiment_fallback() {
    counter!("sentiment_fallbacks_total").increment(1);
}
