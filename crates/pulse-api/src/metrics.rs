//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 파이프라인 메트릭(`cache_lookups_total`,
//! `upstream_failures_total`, `sentiment_fallbacks_total`)을 `/metrics`로 노출합니다.

use metrics::{counter, describe_counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// # 패닉
///
/// 레코더가 이미 설치되어 있으면 패닉합니다.
pub fn setup_metrics_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        // HTTP 요청 지속 시간 히스토그램 버킷 설정
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )
        .expect("히스토그램 버킷 설정 실패")
        .install_recorder()
        .expect("Prometheus 레코더 설치 실패");

    describe_pipeline_metrics();
    handle
}

fn describe_pipeline_metrics() {
    describe_counter!("cache_lookups_total", "Snapshot cache lookups by cache and result");
    describe_counter!(
        "upstream_failures_total",
        "Failed upstream calls by source and error kind"
    );
    describe_counter!(
        "sentiment_fallbacks_total",
        "Headlines labelled neutral because classification was unavailable"
    );
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 경로 정규화 유틸리티
// ============================================================================

/// 경로에서 동적 파라미터를 정규화합니다.
///
/// 코인 ID는 사용자 입력이므로 라벨 카디널리티를 막기 위해 치환합니다.
///
/// 예: `/api/chart/bitcoin` → `/api/chart/:coin`
pub fn normalize_path(path: &str) -> String {
    let mut previous = "";
    let normalized: Vec<&str> = path
        .split('/')
        .map(|segment| {
            let replaced = if previous == "chart" && !segment.is_empty() {
                ":coin"
            } else {
                segment
            };
            previous = segment;
            replaced
        })
        .collect();
    normalized.join("/")
}
