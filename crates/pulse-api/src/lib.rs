//! 마켓 펄스 HTTP API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 JSON API (시세, 차트, 뉴스 감성)
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어

pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::*;
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
