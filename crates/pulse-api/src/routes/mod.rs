//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/prices` - 코인 시세
//! - `/api/chart/{coin}` - 코인 가격 차트
//! - `/api/sentiment` - 뉴스 감성

pub mod health;
pub mod market;
pub mod sentiment;

pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use market::{market_router, ChartQuery};
pub use sentiment::sentiment_router;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api", market_router().merge(sentiment_router()))
}
