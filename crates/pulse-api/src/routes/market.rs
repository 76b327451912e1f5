//! 시세 및 차트 endpoint.
//!
//! # 엔드포인트
//!
//! - `GET /api/prices` - 고정 코인 목록 시세 (결과 봉투)
//! - `GET /api/chart/{coin}?days=N` - 코인 가격 차트

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use pulse_core::ResultEnvelope;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::state::AppState;

/// 차트 조회 쿼리.
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    /// 기간 (일). 없거나 `?days=`처럼 빈 값이면 1일로 조회합니다.
    pub days: Option<String>,
}

/// 시세 조회.
///
/// GET /api/prices
///
/// 업스트림 실패 시에도 200과 함께 `{"status":"error","data":[],"message":...}`를
/// 반환합니다.
pub async fn get_prices(State(state): State<Arc<AppState>>) -> Json<ResultEnvelope<Vec<Value>>> {
    Json(state.aggregator.get_prices().await)
}

/// 가격 차트 조회.
///
/// GET /api/chart/{coin}?days=N
///
/// 실패 시 `{"prices": []}`를 반환합니다.
pub async fn get_chart(
    State(state): State<Arc<AppState>>,
    Path(coin): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Json<Value> {
    let days = query.days.unwrap_or_default();
    Json(state.aggregator.get_chart(&coin, &days).await)
}

/// 시장 데이터 라우터 생성.
pub fn market_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/prices", get(get_prices))
        .route("/chart/{coin}", get(get_chart))
}
