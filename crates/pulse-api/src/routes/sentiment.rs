//! 뉴스 감성 endpoint.
//!
//! - `GET /api/sentiment` - 감성 라벨이 붙은 최신 뉴스 목록

use axum::{extract::State, routing::get, Json, Router};
use pulse_core::NewsItem;
use std::sync::Arc;

use crate::state::AppState;

/// 뉴스 감성 목록 조회.
///
/// GET /api/sentiment
///
/// 뉴스 조회 실패 시 빈 배열을 반환합니다.
pub async fn get_sentiment(State(state): State<Arc<AppState>>) -> Json<Vec<NewsItem>> {
    Json(state.aggregator.get_sentiment_feed().await)
}

/// 뉴스 감성 라우터 생성.
pub fn sentiment_router() -> Router<Arc<AppState>> {
    Router::new().route("/sentiment", get(get_sentiment))
}
