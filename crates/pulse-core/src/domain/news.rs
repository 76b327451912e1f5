//! 감성 라벨이 붙은 뉴스 아이템.

use serde::{Deserialize, Serialize};

/// 감성 분석 실패 시 사용하는 라벨.
pub const NEUTRAL_LABEL: &str = "neutral";

/// 감성 분류 결과.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// 소문자 라벨 (예: "positive", "negative", "neutral")
    pub label: String,
    /// 신뢰도 [0, 1], 소수점 3자리
    pub confidence: f64,
}

impl Sentiment {
    /// 중립 대체값 `("neutral", 0.0)`.
    pub fn neutral() -> Self {
        Self {
            label: NEUTRAL_LABEL.to_string(),
            confidence: 0.0,
        }
    }
}

impl Default for Sentiment {
    fn default() -> Self {
        Self::neutral()
    }
}

/// 감성 분석으로 보강된 뉴스 아이템.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// 헤드라인
    pub text: String,
    /// 감성 라벨
    pub sentiment: String,
    /// 감성 신뢰도
    pub confidence: f64,
    /// 표시 타임존 기준 게시 시각 (`DD Mon YYYY HH:MM:SS`)
    pub date: String,
    /// 국가 목록 (", " 구분)
    pub country: String,
    /// 언어
    pub language: String,
    /// 카테고리 목록 (", " 구분)
    pub category: String,
    /// 발행처 ID
    pub publisher: String,
}
