//! 뉴스 헤드라인 감성 분석.
//!
//! 외부 텍스트 분류기를 호출해 `(label, confidence)`로 정규화합니다.
//! 분류기가 설정되지 않았거나 호출이 실패하면 항상 `("neutral", 0.0)`을
//! 반환하며, 오류는 호출자에게 전파되지 않습니다.
//!
//! 자체 캐시는 없습니다. 결과는 뉴스 목록과 함께 파이프라인 캐시에 저장됩니다.

pub mod huggingface;

pub use huggingface::HuggingFaceClassifier;

use std::sync::Arc;

use async_trait::async_trait;
use pulse_core::{Sentiment, NEUTRAL_LABEL};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::telemetry;

/// 분류기가 반환한 후보 하나.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentimentCandidate {
    /// 분류 라벨
    #[serde(default = "default_label")]
    pub label: String,
    /// 점수
    pub score: f64,
}

impl SentimentCandidate {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

fn default_label() -> String {
    NEUTRAL_LABEL.to_string()
}

/// 텍스트 분류 기능.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// 텍스트 하나에 대한 후보 목록 반환.
    async fn classify(&self, text: &str) -> Result<Vec<SentimentCandidate>>;
}

/// 실패하지 않는 감성 분석기.
#[derive(Clone, Default)]
pub struct SentimentEnricher {
    classifier: Option<Arc<dyn SentimentClassifier>>,
}

impl std::fmt::Debug for SentimentEnricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentEnricher")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl SentimentEnricher {
    /// 분류기를 사용하는 분석기 생성.
    pub fn new(classifier: Arc<dyn SentimentClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    /// 분류기 없는 분석기. 모든 결과가 중립입니다.
    pub fn disabled() -> Self {
        Self { classifier: None }
    }

    /// 분류기 설정 여부.
    pub fn is_enabled(&self) -> bool {
        self.classifier.is_some()
    }

    /// 텍스트 감성 분류. 실패 시 중립.
    pub async fn classify(&self, text: &str) -> Sentiment {
        match self.try_classify(text).await {
            Ok(sentiment) => sentiment,
            Err(e) => {
                if self.is_enabled() {
                    warn!(error = %e, "감성 분석 실패, 중립으로 대체");
                } else {
                    debug!("감성 분석기 미설정, 중립으로 대체");
                }
                telemetry::record_sentiment_fallback();
                Sentiment::neutral()
            }
        }
    }

    async fn try_classify(&self, text: &str) -> Result<Sentiment> {
        let classifier = self.classifier.as_ref().ok_or_else(|| {
            PipelineError::EnrichmentUnavailable("classifier not configured".to_string())
        })?;

        let candidates = classifier.classify(text).await.map_err(|e| match e {
            PipelineError::EnrichmentUnavailable(_) => e,
            other => PipelineError::EnrichmentUnavailable(other.to_string()),
        })?;

        select_best(&candidates).ok_or_else(|| {
            PipelineError::EnrichmentUnavailable("no usable candidates".to_string())
        })
    }
}

/// 최고 점수 후보 선택.
///
/// 동점이면 먼저 나온 후보가 유지됩니다. 유한하지 않은 점수는 무시하고,
/// 신뢰도는 [0, 1]로 제한한 뒤 소수점 3자리로 반올림합니다.
pub fn select_best(candidates: &[SentimentCandidate]) -> Option<Sentiment> {
    let mut best: Option<&SentimentCandidate> = None;
    for candidate in candidates.iter().filter(|c| c.score.is_finite()) {
        match best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }

    best.map(|c| Sentiment {
        label: c.label.to_lowercase(),
        confidence: round3(c.score.clamp(0.0, 1.0)),
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
