//! 데이터 파이프라인 오류 타입.

use thiserror::Error;

/// 집계 파이프라인 오류.
///
/// 모든 변형은 파이프라인 경계에서 문서화된 대체값으로 변환되며
/// 호출자에게 패닉이나 장애로 전파되지 않습니다.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 네트워크 오류, 타임아웃, 2xx 외 응답
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// 예상과 다른 응답 형태
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// 감성 분류 미설정 또는 실패
    #[error("enrichment unavailable: {0}")]
    EnrichmentUnavailable(String),
}

impl PipelineError {
    /// 메트릭 라벨용 짧은 종류 이름.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UpstreamUnavailable(_) => "upstream_unavailable",
            PipelineError::MalformedResponse(_) => "malformed_response",
            PipelineError::EnrichmentUnavailable(_) => "enrichment_unavailable",
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        // 쿼리스트링에 API 키가 포함될 수 있으므로 URL 제거
        let err = err.without_url();
        if err.is_decode() {
            PipelineError::MalformedResponse(err.to_string())
        } else {
            PipelineError::UpstreamUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::MalformedResponse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
