//! 성공/실패 결과 봉투.

use serde::{Deserialize, Serialize};

/// 봉투 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    Success,
    Error,
}

/// 태그된 성공/실패 응답 래퍼.
///
/// # 불변 조건
///
/// - `status = success` ⇒ `message` 없음
/// - `status = error` ⇒ `message` 있음
///
/// 직렬화 형식:
///
/// ```json
/// { "status": "error", "data": [], "message": "upstream unavailable: ..." }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    /// 결과 상태
    pub status: EnvelopeStatus,
    /// 결과 데이터
    pub data: Option<T>,
    /// 실패 사유
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ResultEnvelope<T> {
    /// 성공 봉투.
    pub fn success(data: T) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            data: Some(data),
            message: None,
        }
    }

    /// 기본 데이터를 담은 실패 봉투.
    ///
    /// 호출자가 항상 렌더링 가능한 모양을 받도록 목록 응답에서 사용합니다
    /// (예: 시세 실패 시 `data: []`).
    pub fn degraded(fallback: T, message: impl Into<String>) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            data: Some(fallback),
            message: Some(message.into()),
        }
    }

    /// 성공 여부.
    pub fn is_success(&self) -> bool {
        self.status == EnvelopeStatus::Success
    }
}
