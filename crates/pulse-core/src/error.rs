//! 코어 에러 타입.

use thiserror::Error;

/// 설정 로드/검증 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 소스 읽기 또는 역직렬화 실패
    #[error("설정 에러: {0}")]
    Config(#[from] config::ConfigError),

    /// 알 수 없는 표시 타임존
    #[error("잘못된 타임존: {0}")]
    InvalidTimezone(String),

    /// 잘못된 설정 값
    #[error("잘못된 설정 값: {0}")]
    InvalidValue(String),
}

/// 코어 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
