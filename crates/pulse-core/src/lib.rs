//! # Pulse Core
//!
//! 마켓 펄스 서비스의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 서비스 전반에서 사용되는 기본 타입을 제공합니다:
//! - 결과 봉투(`ResultEnvelope`) 및 뉴스 아이템 구조체
//! - 캐시 키 정의
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
