//! 시장 데이터 집계를 위한 도메인 모델.

mod cache_key;
mod envelope;
mod news;

pub use cache_key::*;
pub use envelope::*;
pub use news::*;
