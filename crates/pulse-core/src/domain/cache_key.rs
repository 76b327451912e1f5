//! 캐시 키.

use std::fmt;

/// 캐시 가능한 데이터 단위를 식별하는 키.
///
/// 형식:
/// - 시세 묶음: `prices`
/// - 차트: `{coin}_{days}` (예: `bitcoin_7`)
/// - 뉴스 묶음: `news`
///
/// 동등성은 정확한 문자열 비교입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// 시세 묶음 키.
    pub fn prices() -> Self {
        Self("prices".to_string())
    }

    /// 뉴스 묶음 키.
    pub fn news() -> Self {
        Self("news".to_string())
    }

    /// 코인별 차트 키.
    pub fn chart(coin: &str, days: &str) -> Self {
        Self(format!("{}_{}", coin, days))
    }

    /// 키 문자열.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
