//! 캐싱 레이어.
//!
//! - TTL 캐시: 키별 최신 스냅샷 하나만 보관하는 인메모리 저장소
//! - 스냅샷 저장소: 시세/차트/뉴스 캐시 묶음 (프로세스 시작 시 생성되어 파이프라인에 주입)

pub mod ttl;

pub use ttl::{CacheEntry, TtlCache};

use pulse_core::NewsItem;
use serde_json::Value;

/// 파이프라인이 사용하는 캐시 묶음.
///
/// 프로세스 수명 동안 유지되며 삭제 정책은 없습니다.
/// 키 공간은 고정 코인 목록 × 실제 요청된 차트 기간으로 제한됩니다.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    /// 시세 목록 (`prices` 키)
    pub prices: TtlCache<Vec<Value>>,
    /// 차트 시계열 (`{coin}_{days}` 키)
    pub charts: TtlCache<Value>,
    /// 감성 분석된 뉴스 목록 (`news` 키)
    pub news: TtlCache<Vec<NewsItem>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 전체 캐시 항목 수.
    pub fn total_entries(&self) -> usize {
        self.prices.len() + self.charts.len() + self.news.len()
    }
}
