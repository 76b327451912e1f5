//! TTL 기반 인메모리 캐시.
//!
//! 키마다 `(조회 시각, 페이로드)` 한 쌍만 보관합니다.
//! 항목은 `Arc`로 통째로 교체되므로 동시에 읽는 쪽이 반쯤 갱신된
//! 항목을 보는 일은 없습니다. 같은 키에 대한 동시 쓰기는 마지막 쓰기가 남습니다.
//!
//! 모든 연산은 비동기 대기 없이 끝나는 짧은 임계 구역입니다.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use pulse_core::CacheKey;

/// 캐시 항목.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// 업스트림 조회 시각
    pub fetched_at: DateTime<Utc>,
    /// 저장된 페이로드
    pub payload: V,
}

impl<V> CacheEntry<V> {
    /// `now` 기준 항목 나이. 시계가 뒤로 간 경우 0.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// 신선도 판정: `now - fetched_at < ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// 키별 최신 스냅샷 캐시.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<CacheKey, Arc<CacheEntry<V>>>>,
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 항목 조회 (신선도 무관).
    pub fn entry(&self, key: &CacheKey) -> Option<Arc<CacheEntry<V>>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// 항목의 나이와 페이로드 조회.
    pub fn get(&self, key: &CacheKey, now: DateTime<Utc>) -> Option<(Duration, V)> {
        self.entry(key)
            .map(|entry| (entry.age(now), entry.payload.clone()))
    }

    /// 신선한 경우에만 페이로드 반환.
    pub fn get_fresh(&self, key: &CacheKey, now: DateTime<Utc>, ttl: Duration) -> Option<V> {
        self.entry(key)
            .filter(|entry| entry.is_fresh(now, ttl))
            .map(|entry| entry.payload.clone())
    }

    /// 항목 저장. 기존 항목은 통째로 교체됩니다.
    pub fn put(&self, key: CacheKey, payload: V, now: DateTime<Utc>) {
        let entry = Arc::new(CacheEntry {
            fetched_at: now,
            payload,
        });
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    /// 신선도 확인.
    pub fn is_fresh(&self, key: &CacheKey, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.entry(key)
            .map(|entry| entry.is_fresh(now, ttl))
            .unwrap_or(false)
    }
}

impl<V> TtlCache<V> {
    /// 저장된 키 수.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TTL: Duration = Duration::from_secs(40);

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_key() {
        let cache: TtlCache<u32> = TtlCache::new();
        let key = CacheKey::prices();
        assert!(cache.get(&key, t0()).is_none());
        assert!(!cache.is_fresh(&key, t0(), TTL));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_freshness_boundary() {
        let cache = TtlCache::new();
        let key = CacheKey::news();
        cache.put(key.clone(), "snapshot", t0());

        let just_before = t0() + chrono::Duration::milliseconds(39_999);
        let at_ttl = t0() + chrono::Duration::seconds(40);

        assert!(cache.is_fresh(&key, just_before, TTL));
        assert_eq!(cache.get_fresh(&key, just_before, TTL), Some("snapshot"));

        // now - fetched_at == ttl 이면 만료
        assert!(!cache.is_fresh(&key, at_ttl, TTL));
        assert_eq!(cache.get_fresh(&key, at_ttl, TTL), None);

        // 만료되어도 get은 나이와 함께 반환
        let (age, payload) = cache.get(&key, at_ttl).unwrap();
        assert_eq!(age, Duration::from_secs(40));
        assert_eq!(payload, "snapshot");
    }

    #[test]
    fn test_put_replaces_whole_entry() {
        let cache = TtlCache::new();
        let key = CacheKey::chart("bitcoin", "7");
        cache.put(key.clone(), vec![1, 2], t0());

        let later = t0() + chrono::Duration::seconds(60);
        cache.put(key.clone(), vec![3], later);

        let entry = cache.entry(&key).unwrap();
        assert_eq!(entry.fetched_at, later);
        assert_eq!(entry.payload, vec![3]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clock_skew_counts_as_fresh() {
        let cache = TtlCache::new();
        let key = CacheKey::prices();
        cache.put(key.clone(), 1u8, t0());

        let earlier = t0() - chrono::Duration::seconds(5);
        assert!(cache.is_fresh(&key, earlier, TTL));
    }

    #[test]
    fn test_concurrent_writers_never_tear_entries() {
        let cache: TtlCache<i64> = TtlCache::new();
        let key = CacheKey::prices();

        std::thread::scope(|scope| {
            for writer in 0..8i64 {
                let cache = &cache;
                let key = key.clone();
                scope.spawn(move || {
                    for round in 0..200i64 {
                        let offset = writer * 1_000 + round;
                        cache.put(key.clone(), offset, t0() + chrono::Duration::seconds(offset));
                    }
                });
            }
            for _ in 0..4 {
                let cache = &cache;
                let key = key.clone();
                scope.spawn(move || {
                    for _ in 0..500 {
                        if let Some(entry) = cache.entry(&key) {
                            // 페이로드와 타임스탬프는 항상 같은 쓰기에서 나온 한 쌍
                            let expected = t0() + chrono::Duration::seconds(entry.payload);
                            assert_eq!(entry.fetched_at, expected);
                        }
                    }
                });
            }
        });

        assert_eq!(cache.len(), 1);
    }
}
