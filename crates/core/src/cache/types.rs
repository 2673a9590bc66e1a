use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// When a cached value stops being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Relative to the time of the put.
    After(Duration),
    /// At an absolute instant.
    At(DateTime<Utc>),
}

impl Expiry {
    /// Remaining lifetime as seen from `now`; zero when already past.
    pub fn ttl_from(&self, now: DateTime<Utc>) -> Duration {
        match self {
            Expiry::After(ttl) => *ttl,
            Expiry::At(deadline) => (*deadline - now).to_std().unwrap_or(Duration::ZERO),
        }
    }

    /// Absolute deadline as seen from `now`.
    pub fn deadline_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Expiry::After(ttl) => chrono::Duration::from_std(*ttl)
                .ok()
                .and_then(|ttl| now.checked_add_signed(ttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Expiry::At(deadline) => *deadline,
        }
    }
}

/// Point-in-time counters of a cache backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, `0.0` before any lookup.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_relative_expiry() {
        let expiry = Expiry::After(Duration::from_secs(60));
        assert_eq!(expiry.ttl_from(now()), Duration::from_secs(60));
        assert_eq!(
            expiry.deadline_from(now()),
            Utc.with_ymd_and_hms(2024, 6, 15, 10, 31, 0).unwrap()
        );
    }

    #[test]
    fn test_absolute_expiry() {
        let deadline = Utc.with_ymd_and_hms(2024, 6, 15, 10, 32, 0).unwrap();
        let expiry = Expiry::At(deadline);

        assert_eq!(expiry.ttl_from(now()), Duration::from_secs(120));
        assert_eq!(expiry.deadline_from(now()), deadline);
    }

    #[test]
    fn test_past_deadline_has_zero_ttl() {
        let expiry = Expiry::At(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(expiry.ttl_from(now()), Duration::ZERO);
    }

    #[test]
    fn test_hit_ratio() {
        assert_eq!(CacheStats::default().hit_ratio(), 0.0);

        let stats = CacheStats {
            hits: 3,
            misses: 1,
            ..CacheStats::default()
        };
        assert_eq!(stats.hit_ratio(), 0.75);
    }
}
