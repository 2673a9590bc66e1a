use serde::{Deserialize, Serialize};

/// How logical cache keys are namespaced before reaching the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKeyPrefixStrategy {
    #[default]
    NoPrefix,
    /// Prepends a fixed string, e.g. `"people:"`.
    StaticPrefix(String),
}

impl CacheKeyPrefixStrategy {
    pub fn prefix(&self) -> &str {
        match self {
            CacheKeyPrefixStrategy::NoPrefix => "",
            CacheKeyPrefixStrategy::StaticPrefix(prefix) => prefix,
        }
    }

    /// Returns the backend key for a logical key.
    ///
    /// # Examples
    ///
    /// ```
    /// use sparsedao_core::cache::CacheKeyPrefixStrategy;
    ///
    /// let strategy = CacheKeyPrefixStrategy::StaticPrefix("people:".to_string());
    /// assert_eq!(strategy.prefixed_key("42"), "people:42");
    /// assert_eq!(CacheKeyPrefixStrategy::NoPrefix.prefixed_key("42"), "42");
    /// ```
    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix(), key)
    }

    /// Recovers the logical key from a backend key carrying this prefix.
    pub fn strip<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix())
    }

    /// Key of the set that tracks every key written under this prefix.
    pub fn tracking_key(&self) -> String {
        format!("{}_keys", self.prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_prefix_is_identity() {
        let strategy = CacheKeyPrefixStrategy::NoPrefix;
        assert_eq!(strategy.prefixed_key("a"), "a");
        assert_eq!(strategy.strip("a"), Some("a"));
    }

    #[test]
    fn test_static_prefix_strip() {
        let strategy = CacheKeyPrefixStrategy::StaticPrefix("people:".to_string());
        assert_eq!(strategy.strip("people:7"), Some("7"));
        assert_eq!(strategy.strip("orders:7"), None);
    }

    #[test]
    fn test_tracking_key() {
        let strategy = CacheKeyPrefixStrategy::StaticPrefix("people:".to_string());
        assert_eq!(strategy.tracking_key(), "people:_keys");
        assert_eq!(CacheKeyPrefixStrategy::NoPrefix.tracking_key(), "_keys");
    }
}
