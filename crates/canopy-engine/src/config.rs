//! Configuration types for the hierarchy engine.

/// Configuration for the hierarchy engine.
///
/// # Example
///
/// ```rust
/// use canopy_engine::{CacheConfig, EngineConfig};
///
/// let config = EngineConfig::builder()
///     .with_cache(CacheConfig::default())
///     .with_parallel(true)
///     .with_max_results(100_000)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Cache configuration for `items_under` results (None = caching disabled).
    pub cache: Option<CacheConfig>,
    /// Aggregate subtrees in parallel (requires the `parallel` feature).
    pub parallel: bool,
    /// Maximum number of items one `items_under` call may return (None = unlimited).
    pub max_results: Option<usize>,
}

impl EngineConfig {
    /// Creates a new builder for EngineConfig.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for EngineConfig.
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    cache: Option<CacheConfig>,
    parallel: bool,
    max_results: Option<usize>,
}

impl EngineConfigBuilder {
    /// Enables result caching with the given configuration.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Enables or disables parallel aggregation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Sets the maximum number of items per result.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Builds the EngineConfig.
    pub fn build(self) -> EngineConfig {
        EngineConfig {
            cache: self.cache,
            parallel: self.parallel,
            max_results: self.max_results,
        }
    }
}

/// Configuration for the `items_under` result cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached results.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 1_024 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default() {
        let config = EngineConfig::default();
        assert!(config.cache.is_none());
        assert!(!config.parallel);
        assert!(config.max_results.is_none());
    }

    #[test]
    fn test_engine_config_builder() {
        let config = EngineConfig::builder()
            .with_cache(CacheConfig { max_entries: 16 })
            .with_parallel(true)
            .with_max_results(500)
            .build();

        assert_eq!(config.cache, Some(CacheConfig { max_entries: 16 }));
        assert!(config.parallel);
        assert_eq!(config.max_results, Some(500));
    }

    #[test]
    fn test_cache_config_default() {
        assert_eq!(CacheConfig::default().max_entries, 1_024);
    }
}
