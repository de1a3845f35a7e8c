//! Pool allocator configuration

use crate::error::{MemoryError, PoolResult};

/// Blocks per page when nothing else is specified.
pub const DEFAULT_BLOCKS_PER_PAGE: usize = 64;

/// Configuration for a block pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of blocks carved out of every page. Must be non-zero.
    pub blocks_per_page: usize,

    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill pattern byte for newly allocated blocks (for debugging)
    pub alloc_pattern: Option<u8>,
    /// Fill pattern byte for released blocks (for debugging)
    pub dealloc_pattern: Option<u8>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            blocks_per_page: DEFAULT_BLOCKS_PER_PAGE,
            track_stats: cfg!(debug_assertions),
            alloc_pattern: if cfg!(debug_assertions) {
                Some(0xBB)
            } else {
                None
            },
            dealloc_pattern: if cfg!(debug_assertions) {
                Some(0xDD)
            } else {
                None
            },
        }
    }
}

impl PoolConfig {
    /// Production configuration - optimized for performance
    #[must_use]
    pub fn production() -> Self {
        Self {
            blocks_per_page: 1024,
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - optimized for debugging
    #[must_use]
    pub fn debug() -> Self {
        Self {
            blocks_per_page: DEFAULT_BLOCKS_PER_PAGE,
            track_stats: true,
            alloc_pattern: Some(0xBB),
            dealloc_pattern: Some(0xDD),
        }
    }

    /// Performance configuration - minimal overhead
    #[must_use]
    pub fn performance() -> Self {
        Self {
            blocks_per_page: DEFAULT_BLOCKS_PER_PAGE,
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Set the page capacity
    #[must_use = "builder methods must be chained or built"]
    pub fn with_blocks_per_page(mut self, blocks_per_page: usize) -> Self {
        self.blocks_per_page = blocks_per_page;
        self
    }

    /// Enable or disable statistics tracking
    #[must_use = "builder methods must be chained or built"]
    pub fn with_stats(mut self, track_stats: bool) -> Self {
        self.track_stats = track_stats;
        self
    }

    /// Set the byte written over blocks as they are handed out
    #[must_use = "builder methods must be chained or built"]
    pub fn with_alloc_pattern(mut self, pattern: Option<u8>) -> Self {
        self.alloc_pattern = pattern;
        self
    }

    /// Set the byte written over blocks as they are released
    #[must_use = "builder methods must be chained or built"]
    pub fn with_dealloc_pattern(mut self, pattern: Option<u8>) -> Self {
        self.dealloc_pattern = pattern;
        self
    }

    /// Check the configuration before any page is allocated.
    pub fn validate(&self) -> PoolResult<()> {
        if self.blocks_per_page == 0 {
            return Err(MemoryError::invalid_configuration(
                "blocks_per_page must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for config in [
            PoolConfig::default(),
            PoolConfig::production(),
            PoolConfig::debug(),
            PoolConfig::performance(),
        ] {
            assert!(config.validate().is_ok(), "{config:?}");
        }
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = PoolConfig::default().with_blocks_per_page(0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, MemoryError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::performance()
            .with_blocks_per_page(7)
            .with_stats(true)
            .with_alloc_pattern(Some(0xAA))
            .with_dealloc_pattern(None);

        assert_eq!(config.blocks_per_page, 7);
        assert!(config.track_stats);
        assert_eq!(config.alloc_pattern, Some(0xAA));
        assert_eq!(config.dealloc_pattern, None);
    }

    #[test]
    fn test_debug_preset_fills() {
        let config = PoolConfig::debug();
        assert!(config.track_stats);
        assert_eq!(config.alloc_pattern, Some(0xBB));
        assert_eq!(config.dealloc_pattern, Some(0xDD));
    }
}
