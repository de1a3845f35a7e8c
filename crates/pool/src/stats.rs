//! Pool allocator statistics

/// Statistics snapshot for a block pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total blocks handed out
    pub total_allocs: u64,
    /// Total blocks released
    pub total_frees: u64,
    /// Highest number of blocks in use at once
    pub peak_in_use: usize,
    /// Blocks currently in use
    pub in_use: usize,
    /// Pages currently owned
    pub pages: usize,
    /// Blocks per page
    pub blocks_per_page: usize,
    /// Size of each block
    pub block_size: usize,
    /// Currently free blocks
    pub free_blocks: usize,
}

impl PoolStats {
    /// Bytes of block storage currently in use, excluding guard bands.
    pub fn in_use_bytes(&self) -> usize {
        self.in_use * self.block_size
    }

    /// Fraction of owned blocks that are in use, `0.0` with no pages.
    pub fn utilization(&self) -> f64 {
        let capacity = self.pages * self.blocks_per_page;
        if capacity == 0 {
            0.0
        } else {
            self.in_use as f64 / capacity as f64
        }
    }
}
