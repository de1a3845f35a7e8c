//! Main block pool implementation
//!
//! # Safety
//!
//! This module implements a single-owner pool allocator for one element type:
//! - Pages are raw allocations owned by a `Vec<Page>`; they are only ever
//!   released all together (`clear` / `Drop`)
//! - Free blocks store the next link in their first word (intrusive list)
//! - Growth happens only when the free list is empty, one page at a time
//!
//! ## Invariants
//!
//! - Every block is aligned to `block_align` and sits on the page grid
//!   `first_block_offset + k * stride`, `k < blocks_per_page`
//! - A block is either in use (absent from the free list) or free (on the
//!   free list exactly once)
//! - `free.len()` equals the number of blocks reachable from the free list
//! - Fill patterns cover `data_size` bytes only; the padding up to
//!   `block_size` belongs to the layout (guard signature on guarded pages)
//! - A failed growth leaves pages and free list untouched

use core::fmt;
use core::marker::PhantomData;
use core::ptr;

#[cfg(feature = "logging")]
use tracing::{debug, trace};

use crate::block::Block;
use crate::config::PoolConfig;
use crate::error::{MemoryError, PoolResult};
use crate::free_list::FreeList;
use crate::geometry::PageGeometry;
use crate::layout::{DefaultLayout, PageLayout};
use crate::page::Page;
use crate::stats::PoolStats;

/// Fixed-size block pool for values of type `T`
///
/// Memory is requested from the system allocator a page at a time; each page
/// holds `blocks_per_page` blocks. Released blocks go back on a LIFO free
/// list, so the most recently freed block is the next one handed out.
///
/// `L` selects the page layout: [`Unchecked`](crate::Unchecked) for a bare
/// O(1) pool, [`Guarded`](crate::Guarded) for guard bands and release-time
/// validation.
///
/// # Memory Layout
/// ```text
/// pages:  [page 2] [page 1] [page 0]
/// free:   head → [p2 b4] → [p2 b3] → [p0 b1] → null
/// ```
///
/// The pool is not `Sync`. Share it between threads only behind an external
/// lock around every call.
pub struct BlockPool<T, L: PageLayout = DefaultLayout> {
    geometry: PageGeometry,
    pages: Vec<Page>,
    free: FreeList,
    config: PoolConfig,

    // Statistics (only tracked if enabled)
    total_allocs: u64,
    total_frees: u64,
    peak_in_use: usize,

    _marker: PhantomData<(fn() -> T, L)>,
}

impl<T, L: PageLayout> BlockPool<T, L> {
    /// Creates a new pool with custom configuration and allocates its first page.
    ///
    /// # Errors
    /// - [`MemoryError::InvalidConfiguration`] if `blocks_per_page` is zero or
    ///   the page size is not representable; no page is allocated
    /// - [`MemoryError::OutOfMemory`] if the first page cannot be allocated
    pub fn with_config(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        let geometry = PageGeometry::for_type::<T, L>(config.blocks_per_page)?;

        let mut pool = Self {
            geometry,
            pages: Vec::new(),
            free: FreeList::new(),
            config,
            total_allocs: 0,
            total_frees: 0,
            peak_in_use: 0,
            _marker: PhantomData,
        };
        pool.grow()?;

        #[cfg(feature = "logging")]
        debug!(
            layout = L::NAME,
            element = core::any::type_name::<T>(),
            block_size = pool.geometry.block_size(),
            blocks_per_page = pool.geometry.blocks_per_page(),
            "created block pool"
        );

        Ok(pool)
    }

    /// Creates a new pool with `blocks_per_page` blocks per page and default
    /// configuration otherwise.
    pub fn new(blocks_per_page: usize) -> PoolResult<Self> {
        Self::with_config(PoolConfig::default().with_blocks_per_page(blocks_per_page))
    }

    /// Creates a pool with production config - optimized for performance
    pub fn production(blocks_per_page: usize) -> PoolResult<Self> {
        Self::with_config(PoolConfig::production().with_blocks_per_page(blocks_per_page))
    }

    /// Creates a pool with debug config - optimized for debugging
    pub fn debug(blocks_per_page: usize) -> PoolResult<Self> {
        Self::with_config(PoolConfig::debug().with_blocks_per_page(blocks_per_page))
    }

    /// Creates a pool with performance config - minimal overhead
    pub fn performance(blocks_per_page: usize) -> PoolResult<Self> {
        Self::with_config(PoolConfig::performance().with_blocks_per_page(blocks_per_page))
    }

    /// Creates a tiny pool (16 blocks per page) - for testing or minimal use
    pub fn tiny() -> PoolResult<Self> {
        Self::new(16)
    }

    /// Creates a small pool (64 blocks per page) - for common use
    pub fn small() -> PoolResult<Self> {
        Self::new(64)
    }

    /// Creates a medium pool (256 blocks per page) - for standard applications
    pub fn medium() -> PoolResult<Self> {
        Self::new(256)
    }

    /// Creates a large pool (1024 blocks per page) - for heavy workloads
    pub fn large() -> PoolResult<Self> {
        Self::new(1024)
    }

    /// Hand out a free block, growing by one page if none is left.
    ///
    /// The block's contents are unspecified (or `alloc_pattern`, if set).
    ///
    /// # Errors
    /// [`MemoryError::OutOfMemory`] if a new page was needed and the system
    /// allocator could not supply it. The pool is unchanged in that case.
    pub fn allocate_block(&mut self) -> PoolResult<Block<T>> {
        if self.free.is_empty() {
            self.grow()?;
        }

        // SAFETY: every node on the free list was pushed by grow() or
        // free_block() and is a block of one of our pages.
        let block = unsafe { self.free.pop() }.ok_or_else(|| {
            MemoryError::out_of_memory_with_layout(self.geometry.page_layout())
        })?;

        if let Some(pattern) = self.config.alloc_pattern {
            // SAFETY: block starts data_size bytes inside a page, now
            // exclusively ours until returned to the caller.
            unsafe { ptr::write_bytes(block.as_ptr(), pattern, self.geometry.data_size()) };
        }

        if self.config.track_stats {
            self.total_allocs += 1;
            self.peak_in_use = self.peak_in_use.max(self.in_use_blocks());
        }

        Ok(Block::from_block_ptr(block))
    }

    /// Return a block to the pool. `None` is accepted and ignored.
    ///
    /// With the [`Guarded`](crate::Guarded) layout the release is validated
    /// first (location, then corruption, then double free); a failed check
    /// leaves the free list untouched.
    ///
    /// # Errors
    /// [`MemoryError::InvalidAddress`], [`MemoryError::CorruptedMemory`] or
    /// [`MemoryError::DoubleFree`], guarded layout only.
    ///
    /// # Safety
    ///
    /// - Unchecked layout: `block` must have come from `allocate_block` on
    ///   this pool and must not have been freed since
    /// - Both layouts: no free block may have been written to since it was
    ///   freed (the free list is read through them), and the caller must not
    ///   touch `block` again after a successful release
    pub unsafe fn free_block(&mut self, block: Option<Block<T>>) -> PoolResult<()> {
        let Some(block) = block else {
            return Ok(());
        };

        let free = &self.free;
        let target = L::resolve_release(
            &self.pages,
            &self.geometry,
            block.as_non_null().cast(),
            // SAFETY: free-list links are intact per this function's contract.
            |candidate| unsafe { free.contains(candidate) },
        )?;

        if let Some(pattern) = self.config.dealloc_pattern {
            // SAFETY: target starts data_size bytes being returned to us;
            // padding and guard bands lie past them.
            unsafe { ptr::write_bytes(target.as_ptr(), pattern, self.geometry.data_size()) };
        }

        // SAFETY: target is a block of this pool that is not on the free list
        // (validated for the guarded layout, caller contract otherwise).
        unsafe { self.free.push(target) };

        if self.config.track_stats {
            self.total_frees += 1;
        }

        Ok(())
    }

    /// Shorthand for [`free_block`](Self::free_block) with a present block.
    ///
    /// # Safety
    ///
    /// Same as [`free_block`](Self::free_block).
    pub unsafe fn free(&mut self, block: Block<T>) -> PoolResult<()> {
        // SAFETY: forwarded to the caller.
        unsafe { self.free_block(Some(block)) }
    }

    /// Release every page back to the system allocator.
    ///
    /// All outstanding blocks dangle afterwards. Calling it on an empty pool
    /// is a no-op; the next `allocate_block` starts a fresh page.
    pub fn clear(&mut self) {
        if self.pages.is_empty() {
            return;
        }

        #[cfg(feature = "logging")]
        {
            trace!(pages = self.pages.len(), layout = L::NAME, "releasing pool pages");
        }

        self.free.clear();
        self.pages.clear();
    }

    /// Allocates one page and threads all its blocks onto the free list.
    fn grow(&mut self) -> PoolResult<()> {
        let page_layout = self.geometry.page_layout();
        self.pages
            .try_reserve(1)
            .map_err(|_| MemoryError::out_of_memory_with_layout(page_layout))?;

        let page = Page::allocate(&self.geometry)?;
        L::format_page(&page, &self.geometry);

        for index in 0..self.geometry.blocks_per_page() {
            // SAFETY: fresh block of a page we own, not on the free list.
            unsafe { self.free.push(page.block_ptr(&self.geometry, index)) };
        }
        self.pages.push(page);

        #[cfg(feature = "logging")]
        debug!(
            page = self.pages.len() - 1,
            page_bytes = page_layout.size(),
            blocks_per_page = self.geometry.blocks_per_page(),
            "allocated pool page"
        );

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// Blocks carved out of every page
    pub fn blocks_per_page(&self) -> usize {
        self.geometry.blocks_per_page()
    }

    /// Pages currently owned
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Blocks available without growing
    pub fn blocks_remaining(&self) -> usize {
        self.free.len()
    }

    /// Total blocks across all pages
    pub fn capacity(&self) -> usize {
        self.pages.len() * self.geometry.blocks_per_page()
    }

    /// Blocks currently handed out
    pub fn in_use_blocks(&self) -> usize {
        self.capacity() - self.free.len()
    }

    /// Checks if every owned block is free
    pub fn is_empty(&self) -> bool {
        self.in_use_blocks() == 0
    }

    /// Usable bytes of one block
    pub fn block_size(&self) -> usize {
        self.geometry.block_size()
    }

    /// Distance between neighbouring blocks, guard band included
    pub fn stride(&self) -> usize {
        self.geometry.stride()
    }

    /// Bytes requested from the system allocator per page
    pub fn page_bytes(&self) -> usize {
        self.geometry.page_size()
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Whether releases are validated (guarded layout)
    pub const fn is_validated(&self) -> bool {
        L::GUARD_BYTES > 0
    }

    /// Checks if `block` is the start of a block of one of this pool's pages.
    ///
    /// Says nothing about whether the block is currently in use.
    pub fn owns(&self, block: Block<T>) -> bool {
        let addr = block.addr();
        self.pages
            .iter()
            .any(|page| page.block_index(&self.geometry, addr).is_some())
    }

    /// Get statistics (if tracking is enabled)
    pub fn stats(&self) -> Option<PoolStats> {
        if !self.config.track_stats {
            return None;
        }

        Some(PoolStats {
            total_allocs: self.total_allocs,
            total_frees: self.total_frees,
            peak_in_use: self.peak_in_use,
            in_use: self.in_use_blocks(),
            pages: self.pages.len(),
            blocks_per_page: self.geometry.blocks_per_page(),
            block_size: self.geometry.block_size(),
            free_blocks: self.free.len(),
        })
    }

    /// Zero the counters; the current usage becomes the new peak.
    pub fn reset_stats(&mut self) {
        self.total_allocs = 0;
        self.total_frees = 0;
        self.peak_in_use = self.in_use_blocks();
    }
}

impl<T, L: PageLayout> Drop for BlockPool<T, L> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, L: PageLayout> fmt::Debug for BlockPool<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockPool")
            .field("element", &core::any::type_name::<T>())
            .field("layout", &L::NAME)
            .field("block_size", &self.geometry.block_size())
            .field("blocks_per_page", &self.geometry.blocks_per_page())
            .field("pages", &self.pages.len())
            .field("blocks_remaining", &self.free.len())
            .finish()
    }
}

// SAFETY: BlockPool is Send because:
// - it exclusively owns every page; no other handle to the page memory is
//   held by the pool's internals
// - free-list pointers only point into those owned pages
// - T: Send covers values callers left in blocks that move with the pool
// It is not Sync: every operation needs &mut self.
unsafe impl<T: Send, L: PageLayout> Send for BlockPool<T, L> {}
