//! Page geometry
//!
//! Every page of a pool has the same shape, decided once at construction:
//!
//! ```text
//! unchecked:  [block 0][block 1] ... [block n-1]
//! guarded:    [guard][block 0][guard][block 1][guard] ... [block n-1][guard]
//!             ^                                                        ^
//!             first guard                          n + 1 guard bands in total
//! ```
//!
//! Guard bands are widened to the block alignment so that every block stays
//! aligned for both `T` and the free-list link stored in it. A block may be
//! wider than the element it holds; on guarded pages the bytes between the
//! end of the data and the end of the block carry the guard signature too,
//! so the first byte past the element is already checked.

use core::alloc::Layout;

use crate::error::{MemoryError, PoolResult};
use crate::layout::PageLayout;

/// Aligns a value up to the nearest multiple of alignment
///
/// Returns `None` on overflow. `alignment` must be a power of two.
#[inline]
pub const fn align_up(value: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    match value.checked_add(alignment - 1) {
        Some(v) => Some(v & !(alignment - 1)),
        None => None,
    }
}

/// Byte layout shared by all pages of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    data_size: usize,
    block_size: usize,
    block_align: usize,
    guard_size: usize,
    stride: usize,
    first_block_offset: usize,
    blocks_per_page: usize,
    page_layout: Layout,
}

impl PageGeometry {
    /// Geometry for blocks of `T` in pages of layout `L`.
    pub fn for_type<T, L: PageLayout>(blocks_per_page: usize) -> PoolResult<Self> {
        Self::new(
            size_of::<T>(),
            align_of::<T>(),
            L::GUARD_BYTES,
            blocks_per_page,
        )
    }

    /// Compute the geometry for raw element size and alignment.
    ///
    /// The block is at least one pointer wide so a free block can hold the
    /// free-list link, and aligned for both the element and that link.
    pub fn new(
        elem_size: usize,
        elem_align: usize,
        guard_bytes: usize,
        blocks_per_page: usize,
    ) -> PoolResult<Self> {
        if blocks_per_page == 0 {
            return Err(MemoryError::invalid_configuration(
                "blocks_per_page must be greater than zero",
            ));
        }
        if !elem_align.is_power_of_two() {
            return Err(MemoryError::invalid_configuration(
                "element alignment is not a power of two",
            ));
        }

        let block_align = elem_align.max(align_of::<usize>());
        let data_size = elem_size.max(size_of::<usize>());
        let block_size = align_up(data_size, block_align)
            .ok_or_else(|| MemoryError::invalid_configuration("block size overflows usize"))?;
        let guard_size = if guard_bytes == 0 {
            0
        } else {
            align_up(guard_bytes, block_align)
                .ok_or_else(|| MemoryError::invalid_configuration("guard size overflows usize"))?
        };

        let stride = block_size + guard_size;
        let page_size = stride
            .checked_mul(blocks_per_page)
            .and_then(|blocks| blocks.checked_add(guard_size))
            .ok_or_else(|| MemoryError::invalid_configuration("page size overflows usize"))?;
        let page_layout = Layout::from_size_align(page_size, block_align).map_err(|_| {
            MemoryError::invalid_configuration("page size exceeds the maximum allocation size")
        })?;

        Ok(Self {
            data_size,
            block_size,
            block_align,
            guard_size,
            stride,
            first_block_offset: guard_size,
            blocks_per_page,
            page_layout,
        })
    }

    /// Bytes of a block that hold data: the element or the free-list link,
    /// whichever is wider.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// Bytes from one block start to the end of that block, alignment
    /// padding included.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Alignment of every block and of the page itself.
    pub fn block_align(&self) -> usize {
        self.block_align
    }

    /// Width of one guard band, zero for unguarded pages.
    pub fn guard_size(&self) -> usize {
        self.guard_size
    }

    /// Distance between the starts of two neighbouring blocks.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Offset of block 0 from the page base.
    pub fn first_block_offset(&self) -> usize {
        self.first_block_offset
    }

    pub fn blocks_per_page(&self) -> usize {
        self.blocks_per_page
    }

    /// Total bytes requested from the system allocator per page.
    pub fn page_size(&self) -> usize {
        self.page_layout.size()
    }

    pub fn page_layout(&self) -> Layout {
        self.page_layout
    }

    /// Offset of block `index` from the page base.
    #[inline]
    pub fn block_offset(&self, index: usize) -> usize {
        debug_assert!(index < self.blocks_per_page);
        self.first_block_offset + index * self.stride
    }

    /// Offset of the guard band that precedes block `index`.
    #[inline]
    pub fn guard_before_offset(&self, index: usize) -> usize {
        self.block_offset(index) - self.guard_size
    }

    /// Offset of the first byte past the data of block `index`.
    #[inline]
    pub fn data_end_offset(&self, index: usize) -> usize {
        self.block_offset(index) + self.data_size
    }

    /// Offset of the guard band that follows block `index`.
    #[inline]
    pub fn guard_after_offset(&self, index: usize) -> usize {
        self.block_offset(index) + self.block_size
    }

    /// Block index for a byte offset from the page base, if the offset
    /// lands exactly on the start of a block.
    #[inline]
    pub fn index_for_offset(&self, offset: usize) -> Option<usize> {
        let distance = offset.checked_sub(self.first_block_offset)?;
        if distance % self.stride != 0 {
            return None;
        }
        let index = distance / self.stride;
        (index < self.blocks_per_page).then_some(index)
    }
}
