//! A single page: one raw allocation from the system allocator
//!
//! # Safety
//!
//! - `base` comes from `std::alloc::alloc` with `layout` and is released with
//!   the same layout in `Drop`, exactly once
//! - every pointer handed out is derived from `base`, so it carries the
//!   page's provenance
//! - block and guard offsets come from the owning pool's [`PageGeometry`],
//!   which produced `layout`; all of them lie inside the allocation

use core::alloc::Layout;
use core::fmt;
use core::ptr::NonNull;
use std::alloc;

use crate::error::{GuardSide, MemoryError, PoolResult};
use crate::geometry::PageGeometry;

/// One contiguous page of blocks (and guard bands, if the layout has them).
///
/// Pages are only ever released all together, when the pool is cleared or
/// dropped.
pub struct Page {
    base: NonNull<u8>,
    layout: Layout,
}

impl Page {
    /// Request one page from the system allocator.
    pub(crate) fn allocate(geometry: &PageGeometry) -> PoolResult<Self> {
        let layout = geometry.page_layout();

        // SAFETY: layout has non-zero size: blocks_per_page >= 1 and every
        // block is at least one pointer wide (PageGeometry::new).
        let raw = unsafe { alloc::alloc(layout) };
        let base = NonNull::new(raw).ok_or_else(|| MemoryError::out_of_memory_with_layout(layout))?;

        Ok(Self { base, layout })
    }

    /// Address of the first byte of the page.
    pub fn base_addr(&self) -> usize {
        self.base.as_ptr() as usize
    }

    /// Size of the page in bytes.
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Whether `addr` falls anywhere inside this page.
    pub fn contains_addr(&self, addr: usize) -> bool {
        addr >= self.base_addr() && addr - self.base_addr() < self.size()
    }

    /// Index of the block starting exactly at `addr`, if there is one.
    pub fn block_index(&self, geometry: &PageGeometry, addr: usize) -> Option<usize> {
        if !self.contains_addr(addr) {
            return None;
        }
        geometry.index_for_offset(addr - self.base_addr())
    }

    /// Pointer to the start of block `index`.
    pub(crate) fn block_ptr(&self, geometry: &PageGeometry, index: usize) -> NonNull<u8> {
        // SAFETY: block_offset(index) < page size for index < blocks_per_page,
        // so the result stays inside the allocation and is non-null.
        unsafe { self.base.add(geometry.block_offset(index)) }
    }

    /// Fill every guard band of the page, and the padding past each block's
    /// data, with `signature`.
    pub(crate) fn write_guards(&self, geometry: &PageGeometry, signature: u16) {
        let guard = geometry.guard_size();
        if guard == 0 {
            return;
        }

        let padding = geometry.block_size() - geometry.data_size();
        for index in 0..geometry.blocks_per_page() {
            self.fill_signature(geometry.guard_before_offset(index), guard, signature);
            self.fill_signature(geometry.data_end_offset(index), padding, signature);
        }
        // the band after the last block closes the page
        let last = geometry.blocks_per_page() - 1;
        self.fill_signature(geometry.guard_after_offset(last), guard, signature);
    }

    /// Whether the guard on `side` of block `index` still holds `signature`.
    ///
    /// The after side covers the padding between the end of the data and the
    /// band as well as the band itself.
    pub fn guard_intact(
        &self,
        geometry: &PageGeometry,
        index: usize,
        side: GuardSide,
        signature: u16,
    ) -> bool {
        let guard = geometry.guard_size();
        if guard == 0 {
            return true;
        }

        match side {
            GuardSide::Before => {
                self.signature_intact(geometry.guard_before_offset(index), guard, signature)
            }
            GuardSide::After => {
                let padding = geometry.block_size() - geometry.data_size();
                self.signature_intact(geometry.data_end_offset(index), padding, signature)
                    && self.signature_intact(geometry.guard_after_offset(index), guard, signature)
            }
        }
    }

    fn fill_signature(&self, offset: usize, len: usize, signature: u16) {
        let pattern = signature.to_ne_bytes();
        // SAFETY: callers pass guard or padding ranges computed by the
        // geometry that produced this page's layout; all lie inside the page.
        let bytes = unsafe { core::slice::from_raw_parts_mut(self.base.as_ptr().add(offset), len) };
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = pattern[i % pattern.len()];
        }
    }

    fn signature_intact(&self, offset: usize, len: usize, signature: u16) -> bool {
        let pattern = signature.to_ne_bytes();
        // SAFETY: as in fill_signature; the range was initialised by
        // write_guards when the page was formatted.
        let bytes = unsafe { core::slice::from_raw_parts(self.base.as_ptr().add(offset), len) };
        bytes
            .iter()
            .enumerate()
            .all(|(i, byte)| *byte == pattern[i % pattern.len()])
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        // SAFETY: base was allocated in Page::allocate with this exact layout
        // and is deallocated only here.
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) };
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("base", &format_args!("{:#x}", self.base_addr()))
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{GUARD_SIGNATURE, Guarded, Unchecked};

    #[test]
    fn test_blocks_lie_inside_page() {
        let geometry = PageGeometry::for_type::<u64, Guarded>(8).unwrap();
        let page = Page::allocate(&geometry).unwrap();

        for index in 0..8 {
            let addr = page.block_ptr(&geometry, index).as_ptr() as usize;
            assert!(page.contains_addr(addr));
            assert!(page.contains_addr(addr + geometry.block_size() - 1));
            assert_eq!(addr % geometry.block_align(), 0);
            assert_eq!(page.block_index(&geometry, addr), Some(index));
        }
    }

    #[test]
    fn test_block_index_rejects_foreign_addresses() {
        let geometry = PageGeometry::for_type::<u64, Unchecked>(4).unwrap();
        let page = Page::allocate(&geometry).unwrap();

        assert_eq!(page.block_index(&geometry, page.base_addr() + 1), None);
        assert_eq!(page.block_index(&geometry, page.base_addr() + page.size()), None);
        assert_eq!(page.block_index(&geometry, 0x1234_5678), None);
    }

    #[test]
    fn test_fresh_guards_are_intact() {
        let geometry = PageGeometry::for_type::<u32, Guarded>(3).unwrap();
        let page = Page::allocate(&geometry).unwrap();
        page.write_guards(&geometry, GUARD_SIGNATURE);

        for index in 0..3 {
            for side in [GuardSide::Before, GuardSide::After] {
                assert!(page.guard_intact(&geometry, index, side, GUARD_SIGNATURE));
            }
        }
    }

    #[test]
    fn test_overwritten_guard_is_detected() {
        let geometry = PageGeometry::for_type::<u32, Guarded>(3).unwrap();
        let page = Page::allocate(&geometry).unwrap();
        page.write_guards(&geometry, GUARD_SIGNATURE);

        let after = geometry.guard_after_offset(1);
        // SAFETY: the band after block 1 lies inside the page.
        unsafe { page.base.as_ptr().add(after).write(0) };

        assert!(!page.guard_intact(&geometry, 1, GuardSide::After, GUARD_SIGNATURE));
        // the same band precedes block 2
        assert!(!page.guard_intact(&geometry, 2, GuardSide::Before, GUARD_SIGNATURE));
        assert!(page.guard_intact(&geometry, 0, GuardSide::After, GUARD_SIGNATURE));
    }

    #[test]
    fn test_padding_past_data_is_guarded() {
        let geometry = PageGeometry::for_type::<[u8; 13], Guarded>(3).unwrap();
        assert_eq!(geometry.block_size() - geometry.data_size(), 3);
        let page = Page::allocate(&geometry).unwrap();
        page.write_guards(&geometry, GUARD_SIGNATURE);
        for index in 0..3 {
            assert!(page.guard_intact(&geometry, index, GuardSide::After, GUARD_SIGNATURE));
        }

        // SAFETY: the first padding byte of block 0 lies inside the page.
        unsafe { page.base.as_ptr().add(geometry.data_end_offset(0)).write(0) };

        assert!(!page.guard_intact(&geometry, 0, GuardSide::After, GUARD_SIGNATURE));
        // padding is not shared with the next block
        assert!(page.guard_intact(&geometry, 1, GuardSide::Before, GUARD_SIGNATURE));
    }

    #[test]
    fn test_unguarded_pages_always_intact() {
        let geometry = PageGeometry::for_type::<u32, Unchecked>(2).unwrap();
        let page = Page::allocate(&geometry).unwrap();
        assert!(page.guard_intact(&geometry, 0, GuardSide::Before, GUARD_SIGNATURE));
    }
}
