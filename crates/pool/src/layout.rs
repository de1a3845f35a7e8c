//! Page layouts
//!
//! Whether a pool validates released blocks is a property of its *type*, not
//! a runtime flag: guard bands change the geometry of every page, so the
//! choice is fixed for the pool's whole lifetime. [`PageLayout`] is sealed;
//! the only layouts are [`Unchecked`] and [`Guarded`].
//!
//! The `validation` cargo feature picks which of the two [`DefaultLayout`]
//! refers to.

use core::fmt;
use core::ptr::NonNull;

use crate::error::{GuardSide, MemoryError, PoolResult};
use crate::geometry::PageGeometry;
use crate::page::Page;

/// Two-byte signature repeated across every guard band.
pub const GUARD_SIGNATURE: u16 = 0xBEEF;

/// Minimum guard band width in bytes, before rounding to block alignment.
pub const GUARD_BYTES: usize = size_of::<u16>();

mod private {
    pub trait Sealed {}

    impl Sealed for super::Unchecked {}
    impl Sealed for super::Guarded {}
}

/// Page layout selected at the type level.
pub trait PageLayout: private::Sealed + fmt::Debug + Send + Sync + 'static {
    /// Guard band width before alignment rounding; zero means no guards.
    const GUARD_BYTES: usize;

    /// Human-readable layout name used in logs and `Debug` output.
    const NAME: &'static str;

    /// Prepare a freshly allocated page before its blocks are threaded.
    #[doc(hidden)]
    fn format_page(page: &Page, geometry: &PageGeometry);

    /// Map a released address to the block that goes back on the free list.
    ///
    /// `is_free` reports whether a block is currently on the free list.
    #[doc(hidden)]
    fn resolve_release<F>(
        pages: &[Page],
        geometry: &PageGeometry,
        addr: NonNull<u8>,
        is_free: F,
    ) -> PoolResult<NonNull<u8>>
    where
        F: FnOnce(NonNull<u8>) -> bool;
}

/// No guard bands and no checks on release.
///
/// Release is an O(1) push; correctness rests entirely on the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Unchecked;

impl PageLayout for Unchecked {
    const GUARD_BYTES: usize = 0;
    const NAME: &'static str = "unchecked";

    #[inline]
    fn format_page(_page: &Page, _geometry: &PageGeometry) {}

    #[inline]
    fn resolve_release<F>(
        _pages: &[Page],
        _geometry: &PageGeometry,
        addr: NonNull<u8>,
        _is_free: F,
    ) -> PoolResult<NonNull<u8>>
    where
        F: FnOnce(NonNull<u8>) -> bool,
    {
        Ok(addr)
    }
}

/// Guard bands around every block, checked on release.
///
/// Release runs three checks in a fixed order, stopping at the first failure:
///
/// 1. location: the address is the start of some block on some page
///    ([`MemoryError::InvalidAddress`])
/// 2. corruption: both guard bands, and the padding between the end of the
///    data and the band after it, still hold [`GUARD_SIGNATURE`]
///    ([`MemoryError::CorruptedMemory`])
/// 3. double free: the block is not already on the free list
///    ([`MemoryError::DoubleFree`])
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Guarded;

impl PageLayout for Guarded {
    const GUARD_BYTES: usize = GUARD_BYTES;
    const NAME: &'static str = "guarded";

    fn format_page(page: &Page, geometry: &PageGeometry) {
        page.write_guards(geometry, GUARD_SIGNATURE);
    }

    fn resolve_release<F>(
        pages: &[Page],
        geometry: &PageGeometry,
        addr: NonNull<u8>,
        is_free: F,
    ) -> PoolResult<NonNull<u8>>
    where
        F: FnOnce(NonNull<u8>) -> bool,
    {
        let raw = addr.as_ptr() as usize;

        let (page, index) = pages
            .iter()
            .find_map(|page| page.block_index(geometry, raw).map(|index| (page, index)))
            .ok_or_else(|| MemoryError::invalid_address(raw))?;

        for side in [GuardSide::Before, GuardSide::After] {
            if !page.guard_intact(geometry, index, side, GUARD_SIGNATURE) {
                return Err(MemoryError::corrupted(raw, side));
            }
        }

        let block = page.block_ptr(geometry, index);
        if is_free(block) {
            return Err(MemoryError::double_free(raw));
        }

        Ok(block)
    }
}

/// Layout used when a pool names no layout explicitly.
#[cfg(feature = "validation")]
pub type DefaultLayout = Guarded;

/// Layout used when a pool names no layout explicitly.
#[cfg(not(feature = "validation"))]
pub type DefaultLayout = Unchecked;
