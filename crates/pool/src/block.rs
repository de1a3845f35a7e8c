//! Block handles

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::ptr::NonNull;

/// Opaque handle to one block handed out by a [`BlockPool`](crate::BlockPool).
///
/// A `Block` is just an address: copying it does not copy the storage, and
/// holding one does not keep the block alive. The storage is valid from
/// `allocate_block` until the block is freed or the pool is cleared or
/// dropped; touching it outside that window is undefined behaviour.
pub struct Block<T> {
    ptr: NonNull<T>,
    _marker: PhantomData<*mut T>,
}

impl<T> Block<T> {
    pub(crate) fn from_block_ptr(ptr: NonNull<u8>) -> Self {
        Self {
            ptr: ptr.cast(),
            _marker: PhantomData,
        }
    }

    /// Wrap a non-null address. The address is not checked until it is freed.
    pub fn from_non_null(ptr: NonNull<T>) -> Self {
        Self {
            ptr,
            _marker: PhantomData,
        }
    }

    /// Wrap a raw address; `None` for null.
    pub fn from_raw(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(Self::from_non_null)
    }

    pub fn as_ptr(self) -> *mut T {
        self.ptr.as_ptr()
    }

    pub fn as_non_null(self) -> NonNull<T> {
        self.ptr
    }

    /// Numeric address of the block.
    pub fn addr(self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Move `value` into the block without dropping previous contents.
    ///
    /// # Safety
    ///
    /// The block must be live (allocated and not yet freed) and not aliased
    /// by any outstanding reference.
    pub unsafe fn write(self, value: T) {
        // SAFETY: caller guarantees a live block; blocks are sized and
        // aligned for T by the pool geometry.
        unsafe { self.ptr.write(value) }
    }

    /// Bitwise-copy the value out of the block.
    ///
    /// # Safety
    ///
    /// The block must be live and hold an initialised `T`. For non-`Copy`
    /// types the caller must not use the value left behind.
    pub unsafe fn read(self) -> T {
        // SAFETY: forwarded to the caller.
        unsafe { self.ptr.read() }
    }

    /// Borrow the block's value.
    ///
    /// # Safety
    ///
    /// The block must be live, hold an initialised `T`, and stay live and
    /// unmutated for `'a`.
    pub unsafe fn as_ref<'a>(self) -> &'a T {
        // SAFETY: forwarded to the caller.
        unsafe { self.ptr.as_ref() }
    }

    /// Mutably borrow the block's value.
    ///
    /// # Safety
    ///
    /// The block must be live, hold an initialised `T`, and not be accessed
    /// through any other path for `'a`.
    pub unsafe fn as_mut<'a>(mut self) -> &'a mut T {
        // SAFETY: forwarded to the caller.
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Clone for Block<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Block<T> {}

impl<T> PartialEq for Block<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<T> Eq for Block<T> {}

impl<T> Hash for Block<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ptr.hash(state);
    }
}

impl<T> fmt::Debug for Block<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Block")
            .field(&format_args!("{:#x}", self.addr()))
            .finish()
    }
}

impl<T> fmt::Pointer for Block<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.ptr, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_null_is_absent() {
        assert!(Block::<u32>::from_raw(core::ptr::null_mut()).is_none());
    }

    #[test]
    fn test_handles_compare_by_address() {
        let mut a = 1u32;
        let mut b = 2u32;
        let ha = Block::from_raw(&raw mut a).unwrap();
        let hb = Block::from_raw(&raw mut b).unwrap();

        assert_eq!(ha, ha);
        assert_ne!(ha, hb);
        assert_eq!(ha.addr(), (&raw const a) as usize);

        let set: HashSet<_> = [ha, hb, ha].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_read_write() {
        let mut slot = 0u64;
        let block = Block::from_raw(&raw mut slot).unwrap();
        // SAFETY: block points at a live local.
        unsafe {
            block.write(42);
            assert_eq!(block.read(), 42);
            *block.as_mut() += 1;
            assert_eq!(*block.as_ref(), 43);
        }
    }

    #[test]
    fn test_debug_shows_address() {
        let mut slot = 0u8;
        let block = Block::from_raw(&raw mut slot).unwrap();
        assert!(format!("{block:?}").starts_with("Block(0x"));
    }
}
