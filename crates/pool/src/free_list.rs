//! Intrusive LIFO free list
//!
//! Free blocks store the link to the next free block in their own first
//! word, so the list costs no memory beyond the blocks themselves.
//!
//! ## Invariants
//!
//! - every node is the start of a block owned by the same pool, aligned for
//!   `FreeNode` and at least `size_of::<FreeNode>()` bytes wide
//! - `len` equals the number of nodes reachable from `head`
//! - a block appears at most once

use core::ptr::NonNull;

/// Node overlaid on the first word of a free block.
#[repr(C)]
struct FreeNode {
    next: Option<NonNull<FreeNode>>,
}

pub(crate) struct FreeList {
    head: Option<NonNull<FreeNode>>,
    len: usize,
}

impl FreeList {
    pub(crate) const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Push `block` as the new head.
    ///
    /// # Safety
    ///
    /// `block` must be the start of a block of the owning pool that is not
    /// on the list and not in use by anyone else.
    pub(crate) unsafe fn push(&mut self, block: NonNull<u8>) {
        let node = block.cast::<FreeNode>();
        // SAFETY: caller guarantees block is a writable, aligned pool block.
        unsafe { node.write(FreeNode { next: self.head }) };
        self.head = Some(node);
        self.len += 1;
    }

    /// Pop the head, the most recently pushed block.
    ///
    /// # Safety
    ///
    /// No free block's link may have been overwritten since it was pushed.
    pub(crate) unsafe fn pop(&mut self) -> Option<NonNull<u8>> {
        let node = self.head?;
        // SAFETY: node is a free block holding a link written by push.
        self.head = unsafe { node.read().next };
        self.len -= 1;
        Some(node.cast())
    }

    /// Whether `block` is currently on the list. Walks the whole list.
    ///
    /// # Safety
    ///
    /// Same as [`pop`](Self::pop): every link must be intact.
    pub(crate) unsafe fn contains(&self, block: NonNull<u8>) -> bool {
        let target = block.cast::<FreeNode>();
        let mut cursor = self.head;
        while let Some(node) = cursor {
            if node == target {
                return true;
            }
            // SAFETY: node is a free block holding a link written by push.
            cursor = unsafe { node.read().next };
        }
        false
    }

    /// Forget every node. The blocks themselves are not touched.
    pub(crate) fn clear(&mut self) {
        self.head = None;
        self.len = 0;
    }
}
