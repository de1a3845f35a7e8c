//! Standalone error types for paged-pool
//!
//! Uses thiserror for clean, idiomatic Rust error definitions. The pool
//! never logs a failed validation; every failure is returned to the caller,
//! who decides whether it is fatal.

use core::alloc::Layout;
use core::fmt;

use thiserror::Error;

// ============================================================================
// Main Error Types
// ============================================================================

/// Which guard band around a block failed the signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardSide {
    /// Band immediately before the block's data (underrun).
    Before,
    /// Band immediately after the block's data (overrun).
    After,
}

impl fmt::Display for GuardSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// Block pool errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    // --- Construction ---
    #[error("Invalid pool configuration: {reason}")]
    InvalidConfiguration { reason: String },

    // --- Growth ---
    #[error("Out of memory: page of {size} bytes with {align} byte alignment")]
    OutOfMemory { size: usize, align: usize },

    // --- Release validation ---
    #[error("Invalid address for freed block: {addr:#x} is not on any page's block grid")]
    InvalidAddress { addr: usize },

    #[error("Memory corruption detected: guard band {side} block {addr:#x} was overwritten")]
    CorruptedMemory { addr: usize, side: GuardSide },

    #[error("Double free: block {addr:#x} is already on the free list")]
    DoubleFree { addr: usize },
}

impl MemoryError {
    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { .. } => "POOL:CONFIG:INVALID",
            Self::OutOfMemory { .. } => "POOL:GROW:OOM",
            Self::InvalidAddress { .. } => "POOL:FREE:ADDRESS",
            Self::CorruptedMemory { .. } => "POOL:FREE:CORRUPTION",
            Self::DoubleFree { .. } => "POOL:FREE:DOUBLE",
        }
    }

    /// Whether the pool is known to be exactly as it was before the failing call.
    ///
    /// Only [`CorruptedMemory`](Self::CorruptedMemory) returns `false`: the pool
    /// itself is untouched, but bytes outside the reported block were written
    /// by someone, so neighbouring blocks can no longer be trusted.
    #[must_use]
    pub fn leaves_state_intact(&self) -> bool {
        !matches!(self, Self::CorruptedMemory { .. })
    }

    /// Whether the condition should normally abort the caller's operation.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CorruptedMemory { .. } | Self::OutOfMemory { .. })
    }

    /// Whether this error can only come out of a validated release.
    #[must_use]
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidAddress { .. } | Self::CorruptedMemory { .. } | Self::DoubleFree { .. }
        )
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create invalid configuration error
    pub fn invalid_configuration(reason: &str) -> Self {
        Self::InvalidConfiguration {
            reason: reason.to_string(),
        }
    }

    /// Create out of memory error
    pub fn out_of_memory(size: usize, align: usize) -> Self {
        Self::OutOfMemory { size, align }
    }

    /// Create out of memory error from layout
    pub fn out_of_memory_with_layout(layout: Layout) -> Self {
        Self::out_of_memory(layout.size(), layout.align())
    }

    /// Create invalid address error
    pub fn invalid_address(addr: usize) -> Self {
        Self::InvalidAddress { addr }
    }

    /// Create memory corruption error
    pub fn corrupted(addr: usize, side: GuardSide) -> Self {
        Self::CorruptedMemory { addr, side }
    }

    /// Create double free error
    pub fn double_free(addr: usize) -> Self {
        Self::DoubleFree { addr }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for pool operations
pub type PoolResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = PoolResult<T>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = MemoryError::out_of_memory(4096, 8);
        assert!(error.to_string().contains("4096"));

        let error = MemoryError::invalid_address(0x1234_5678);
        assert!(error.to_string().contains("0x12345678"));

        let error = MemoryError::corrupted(0x10, GuardSide::After);
        assert!(error.to_string().contains("after"));
    }

    #[test]
    fn test_error_with_layout() {
        let layout = Layout::from_size_align(256, 16).unwrap();
        let error = MemoryError::out_of_memory_with_layout(layout);
        assert_eq!(
            error,
            MemoryError::OutOfMemory {
                size: 256,
                align: 16
            }
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            MemoryError::invalid_configuration("zero").code(),
            "POOL:CONFIG:INVALID"
        );
        assert_eq!(MemoryError::double_free(8).code(), "POOL:FREE:DOUBLE");
        assert_eq!(
            MemoryError::corrupted(8, GuardSide::Before).code(),
            "POOL:FREE:CORRUPTION"
        );
    }

    #[test]
    fn test_state_classification() {
        assert!(MemoryError::invalid_address(1).leaves_state_intact());
        assert!(MemoryError::double_free(1).leaves_state_intact());
        assert!(MemoryError::invalid_configuration("x").leaves_state_intact());
        assert!(!MemoryError::corrupted(1, GuardSide::Before).leaves_state_intact());

        assert!(MemoryError::corrupted(1, GuardSide::After).is_fatal());
        assert!(MemoryError::out_of_memory(1, 1).is_fatal());
        assert!(!MemoryError::double_free(1).is_fatal());
    }

    #[test]
    fn test_validation_failures() {
        assert!(MemoryError::double_free(1).is_validation_failure());
        assert!(!MemoryError::out_of_memory(1, 1).is_validation_failure());
        assert!(!MemoryError::invalid_configuration("x").is_validation_failure());
    }
}
