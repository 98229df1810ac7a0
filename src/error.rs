use thiserror::Error;

use crate::block::Block;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    #[error("index {index} out of bounds for BlockList of length {len}")]
    OutOfRange { index: usize, len: usize },
    #[error("block {0} is not in this list")]
    NotFound(Block),
}

/// Accounting violations reported by [`crate::alloc::MemorySpace::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("blocks {first} and {second} overlap")]
    Overlap { first: Block, second: Block },
    #[error("block {block} reaches past capacity {capacity}")]
    OutOfBounds { block: Block, capacity: usize },
    #[error("free and allocated blocks cover {found} addresses, expected {expected}")]
    Leak { expected: usize, found: usize },
}
