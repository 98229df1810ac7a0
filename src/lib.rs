//! A first fit free list allocator over a flat address range, with explicit
//! defragmentation. Only address and length bookkeeping, no bytes are stored.
//!
//! 0 locks, not thread safe

/// Address ranges handed out and reclaimed by the allocator
pub mod block;
/// First fit memory space
pub mod alloc;
/// Singly linked block list
pub mod list;

mod error;

pub use alloc::{MemorySpace, MemoryStats};
pub use block::Block;
pub use error::{AllocError, ListError};
pub use list::{BlockList, NodeId};
