use std::fmt::Display;

use log::{debug, trace};

use crate::block::Block;
use crate::error::AllocError;
use crate::list::BlockList;

/// Snapshot of how a [`MemorySpace`] is split up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStats {
    pub capacity: usize,
    pub free: usize,
    pub allocated: usize,
    /// number of entries in the free list
    pub free_blocks: usize,
    pub largest_free: usize,
}

/// Manages the address range `[0, capacity)` with a first fit free list.
///
/// Requests are served from the first free block, in free list order, that is
/// large enough. Released blocks are appended to the free list as they are, the
/// free list is only sorted and coalesced when [`MemorySpace::defragment`] is
/// called.
#[derive(Debug, Clone)]
pub struct MemorySpace {
    capacity: usize,
    free: BlockList,
    allocated: BlockList,
}

impl MemorySpace {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Zero-size memory space is not allowed");

        let mut free = BlockList::new();
        free.push_back(Block::new(0, capacity));
        Self {
            capacity,
            free,
            allocated: BlockList::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free_list(&self) -> &BlockList {
        &self.free
    }

    pub fn allocated_list(&self) -> &BlockList {
        &self.allocated
    }

    /// Hands out `len` addresses and returns the base of the range, or `None`
    /// if no free block is large enough. A miss leaves both lists untouched.
    ///
    /// A free block of exactly `len` is consumed whole, a larger one is shrunk
    /// from the front in place.
    pub fn allocate(&mut self, len: usize) -> Option<usize> {
        assert!(len > 0, "Zero-size allocation is not allowed");

        let Some(id) = self.free.find_node(|b| b.len >= len) else {
            trace!("allocate len={} found no fit", len);
            return None;
        };
        let found = *self.free.get(id)?;

        self.allocated.push_back(Block::new(found.base, len));
        if found.len == len {
            self.free.remove_node(id);
        } else if let Some(rest) = self.free.get_mut(id) {
            rest.base += len;
            rest.len -= len;
        }

        debug!("allocate len={} -> base={}", len, found.base);
        self.trace_lists("allocate");
        Some(found.base)
    }

    /// Returns the allocated block starting at `address` to the tail of the free
    /// list. Addresses that are not currently allocated are ignored.
    pub fn release(&mut self, address: usize) -> Option<Block> {
        let Some(id) = self.allocated.find_node(|b| b.base == address) else {
            trace!("release base={} is not allocated", address);
            return None;
        };
        let block = self.allocated.remove_node(id)?;
        self.free.push_back(block);

        debug!("release {}", block);
        self.trace_lists("release");
        Some(block)
    }

    /// Sorts the free list by address and merges every run of contiguous blocks
    /// into one.
    pub fn defragment(&mut self) {
        let before = self.free.len();
        self.free = self.free.sorted_by_address();

        let mut current = self.free.first();
        while let Some(id) = current {
            let Some(next) = self.free.next(id) else { break };
            let (Some(&left), Some(&right)) = (self.free.get(id), self.free.get(next)) else {
                break;
            };

            if left.is_adjacent_to(&right) {
                if let Some(merged) = self.free.get_mut(id) {
                    merged.len += right.len;
                }
                self.free.remove_node(next);
            } else {
                current = Some(next);
            }
        }

        debug!(
            "defragment merged {} free blocks into {}",
            before,
            self.free.len()
        );
        self.trace_lists("defragment");
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            capacity: self.capacity,
            free: self.free.total_len(),
            allocated: self.allocated.total_len(),
            free_blocks: self.free.len(),
            largest_free: self.free.iter().map(|b| b.len).max().unwrap_or(0),
        }
    }

    /// Checks that free and allocated blocks stay inside the space, never
    /// overlap and together cover all of it.
    pub fn verify(&self) -> Result<(), AllocError> {
        let mut all: Vec<Block> = self.free.iter().chain(&self.allocated).copied().collect();
        all.sort_by_key(|b| b.base);

        for block in &all {
            if block.end() > self.capacity {
                return Err(AllocError::OutOfBounds {
                    block: *block,
                    capacity: self.capacity,
                });
            }
        }
        for pair in all.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(AllocError::Overlap {
                    first: pair[0],
                    second: pair[1],
                });
            }
        }

        let found: usize = all.iter().map(|b| b.len).sum();
        if found != self.capacity {
            return Err(AllocError::Leak {
                expected: self.capacity,
                found,
            });
        }
        Ok(())
    }

    #[inline(always)]
    fn trace_lists(&self, _op: &str) {
        #[cfg(feature = "trace")]
        trace!(
            "[MemorySpace] after {}: free=[{}] allocated=[{}]",
            _op,
            self.free,
            self.allocated
        );
    }
}

impl Display for MemorySpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.free, self.allocated)
    }
}
