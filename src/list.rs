use std::fmt::Display;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::block::Block;
use crate::error::ListError;

/// Identity of a node inside the [`BlockList`] that created it.
///
/// Ids carry the tag of the owning list and the generation of their slot. An id
/// never resolves in another list, nor after its node was removed and the slot
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    owner: u32,
    slot: usize,
    generation: u32,
}

/// source of owner tags, one per list instance
static NEXT_OWNER: AtomicU32 = AtomicU32::new(0);

fn next_owner() -> u32 {
    NEXT_OWNER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
struct Node {
    block: Block,
    next: Option<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Singly linked list of blocks, backed by a slot arena.
///
/// Links are slot indices, removed slots are recycled by later insertions. Head,
/// tail and length are tracked so both ends can be reached and extended in O(1).
#[derive(Debug)]
pub struct BlockList {
    owner: u32,
    slots: Vec<Slot>,
    /// indices into self.slots that are free for reuse
    vacant: Vec<usize>,
    first: Option<NodeId>,
    last: Option<NodeId>,
    len: usize,
    /// link hops taken while walking the chain by index
    #[cfg(test)]
    hops: std::cell::Cell<usize>,
}

impl BlockList {
    pub fn new() -> Self {
        Self {
            owner: next_owner(),
            slots: Vec::new(),
            vacant: Vec::new(),
            first: None,
            last: None,
            len: 0,
            #[cfg(test)]
            hops: std::cell::Cell::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first(&self) -> Option<NodeId> {
        self.first
    }

    pub fn last(&self) -> Option<NodeId> {
        self.last
    }

    /// Block stored in `id`, if `id` is a live node of this list
    pub fn get(&self, id: NodeId) -> Option<&Block> {
        self.node(id).map(|n| &n.block)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Block> {
        self.node_mut(id).map(|n| &mut n.block)
    }

    /// Successor of `id` in the chain
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.next)
    }

    /// Node at position `index`. Both ends are resolved without walking.
    pub fn node_at(&self, index: usize) -> Result<NodeId, ListError> {
        if index >= self.len {
            return Err(self.out_of_range(index));
        }

        let found = match index {
            0 => self.first,
            i if i == self.len - 1 => self.last,
            i => self.first.and_then(|first| self.walk(first, i)),
        };
        found.ok_or_else(|| self.out_of_range(index))
    }

    pub fn block_at(&self, index: usize) -> Result<&Block, ListError> {
        let id = self.node_at(index)?;
        self.get(id).ok_or_else(|| self.out_of_range(index))
    }

    /// Position of the first block equal to `block`
    pub fn index_of(&self, block: &Block) -> Option<usize> {
        self.iter().position(|b| b == block)
    }

    /// First node, in list order, whose block satisfies `pred`
    pub fn find_node<P>(&self, mut pred: P) -> Option<NodeId>
    where
        P: FnMut(&Block) -> bool,
    {
        let mut it = self.iter();
        loop {
            let node = it.node()?;
            if pred(it.next()?) {
                return Some(node);
            }
        }
    }

    /// Inserts `block` so that it ends up at position `index`.
    ///
    /// `0` and `len` are O(1), anything in between walks to the predecessor.
    pub fn insert_at(&mut self, index: usize, block: Block) -> Result<NodeId, ListError> {
        if index > self.len {
            return Err(self.out_of_range(index));
        }
        if index == 0 {
            return Ok(self.push_front(block));
        }
        if index == self.len {
            return Ok(self.push_back(block));
        }

        let prev = self.node_at(index - 1)?;
        Ok(self.link_after(prev, block))
    }

    pub fn push_front(&mut self, block: Block) -> NodeId {
        let id = self.alloc_node(block, self.first);
        self.first = Some(id);
        if self.last.is_none() {
            self.last = Some(id);
        }
        self.len += 1;
        id
    }

    pub fn push_back(&mut self, block: Block) -> NodeId {
        let id = self.alloc_node(block, None);
        match self.last {
            Some(last) => self.set_next(last, Some(id)),
            None => self.first = Some(id),
        }
        self.last = Some(id);
        self.len += 1;
        id
    }

    /// Inserts `block` in front of the first node with a greater base address.
    ///
    /// Blocks with equal bases keep their insertion order, so building a list
    /// through this method is a stable insertion sort.
    pub fn insert_sorted(&mut self, block: Block) -> NodeId {
        let mut prev = None;
        let mut cursor = self.first;
        while let Some(id) = cursor {
            let Some(node) = self.node(id) else { break };
            if node.block.base > block.base {
                break;
            }
            prev = Some(id);
            cursor = node.next;
        }

        match prev {
            None => self.push_front(block),
            Some(p) if Some(p) == self.last => self.push_back(block),
            Some(p) => self.link_after(p, block),
        }
    }

    /// Unlinks `id` and returns its block.
    ///
    /// Removing a node that is not part of this chain does nothing.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Block> {
        if id.owner != self.owner {
            return None;
        }
        if self.first == Some(id) {
            let node = self.free_node(id)?;
            self.first = node.next;
            if self.first.is_none() {
                self.last = None;
            }
            self.len -= 1;
            return Some(node.block);
        }

        let prev = self.nodes().find(|&p| self.next(p) == Some(id))?;
        self.unlink_after(prev)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Block, ListError> {
        if index >= self.len {
            return Err(self.out_of_range(index));
        }

        let removed = if index == 0 {
            let first = self.first;
            first.and_then(|id| self.remove_node(id))
        } else {
            let prev = self.node_at(index - 1)?;
            self.unlink_after(prev)
        };
        removed.ok_or_else(|| self.out_of_range(index))
    }

    /// Removes the first block equal to `block`
    pub fn remove(&mut self, block: &Block) -> Result<Block, ListError> {
        let index = self.index_of(block).ok_or(ListError::NotFound(*block))?;
        self.remove_at(index)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            current: self.first,
            remaining: self.len,
        }
    }

    /// Ids of every node reachable from the head, in order
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            list: self,
            current: self.first,
            remaining: self.len,
        }
    }

    /// Copy of this list ordered by ascending base address; `self` is left as is.
    pub fn sorted_by_address(&self) -> BlockList {
        let mut sorted = BlockList::new();
        if self.len <= 1 {
            sorted.extend(self.iter().copied());
            return sorted;
        }

        for block in self {
            sorted.insert_sorted(*block);
        }
        sorted
    }

    /// Sum of the lengths of all blocks
    pub fn total_len(&self) -> usize {
        self.iter().map(|b| b.len).sum()
    }

    fn out_of_range(&self, index: usize) -> ListError {
        ListError::OutOfRange {
            index,
            len: self.len,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        if id.owner != self.owner {
            return None;
        }
        self.slots
            .get(id.slot)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.owner != self.owner {
            return None;
        }
        self.slots
            .get_mut(id.slot)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    fn set_next(&mut self, id: NodeId, next: Option<NodeId>) {
        if let Some(node) = self.node_mut(id) {
            node.next = next;
        }
    }

    fn walk(&self, from: NodeId, steps: usize) -> Option<NodeId> {
        let mut at = from;
        for _ in 0..steps {
            #[cfg(test)]
            self.hops.set(self.hops.get() + 1);
            at = self.next(at)?;
        }
        Some(at)
    }

    fn alloc_node(&mut self, block: Block, next: Option<NodeId>) -> NodeId {
        let node = Node { block, next };
        match self.vacant.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot];
                entry.node = Some(node);
                NodeId {
                    owner: self.owner,
                    slot,
                    generation: entry.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    owner: self.owner,
                    slot: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    fn free_node(&mut self, id: NodeId) -> Option<Node> {
        if id.owner != self.owner {
            return None;
        }
        let slot = self
            .slots
            .get_mut(id.slot)
            .filter(|s| s.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(id.slot);
        Some(node)
    }

    /// Splices a new node between `prev` and its successor
    fn link_after(&mut self, prev: NodeId, block: Block) -> NodeId {
        let id = self.alloc_node(block, self.next(prev));
        self.set_next(prev, Some(id));
        if self.last == Some(prev) {
            self.last = Some(id);
        }
        self.len += 1;
        id
    }

    fn unlink_after(&mut self, prev: NodeId) -> Option<Block> {
        let target = self.next(prev)?;
        let node = self.free_node(target)?;
        self.set_next(prev, node.next);
        if self.last == Some(target) {
            self.last = Some(prev);
        }
        self.len -= 1;
        Some(node.block)
    }

    #[cfg(test)]
    fn take_hops(&self) -> usize {
        self.hops.replace(0)
    }
}

/// Clones get a fresh owner tag, ids of the source do not resolve in the copy.
impl Clone for BlockList {
    fn clone(&self) -> Self {
        let owner = next_owner();
        let retag = move |id: NodeId| NodeId { owner, ..id };
        let slots = self
            .slots
            .iter()
            .map(|slot| Slot {
                generation: slot.generation,
                node: slot.node.as_ref().map(|n| Node {
                    block: n.block,
                    next: n.next.map(retag),
                }),
            })
            .collect();

        Self {
            owner,
            slots,
            vacant: self.vacant.clone(),
            first: self.first.map(retag),
            last: self.last.map(retag),
            len: self.len,
            #[cfg(test)]
            hops: std::cell::Cell::new(0),
        }
    }
}

impl std::default::Default for BlockList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for BlockList {
    type Output = Block;

    fn index(&self, idx: usize) -> &Self::Output {
        match self.block_at(idx) {
            Ok(block) => block,
            Err(_) => panic!(
                "index {} out of bounds for BlockList of length {}",
                idx, self.len
            ),
        }
    }
}

impl Display for BlockList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, block) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}

impl Extend<Block> for BlockList {
    fn extend<I: IntoIterator<Item = Block>>(&mut self, iter: I) {
        for block in iter {
            self.push_back(block);
        }
    }
}

impl FromIterator<Block> for BlockList {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        let mut list = BlockList::new();
        list.extend(iter);
        list
    }
}

impl<'a> IntoIterator for &'a BlockList {
    type Item = &'a Block;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Forward cursor over the blocks of a [`BlockList`].
///
/// Bounded by the length of the list when the cursor was created.
pub struct Iter<'a> {
    list: &'a BlockList,
    current: Option<NodeId>,
    remaining: usize,
}

impl<'a> Iter<'a> {
    /// Node holding the block the next call to `next` yields
    pub fn node(&self) -> Option<NodeId> {
        if self.remaining == 0 {
            return None;
        }
        self.current
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.list.node(self.current?)?;
        self.current = node.next;
        self.remaining -= 1;
        Some(&node.block)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

/// Forward cursor over the node ids of a [`BlockList`], head first.
pub struct Nodes<'a> {
    list: &'a BlockList,
    current: Option<NodeId>,
    remaining: usize,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.current?;
        self.current = self.list.next(id);
        self.remaining -= 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
