use std::fmt::Display;

/// A half open address range `[base, base + len)`.
///
/// No bytes live behind a block, only its bookkeeping. Two blocks with the same
/// base and length are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub base: usize,
    pub len: usize,
}

impl Block {
    pub const fn new(base: usize, len: usize) -> Self {
        Self { base, len }
    }

    /// First address past the end of the range
    pub const fn end(&self) -> usize {
        self.base + self.len
    }

    pub const fn contains(&self, address: usize) -> bool {
        address >= self.base && address < self.end()
    }

    /// `other` starts exactly where `self` ends
    pub const fn is_adjacent_to(&self, other: &Block) -> bool {
        self.end() == other.base
    }

    pub const fn overlaps(&self, other: &Block) -> bool {
        self.base < other.end() && other.base < self.end()
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} , {})", self.base, self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_and_contains() {
        let b = Block::new(10, 5);
        assert_eq!(b.end(), 15);
        assert!(b.contains(10));
        assert!(b.contains(14));
        assert!(!b.contains(15));
        assert!(!b.contains(9));
    }

    #[test]
    fn adjacency_is_directional() {
        let a = Block::new(0, 5);
        let b = Block::new(5, 5);
        assert!(a.is_adjacent_to(&b));
        assert!(!b.is_adjacent_to(&a));
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn overlap() {
        assert!(Block::new(0, 10).overlaps(&Block::new(9, 3)));
        assert!(Block::new(4, 2).overlaps(&Block::new(0, 10)));
        assert!(!Block::new(0, 3).overlaps(&Block::new(3, 3)));
    }

    #[test]
    fn display() {
        assert_eq!(Block::new(0, 100).to_string(), "(0 , 100)");
    }
}
