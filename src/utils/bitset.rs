//! A growable bit vector.
//!
//! This module provides a compact bit set for sets of small integers, such as the
//! sequence positions that start a basic block or the blocks removed during
//! simplification.
//!
//! # Features
//!
//! - Efficient storage: 64 elements per word
//! - Grows on insertion, so the final size does not need to be known up front
//! - Order-preserving insertion of a gap ([`BitSet::shift_up_from`])
//! - Iteration over set elements in ascending order
//!
//! # Example
//!
//! ```rust,ignore
//! use flowscope::utils::BitSet;
//!
//! let mut set = BitSet::new(0);
//! set.insert(3);
//! set.insert(130);
//!
//! assert!(set.contains(130));
//! assert!(!set.contains(4000));
//! assert_eq!(set.count(), 2);
//! ```

/// A growable bit vector.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BitSet {
    /// The bits, stored as a vector of words.
    words: Vec<u64>,
}

impl BitSet {
    /// Creates a new empty bit set with room for `capacity` bits.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
        }
    }

    /// Returns `true` if the bit set has no bits set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Sets the bit at the given index, growing the set if necessary.
    ///
    /// Returns `true` if the bit was not set before.
    pub fn insert(&mut self, index: usize) -> bool {
        let word = index / 64;
        let bit = index % 64;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let old = self.words[word];
        self.words[word] |= 1u64 << bit;
        old != self.words[word]
    }

    /// Clears the bit at the given index. Indices beyond the current size are ignored.
    pub fn remove(&mut self, index: usize) {
        let word = index / 64;
        let bit = index % 64;
        if let Some(w) = self.words.get_mut(word) {
            *w &= !(1u64 << bit);
        }
    }

    /// Returns `true` if the bit at the given index is set.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        let word = index / 64;
        let bit = index % 64;
        self.words
            .get(word)
            .is_some_and(|w| (w & (1u64 << bit)) != 0)
    }

    /// Returns the number of bits set.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Clears all bits.
    pub fn clear(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
    }

    /// Moves every set bit at an index `>= from` up by one position.
    ///
    /// This keeps the set consistent with a sequence in which one element was inserted at
    /// position `from`. Bit `from` is clear afterwards.
    pub fn shift_up_from(&mut self, from: usize) {
        let shifted: Vec<usize> = self.iter().filter(|&i| i >= from).collect();
        for &index in &shifted {
            self.remove(index);
        }
        for index in shifted {
            self.insert(index + 1);
        }
    }

    /// Returns an iterator over the indices of set bits.
    pub fn iter(&self) -> BitSetIter<'_> {
        BitSetIter {
            set: self,
            word_idx: 0,
            bit_idx: 0,
        }
    }
}

impl std::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for i in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{i}")?;
            first = false;
        }
        write!(f, "}}")
    }
}

/// Iterator over the set bits in a `BitSet`.
pub struct BitSetIter<'a> {
    set: &'a BitSet,
    word_idx: usize,
    bit_idx: usize,
}

impl Iterator for BitSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while self.word_idx < self.set.words.len() {
            let word = self.set.words[self.word_idx];
            while self.bit_idx < 64 {
                let idx = self.word_idx * 64 + self.bit_idx;
                self.bit_idx += 1;
                if (word & (1u64 << (self.bit_idx - 1))) != 0 {
                    return Some(idx);
                }
            }
            self.word_idx += 1;
            self.bit_idx = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitset_basic() {
        let mut bs = BitSet::new(100);
        assert!(bs.is_empty());
        assert_eq!(bs.count(), 0);

        assert!(bs.insert(0));
        assert!(bs.insert(50));
        assert!(bs.insert(99));
        assert!(!bs.insert(99));

        assert!(!bs.is_empty());
        assert_eq!(bs.count(), 3);
        assert!(bs.contains(0));
        assert!(bs.contains(50));
        assert!(bs.contains(99));
        assert!(!bs.contains(1));
    }

    #[test]
    fn test_bitset_grows() {
        let mut bs = BitSet::new(0);
        assert!(!bs.contains(1000));
        bs.insert(1000);
        assert!(bs.contains(1000));
        assert_eq!(bs.count(), 1);
    }

    #[test]
    fn test_bitset_remove() {
        let mut bs = BitSet::new(100);
        bs.insert(42);
        assert!(bs.contains(42));

        bs.remove(42);
        assert!(!bs.contains(42));
        bs.remove(5000);
    }

    #[test]
    fn test_bitset_shift_up_from() {
        let mut bs = BitSet::new(0);
        bs.insert(1);
        bs.insert(4);
        bs.insert(63);

        bs.shift_up_from(4);

        let bits: Vec<_> = bs.iter().collect();
        assert_eq!(bits, vec![1, 5, 64]);
    }

    #[test]
    fn test_bitset_iter() {
        let mut bs = BitSet::new(100);
        bs.insert(5);
        bs.insert(42);
        bs.insert(99);

        let bits: Vec<_> = bs.iter().collect();
        assert_eq!(bits, vec![5, 42, 99]);
    }

    #[test]
    fn test_bitset_clear() {
        let mut bs = BitSet::new(100);
        bs.insert(50);
        assert_eq!(bs.count(), 1);

        bs.clear();
        assert!(bs.is_empty());
    }
}
