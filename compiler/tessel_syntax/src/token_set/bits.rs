//! Packed bit vector over a window of kind indices.
//!
//! Only the 64-bit words between the lowest and highest member are stored,
//! so a set of a few kinds registered late (high indices) stays small.

/// Bits for kind indices `64 * first_word ..` onward.
#[derive(Clone, PartialEq, Eq, Default)]
pub(crate) struct KindBits {
    first_word: usize,
    words: Box<[u64]>,
}

impl KindBits {
    pub(crate) fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        let indices: Vec<usize> = indices.into_iter().collect();
        let (Some(&min), Some(&max)) = (indices.iter().min(), indices.iter().max()) else {
            return Self::default();
        };
        let first_word = min / 64;
        let mut words = vec![0u64; max / 64 - first_word + 1];
        for index in indices {
            words[index / 64 - first_word] |= 1 << (index % 64);
        }
        KindBits {
            first_word,
            words: words.into_boxed_slice(),
        }
    }

    #[inline]
    pub(crate) fn contains(&self, index: usize) -> bool {
        let Some(word) = (index / 64).checked_sub(self.first_word) else {
            return false;
        };
        self.words
            .get(word)
            .is_some_and(|bits| bits & (1 << (index % 64)) != 0)
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[inline]
    fn word(&self, absolute: usize) -> u64 {
        absolute
            .checked_sub(self.first_word)
            .and_then(|i| self.words.get(i).copied())
            .unwrap_or(0)
    }

    fn end_word(&self) -> usize {
        self.first_word + self.words.len()
    }

    /// Combine word-wise over `[from, to)` and trim zero words at both ends.
    fn combine(from: usize, to: usize, op: impl Fn(usize) -> u64) -> Self {
        let words: Vec<u64> = (from..to).map(op).collect();
        let Some(lo) = words.iter().position(|w| *w != 0) else {
            return Self::default();
        };
        let hi = words.iter().rposition(|w| *w != 0).unwrap_or(lo);
        KindBits {
            first_word: from + lo,
            words: words[lo..=hi].into(),
        }
    }

    pub(crate) fn union(&self, other: &Self) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other.clone(),
            (_, true) => self.clone(),
            _ => Self::combine(
                self.first_word.min(other.first_word),
                self.end_word().max(other.end_word()),
                |w| self.word(w) | other.word(w),
            ),
        }
    }

    pub(crate) fn intersection(&self, other: &Self) -> Self {
        Self::combine(
            self.first_word.max(other.first_word),
            self.end_word().min(other.end_word()),
            |w| self.word(w) & other.word(w),
        )
    }

    pub(crate) fn difference(&self, other: &Self) -> Self {
        Self::combine(self.first_word, self.end_word(), |w| {
            self.word(w) & !other.word(w)
        })
    }

    /// Member indices in ascending order.
    pub(crate) fn iter(&self) -> KindBitsIter<'_> {
        KindBitsIter {
            bits: self,
            word: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }
}

/// Iterator over the indices in a `KindBits`.
pub(crate) struct KindBitsIter<'a> {
    bits: &'a KindBits,
    word: usize,
    current: u64,
}

impl Iterator for KindBitsIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current == 0 {
            self.word += 1;
            self.current = *self.bits.words.get(self.word)?;
        }
        let bit = self.current.trailing_zeros() as usize;
        self.current &= self.current - 1; // Clear the lowest set bit
        Some((self.bits.first_word + self.word) * 64 + bit)
    }
}

#[cfg(test)]
mod tests {
    use super::KindBits;
    use pretty_assertions::assert_eq;

    fn collect(bits: &KindBits) -> Vec<usize> {
        bits.iter().collect()
    }

    #[test]
    fn test_window_starts_at_lowest_word() {
        let bits = KindBits::from_indices([130, 200]);
        assert_eq!(bits.first_word, 2);
        assert_eq!(bits.words.len(), 2);
        assert!(bits.contains(130));
        assert!(!bits.contains(2));
        assert!(!bits.contains(10_000));
        assert_eq!(collect(&bits), vec![130, 200]);
    }

    #[test]
    fn test_set_operations_trim() {
        let a = KindBits::from_indices([1, 64, 300]);
        let b = KindBits::from_indices([1, 300, 500]);
        assert_eq!(collect(&a.union(&b)), vec![1, 64, 300, 500]);
        assert_eq!(collect(&a.intersection(&b)), vec![1, 300]);

        let diff = a.difference(&b);
        assert_eq!(collect(&diff), vec![64]);
        assert_eq!(diff.first_word, 1);
        assert_eq!(diff.words.len(), 1);

        assert!(a.difference(&a).is_empty());
        assert!(KindBits::from_indices([3]).intersection(&KindBits::from_indices([700])).is_empty());
    }
}
