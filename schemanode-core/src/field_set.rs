use alloc::vec::Vec;

/// Keeps track of which fields of a content assembler were assigned.
///
/// This is assembler-side bookkeeping only: it never reaches a frozen node.
/// For up to 64 fields it uses a single `u64`, beyond that a `Vec<u64>`.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct FieldSet {
    inner: FieldSetInner,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum FieldSetInner {
    /// Up to 64 fields in a single word
    Small(u64),
    /// More than 64 fields
    Large(Vec<u64>),
}

impl Default for FieldSetInner {
    fn default() -> Self {
        FieldSetInner::Small(0)
    }
}

impl FieldSet {
    const BITS_PER_WORD: usize = 64;

    /// Creates a set with room for `count` fields, none of them assigned.
    #[inline]
    pub fn new(count: usize) -> Self {
        if count <= Self::BITS_PER_WORD {
            Self {
                inner: FieldSetInner::Small(0),
            }
        } else {
            let num_words = count.div_ceil(Self::BITS_PER_WORD);
            Self {
                inner: FieldSetInner::Large(alloc::vec![0; num_words]),
            }
        }
    }

    /// Marks field `index` as assigned.
    #[inline]
    pub fn set(&mut self, index: usize) {
        match &mut self.inner {
            FieldSetInner::Small(flags) => {
                debug_assert!(
                    index < Self::BITS_PER_WORD,
                    "index out of bounds for small FieldSet"
                );
                *flags |= 1u64 << index;
            }
            FieldSetInner::Large(words) => {
                let word_idx = index / Self::BITS_PER_WORD;
                let bit_idx = index % Self::BITS_PER_WORD;
                debug_assert!(
                    word_idx < words.len(),
                    "index out of bounds for large FieldSet"
                );
                words[word_idx] |= 1u64 << bit_idx;
            }
        }
    }

    /// Marks field `index` as not assigned.
    #[inline]
    pub fn unset(&mut self, index: usize) {
        match &mut self.inner {
            FieldSetInner::Small(flags) => {
                debug_assert!(
                    index < Self::BITS_PER_WORD,
                    "index out of bounds for small FieldSet"
                );
                *flags &= !(1u64 << index);
            }
            FieldSetInner::Large(words) => {
                let word_idx = index / Self::BITS_PER_WORD;
                let bit_idx = index % Self::BITS_PER_WORD;
                debug_assert!(
                    word_idx < words.len(),
                    "index out of bounds for large FieldSet"
                );
                words[word_idx] &= !(1u64 << bit_idx);
            }
        }
    }

    /// Whether field `index` was assigned.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        match &self.inner {
            FieldSetInner::Small(flags) => {
                index < Self::BITS_PER_WORD && (*flags & (1u64 << index)) != 0
            }
            FieldSetInner::Large(words) => {
                let word_idx = index / Self::BITS_PER_WORD;
                let bit_idx = index % Self::BITS_PER_WORD;
                words
                    .get(word_idx)
                    .is_some_and(|word| (word & (1u64 << bit_idx)) != 0)
            }
        }
    }
}
