//! One-bit-per-element mask packed into a `Vec<u64>`.

/// A fixed-length array of booleans stored one bit per element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitMask {
    /// Raw storage. Element `i` lives in bit `i % 64` of word `i / 64`.
    words: Vec<u64>,
    /// Total number of logical elements.
    len: usize,
}

impl BitMask {
    /// Creates a mask of `len` elements, all cleared.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0u64; len.div_ceil(64)],
            len,
        }
    }

    /// Creates a mask of `len` elements, all set.
    pub fn filled(len: usize) -> Self {
        let mut mask = Self {
            words: vec![u64::MAX; len.div_ceil(64)],
            len,
        };
        mask.clear_tail();
        mask
    }

    /// Returns the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len` in debug builds.
    #[inline]
    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len, "index out of bounds");
        (self.words[index / 64] >> (index % 64)) & 1 == 1
    }

    /// Sets or clears the bit at `index`.
    #[inline]
    pub fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.len, "index out of bounds");
        let bit = 1u64 << (index % 64);
        if value {
            self.words[index / 64] |= bit;
        } else {
            self.words[index / 64] &= !bit;
        }
    }

    /// Number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Number of logical elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the mask has no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the backing storage in bytes.
    pub fn storage_bytes(&self) -> usize {
        self.words.len() * 8
    }

    fn clear_tail(&mut self) {
        let used = self.len % 64;
        if used != 0
            && let Some(last) = self.words.last_mut()
        {
            *last &= (1u64 << used) - 1;
        }
    }
}
