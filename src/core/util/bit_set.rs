// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

use core::search::NO_MORE_DOCS;
use core::util::{Bits, DocId};

use error::Result;

/// BitSet of fixed length (num_bits), backed by a `Vec<i64>`, accessed with
/// an int index, implementing `Bits`.
#[derive(Clone, Debug)]
pub struct FixedBitSet {
    // Array of longs holding the bits
    pub bits: Vec<i64>,
    // The number of bits in use
    pub num_bits: usize,
    // The exact number of longs needed to hold num_bits
    pub num_words: usize,
}

impl Default for FixedBitSet {
    fn default() -> Self {
        FixedBitSet {
            bits: Vec::with_capacity(0),
            num_bits: 0,
            num_words: 0,
        }
    }
}

impl FixedBitSet {
    pub fn new(num_bits: usize) -> FixedBitSet {
        let num_words = bits2words(num_bits);
        let bits = vec![0; num_words];
        FixedBitSet {
            num_bits,
            bits,
            num_words,
        }
    }

    #[inline]
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < self.num_bits);
        let word_num = index >> 6;
        let mask = 1i64 << (index & 0x3fusize);
        self.bits[word_num] |= mask;
    }

    pub fn clear(&mut self, index: usize) {
        debug_assert!(index < self.num_bits);
        let word = index >> 6;
        let mask = !(1i64 << (index & 0x3fusize));
        self.bits[word] &= mask;
    }

    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        debug_assert!(index < self.num_bits);
        let mask = 1i64 << (index & 0x3fusize);
        self.bits[index >> 6] & mask != 0
    }

    pub fn cardinality(&self) -> usize {
        self.bits[..self.num_words]
            .iter()
            .map(|w| w.count_ones() as usize)
            .sum()
    }

    /// Returns the index of the first set bit starting at the index specified.
    /// `NO_MORE_DOCS` is returned if there are no more set bits.
    pub fn next_set_bit(&self, index: usize) -> DocId {
        if index >= self.num_bits {
            return NO_MORE_DOCS;
        }
        let mut i = index >> 6;
        // skip all the bits to the right of index
        let word = (self.bits[i] as u64) >> (index & 0x3fusize);
        if word != 0 {
            return (index as u32 + word.trailing_zeros()) as DocId;
        }
        i += 1;
        while i < self.num_words {
            let word = self.bits[i];
            if word != 0 {
                return ((i << 6) as u32 + word.trailing_zeros()) as DocId;
            }
            i += 1;
        }
        NO_MORE_DOCS
    }
}

impl Bits for FixedBitSet {
    #[inline]
    fn get(&self, index: usize) -> Result<bool> {
        Ok(self.is_set(index))
    }

    fn len(&self) -> usize {
        self.num_bits
    }
}

/// returns the number of 64 bit words it would take to hold num_bits
pub fn bits2words(num_bits: usize) -> usize {
    // get the word-offset of the last bit and add one
    (num_bits + 63) >> 6
}
