// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Word-packed bit set backing the allocator's live-set.

#[derive(Debug, Clone, Default)]
pub struct BitSet {
    words: Vec<u64>,
}

impl BitSet {
    /// Create a new BitSet capable of holding at least `capacity` bits.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
        }
    }

    /// Set the bit at `index`, growing the word vector when needed.
    pub fn insert(&mut self, index: usize) {
        let (word, bit) = (index / 64, index % 64);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << bit;
    }

    /// Clear the bit at `index`. Returns whether it was set.
    pub fn remove(&mut self, index: usize) -> bool {
        let (word, bit) = (index / 64, index % 64);
        match self.words.get_mut(word) {
            Some(w) if *w & (1 << bit) != 0 => {
                *w &= !(1 << bit);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        let (word, bit) = (index / 64, index % 64);
        self.words
            .get(word)
            .is_some_and(|w| w & (1 << bit) != 0)
    }

    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
    }

    /// Indices of set bits in ascending order
    pub fn ones(&self) -> Ones<'_> {
        Ones {
            words: &self.words,
            word_idx: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }
}

pub struct Ones<'a> {
    words: &'a [u64],
    word_idx: usize,
    current: u64,
}

impl Iterator for Ones<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current != 0 {
                let trailing = self.current.trailing_zeros();
                self.current &= self.current - 1;
                return Some(self.word_idx * 64 + trailing as usize);
            }

            self.word_idx += 1;
            self.current = *self.words.get(self.word_idx)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove_contains() {
        let mut bits = BitSet::with_capacity(8);
        bits.insert(3);
        bits.insert(130);
        assert!(bits.contains(3));
        assert!(bits.contains(130));
        assert!(!bits.contains(4));
        assert_eq!(bits.ones().collect::<Vec<_>>(), vec![3, 130]);

        assert!(bits.remove(3));
        assert!(!bits.remove(3));
        assert!(!bits.remove(10_000));
        assert_eq!(bits.ones().collect::<Vec<_>>(), vec![130]);
    }

    #[test]
    fn test_ones_ascending() {
        let mut bits = BitSet::default();
        for i in [70, 1, 64, 5] {
            bits.insert(i);
        }
        assert_eq!(bits.ones().collect::<Vec<_>>(), vec![1, 5, 64, 70]);

        bits.clear();
        assert_eq!(bits.ones().count(), 0);
    }
}
