//! Open-addressing hash accumulator
//!
//! The table is sized to at least twice the row's column limit, so a probe
//! sequence always reaches an empty bucket. Between rows only the buckets
//! that were used are cleared.

use crate::accumulator::{ColumnAccumulator, Slot};

const EMPTY: usize = usize::MAX;
const MIN_TABLE_SIZE: usize = 16;
const FIBONACCI: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct HashAccumulator {
    /// Column stored in each bucket, or `EMPTY`
    keys: Vec<usize>,
    /// Slot assigned to the column in each bucket
    slots: Vec<usize>,
    /// Buckets used by the current row
    used: Vec<usize>,
    /// Columns of the current row in slot order
    col_indices: Vec<usize>,
    /// log2 of the table size
    bits: u32,
    limit: usize,
}

impl HashAccumulator {
    /// Creates a table able to hold `capacity` distinct columns without growing
    pub fn with_capacity(capacity: usize) -> Self {
        let size = table_size(capacity);
        Self {
            keys: vec![EMPTY; size],
            slots: vec![0; size],
            used: Vec::with_capacity(capacity),
            col_indices: Vec::with_capacity(capacity),
            bits: size.trailing_zeros(),
            limit: capacity,
        }
    }

    fn bucket(&self, col: usize) -> usize {
        ((col as u64).wrapping_mul(FIBONACCI) >> (64 - self.bits)) as usize
    }

    fn grow(&mut self, limit: usize) {
        let size = table_size(limit);
        self.keys = vec![EMPTY; size];
        self.slots = vec![0; size];
        self.bits = size.trailing_zeros();
    }
}

/// Smallest power of two holding `capacity` columns at load factor 1/2
fn table_size(capacity: usize) -> usize {
    capacity
        .saturating_mul(2)
        .max(MIN_TABLE_SIZE)
        .next_power_of_two()
}

impl ColumnAccumulator for HashAccumulator {
    fn reset(&mut self, limit: usize) {
        if table_size(limit) > self.keys.len() {
            self.grow(limit);
        } else {
            for &bucket in &self.used {
                self.keys[bucket] = EMPTY;
            }
        }
        self.used.clear();
        self.col_indices.clear();
        self.limit = limit;
    }

    fn insert(&mut self, col: usize) -> Option<Slot> {
        let mask = self.keys.len() - 1;
        let mut bucket = self.bucket(col);
        loop {
            match self.keys[bucket] {
                EMPTY => {
                    if self.col_indices.len() == self.limit {
                        return None;
                    }
                    let index = self.col_indices.len();
                    self.keys[bucket] = col;
                    self.slots[bucket] = index;
                    self.used.push(bucket);
                    self.col_indices.push(col);
                    return Some(Slot { index, fresh: true });
                }
                key if key == col => {
                    return Some(Slot {
                        index: self.slots[bucket],
                        fresh: false,
                    });
                }
                _ => bucket = (bucket + 1) & mask,
            }
        }
    }

    fn len(&self) -> usize {
        self.col_indices.len()
    }

    fn columns(&self) -> &[usize] {
        &self.col_indices
    }
}
