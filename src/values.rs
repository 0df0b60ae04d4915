// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! The value-store collaborator: `BloomMap`'s per-index analogue of
//! [`crate::bits::BitStoreData`].
//!
//! Where a `BloomSet` marks indices with a single bit, a `BloomMap` marks
//! each index with a lattice element. `ValueStoreData<V>` is the array that
//! holds those elements; it has no notion of the lattice's ordering itself
//! (that lives in `crate::lattice::Lattice<V>`) and is purely storage.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueStoreData<V> {
    cells: Vec<V>,
}

impl<V: Clone> ValueStoreData<V> {
    /// Creates a store of `len` cells, each initialized to `bottom`.
    pub fn new(len: usize, bottom: V) -> Self {
        ValueStoreData {
            cells: vec![bottom; len],
        }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether there are no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reads the value at `index`.
    pub fn get(&self, index: usize) -> &V {
        &self.cells[index]
    }

    /// Overwrites the value at `index`, returning the previous value.
    pub fn set(&mut self, index: usize, value: V) -> V {
        std::mem::replace(&mut self.cells[index], value)
    }

    /// Resets every cell to `bottom`.
    pub fn clear(&mut self, bottom: V) {
        self.cells.iter_mut().for_each(|c| *c = bottom.clone());
    }

    /// Iterates over every cell in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_bottom() {
        let store: ValueStoreData<i64> = ValueStoreData::new(4, 0);
        for i in 0..4 {
            assert_eq!(*store.get(i), 0);
        }
    }

    #[test]
    fn set_returns_previous() {
        let mut store: ValueStoreData<i64> = ValueStoreData::new(4, 0);
        let prev = store.set(2, 9);
        assert_eq!(prev, 0);
        assert_eq!(*store.get(2), 9);
    }

    #[test]
    fn clear_resets_all_cells() {
        let mut store: ValueStoreData<i64> = ValueStoreData::new(3, 0);
        store.set(0, 5);
        store.set(1, 7);
        store.clear(0);
        assert!(store.iter().all(|v| *v == 0));
    }
}
