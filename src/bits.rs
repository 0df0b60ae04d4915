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

//! The bit-store collaborator and the live views built on top of it.
//!
//! [`BitView`] is the read-only contract every live view of a `BloomSet`
//! presents, whether it is backed by an owned [`BitStoreData`], derives from
//! another view via [`boundedBy`](crate::set::BloomSet::bounded_by), or
//! projects a `BloomMap`'s value store (see `crate::map::ProjectionView`).
//! Keeping this as a trait object (`Rc<dyn BitView>`) rather than a generic
//! parameter is what lets `boundedBy` nest to arbitrary depth without each
//! nesting level adding a new concrete `BloomSet` type.

use std::cell::Cell;
use std::rc::Rc;

const WORD_BITS: usize = u64::BITS as usize;

/// Read-only access to a fixed-length array of bits and its running
/// population count.
///
/// Every method here must be O(1) (or O(word size) for `get`/`set`), since
/// `might_contain` and `add` are both meant to run in O(hash_count) time.
pub trait BitView {
    /// Number of bits this view covers.
    fn len(&self) -> usize;

    /// Whether bit `index` is set. Panics if `index >= self.len()`.
    fn get(&self, index: usize) -> bool;

    /// Number of set bits, i.e. `popcount`.
    fn count_ones(&self) -> usize;

    /// Convenience: `self.len() == 0`.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every bit is set.
    fn is_full(&self) -> bool {
        self.count_ones() == self.len()
    }
}

/// An owned, word-packed bit array with an O(1) running one-count.
///
/// A `Vec<u64>` bit array plus a maintained population count, updated
/// incrementally by `set` rather than recomputed by a full scan on every
/// query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitStoreData {
    words: Vec<u64>,
    len: usize,
    ones: usize,
}

impl BitStoreData {
    /// Creates a bit store of `len` bits, all clear.
    pub fn new(len: usize) -> Self {
        let word_count = len.div_ceil(WORD_BITS);
        BitStoreData {
            words: vec![0u64; word_count],
            len,
            ones: 0,
        }
    }

    /// Sets bit `index`, returning whether it was previously clear (i.e.
    /// whether this call changed the store).
    ///
    /// This is the collaborator-level primitive every `add` is built from:
    /// `add`'s "did this mutate" boolean return comes straight from this
    /// call's return value.
    pub fn set(&mut self, index: usize) -> bool {
        assert!(index < self.len, "bit index {index} out of range {}", self.len);
        let word = index / WORD_BITS;
        let bit = index % WORD_BITS;
        let mask = 1u64 << bit;
        let was_set = self.words[word] & mask != 0;
        if !was_set {
            self.words[word] |= mask;
            self.ones += 1;
        }
        !was_set
    }

    /// Clears every bit.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|w| *w = 0);
        self.ones = 0;
    }

    /// Sets every bit.
    pub fn fill(&mut self) {
        for i in 0..self.len {
            self.set(i);
        }
    }
}

impl BitView for BitStoreData {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> bool {
        assert!(index < self.len, "bit index {index} out of range {}", self.len);
        let word = index / WORD_BITS;
        let bit = index % WORD_BITS;
        self.words[word] & (1u64 << bit) != 0
    }

    fn count_ones(&self) -> usize {
        self.ones
    }
}

/// The live, derived view backing `bounded_by`.
///
/// A set bounded-by another is read-only and reports, at every index,
/// whether the backing set's bit is *implied by* the bound's bit — i.e. the
/// derived view's bit `i` is `!backing[i] || bound[i]`. A backing set is
/// therefore "contained in" its bound exactly when every bit of this view is
/// set, which is what makes `is_full()` on a `bounded_by` view double as a
/// subset check.
///
/// Both operands are held as `Rc<dyn BitView>` rather than a concrete type so
/// that `bounded_by` views themselves can be the backing of a further
/// `bounded_by` call — nesting depth is unbounded and doesn't show up in the
/// type.
pub struct ImpliesView {
    backing: Rc<dyn BitView>,
    bound: Rc<dyn BitView>,
}

impl ImpliesView {
    /// Builds the live view of `backing` as bounded by `bound`.
    ///
    /// Both views must have equal `len()`; this is enforced by the caller
    /// (`BloomSet::bounded_by`) via the `BloomConfig` compatibility check
    /// before this is ever constructed.
    pub fn new(backing: Rc<dyn BitView>, bound: Rc<dyn BitView>) -> Self {
        debug_assert_eq!(backing.len(), bound.len());
        ImpliesView { backing, bound }
    }
}

impl BitView for ImpliesView {
    fn len(&self) -> usize {
        self.backing.len()
    }

    fn get(&self, index: usize) -> bool {
        !self.backing.get(index) || self.bound.get(index)
    }

    fn count_ones(&self) -> usize {
        // No O(1) incremental count is maintained for a derived view;
        // nothing calls `false_positive_probability` or any other
        // count-dependent operation on a `bounded_by` result, so a linear
        // scan here is acceptable (and matches `is_full`'s short-circuiting
        // use in practice, since `is_empty`/`is_full` are the only callers).
        (0..self.len()).filter(|&i| self.get(i)).count()
    }
}

/// A lazily-memoized wrapper around any `BitView`, caching `count_ones()`
/// after the first call.
///
/// Used where a derived view (like [`ImpliesView`]) is queried for fullness
/// repeatedly (e.g. in a test loop) and recomputing the popcount every time
/// would be wasteful, without requiring every `BitView` implementor to carry
/// its own cache.
pub struct MemoizedCount<V> {
    inner: V,
    cached: Cell<Option<usize>>,
}

impl<V: BitView> MemoizedCount<V> {
    /// Wraps `inner`, deferring the first popcount until it's asked for.
    pub fn new(inner: V) -> Self {
        MemoizedCount {
            inner,
            cached: Cell::new(None),
        }
    }
}

impl<V: BitView> BitView for MemoizedCount<V> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, index: usize) -> bool {
        self.inner.get(index)
    }

    fn count_ones(&self) -> usize {
        if let Some(c) = self.cached.get() {
            return c;
        }
        let c = self.inner.count_ones();
        self.cached.set(Some(c));
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_change() {
        let mut store = BitStoreData::new(64);
        assert!(store.set(3));
        assert!(!store.set(3));
        assert_eq!(store.count_ones(), 1);
    }

    #[test]
    fn spans_multiple_words() {
        let mut store = BitStoreData::new(200);
        for i in 0..200 {
            store.set(i);
        }
        assert!(store.is_full());
        assert_eq!(store.count_ones(), 200);
    }

    #[test]
    fn clear_resets_count() {
        let mut store = BitStoreData::new(10);
        store.set(0);
        store.set(5);
        store.clear();
        assert_eq!(store.count_ones(), 0);
        assert!(!store.get(5));
    }

    #[test]
    fn implies_view_is_full_when_backing_subset_of_bound() {
        let mut a = BitStoreData::new(8);
        let mut b = BitStoreData::new(8);
        a.set(1);
        a.set(2);
        b.set(1);
        b.set(2);
        b.set(3);
        let view = ImpliesView::new(Rc::new(a), Rc::new(b));
        assert!(view.is_full());
    }

    #[test]
    fn implies_view_not_full_when_backing_has_extra_bit() {
        let mut a = BitStoreData::new(8);
        let b = BitStoreData::new(8);
        a.set(4);
        let view = ImpliesView::new(Rc::new(a), Rc::new(b));
        assert!(!view.is_full());
        assert!(!view.get(4));
    }

    #[test]
    fn memoized_count_caches() {
        let mut store = BitStoreData::new(4);
        store.set(0);
        let memo = MemoizedCount::new(store);
        assert_eq!(memo.count_ones(), 1);
        assert_eq!(memo.count_ones(), 1);
    }
}
