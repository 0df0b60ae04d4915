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

use std::any::Any;

use super::Lattice;

/// A totally-ordered integer range `[lo, hi]`, joined by `max` and met by
/// `min`.
///
/// This is the lattice behind an "approximate maximum value seen per key"
/// sketch: a `BloomMap<K, i64, BoundedIntLattice>` records, for each key, an
/// overapproximation of the greatest value ever `put` for it (an
/// overapproximation because index collisions can only push a cell's value
/// up, never down).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundedIntLattice {
    lo: i64,
    hi: i64,
}

impl BoundedIntLattice {
    /// Builds the lattice `[lo, hi]`.
    ///
    /// # Panics
    ///
    /// Panics if `lo > hi` — a programmer error at construction time, not a
    /// runtime condition worth a `Result` for.
    pub fn new(lo: i64, hi: i64) -> Self {
        assert!(lo <= hi, "lattice range is empty: lo={lo} > hi={hi}");
        BoundedIntLattice { lo, hi }
    }

    /// The lower bound of the range.
    pub fn lo(&self) -> i64 {
        self.lo
    }

    /// The upper bound of the range.
    pub fn hi(&self) -> i64 {
        self.hi
    }
}

impl Lattice<i64> for BoundedIntLattice {
    fn top(&self) -> i64 {
        self.hi
    }

    fn bottom(&self) -> i64 {
        self.lo
    }

    fn join(&self, a: &i64, b: &i64) -> i64 {
        (*a).max(*b).min(self.hi)
    }

    fn meet(&self, a: &i64, b: &i64) -> i64 {
        (*a).min(*b).max(self.lo)
    }

    fn is_ordered(&self, a: &i64, b: &i64) -> bool {
        a <= b
    }

    fn dyn_eq(&self, other: &dyn Lattice<i64>) -> bool {
        match other.as_any().downcast_ref::<BoundedIntLattice>() {
            Some(o) => self == o,
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::lattice::BoundedAboveLattice;
    use crate::lattice::UnboundedBelowLattice;

    #[test]
    fn join_is_clamped_max() {
        let l = BoundedIntLattice::new(0, 100);
        assert_eq!(l.join(&10, &40), 40);
        assert_eq!(l.join(&10, &1_000), 100);
    }

    #[test]
    fn meet_is_clamped_min() {
        let l = BoundedIntLattice::new(0, 100);
        assert_eq!(l.meet(&10, &40), 10);
        assert_eq!(l.meet(&-5, &40), 0);
    }

    #[test]
    fn bounded_above_narrows_top_but_not_join() {
        let base: Rc<dyn Lattice<i64>> = Rc::new(BoundedIntLattice::new(0, 1_000));
        let capped = BoundedAboveLattice::new(Rc::clone(&base), 50);
        assert_eq!(capped.top(), 50);
        assert_eq!(capped.root_top(), 1_000);
        assert_eq!(capped.bottom(), 0);
        // join is performed in the store lattice and may exceed the cap;
        // only reads (top()/root_top()) clamp.
        assert_eq!(capped.join(&40, &60), 60);
        assert_eq!(capped.join(&10, &20), 20);
    }

    #[test]
    fn bounded_above_equality_compares_parent_and_cap() {
        let base: Rc<dyn Lattice<i64>> = Rc::new(BoundedIntLattice::new(0, 1_000));
        let a = BoundedAboveLattice::new(Rc::clone(&base), 50);
        let b = BoundedAboveLattice::new(Rc::clone(&base), 50);
        let c = BoundedAboveLattice::new(Rc::clone(&base), 60);
        assert!(a.dyn_eq(&b));
        assert!(!a.dyn_eq(&c));
    }

    #[test]
    fn unbounded_below_reports_not_bounded() {
        let l = UnboundedBelowLattice;
        assert!(!l.is_bounded_below());
    }
}
