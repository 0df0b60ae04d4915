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

//! The access-lattice collaborator: the join-semilattice `BloomMap` values
//! live in.
//!
//! A classical Bloom filter is the special case where the lattice is
//! [`BoolLattice`] (`{false, true}`, ordered `false < true`). `BloomMap`
//! generalizes `BloomSet` by parameterizing over any bounded-below
//! join-semilattice, which is what lets a single `put`/`getSupremum`
//! implementation serve both a classical set and, e.g., an "approximate
//! maximum seen per key" sketch ([`BoundedIntLattice`]).

mod bool_lattice;
mod bounded_integer;

pub use self::bool_lattice::BoolLattice;
pub use self::bounded_integer::BoundedIntLattice;

use std::any::Any;
use std::rc::Rc;

/// A bounded-below join-semilattice over `V`.
///
/// Every `BloomMap` is parameterized by one of these. The trait is
/// object-safe (all methods take `&self`/`&V` and return owned `V` or
/// `bool`) so that `Rc<dyn Lattice<V>>` can serve as the type-erased
/// access-lattice `BloomMap::bounds()` compares for compatibility, and so
/// [`bounded_above`] can wrap an already-type-erased lattice without needing
/// to know its concrete type.
///
/// Implementors only need `join`, `top`, `bottom`, and `is_ordered`; `meet`
/// is provided for lattices that are genuinely bounded (both above and
/// below) and is used by [`bounded_above`]'s cap computation — a lattice
/// that has no meaningful meet (only a partial one) may implement it as a
/// saturating approximation, since this crate never calls it except through
/// `bounded_above`.
pub trait Lattice<V> {
    /// The greatest element, or the least upper bound of all values this
    /// lattice admits. `BloomSet`'s "set bit" and `boundedAbove`'s cap both
    /// reduce to this.
    fn top(&self) -> V;

    /// The least element. Every value placed into a `BloomMap` starts a
    /// fresh cell at this value.
    fn bottom(&self) -> V;

    /// The least upper bound of `a` and `b`. `put` repeatedly joins a key's
    /// current per-index value with the incoming value.
    fn join(&self, a: &V, b: &V) -> V;

    /// The greatest lower bound of `a` and `b`, where meaningful. Used by
    /// [`bounded_above`] to clamp joined values to a cap.
    fn meet(&self, a: &V, b: &V) -> V;

    /// Whether `a` is less than or equal to `b` in this lattice's partial
    /// order. `mightContain`/`getSupremum`-style queries reduce to this.
    fn is_ordered(&self, a: &V, b: &V) -> bool;

    /// Value-level equivalence. Kept separate from requiring a global
    /// `V: PartialEq` bound, since two lattice elements can be equal under
    /// this lattice's notion of identity without `V` itself being
    /// comparable (e.g. a lattice over a wrapper type with irrelevant
    /// metadata fields).
    fn values_equal(&self, a: &V, b: &V) -> bool {
        self.is_ordered(a, b) && self.is_ordered(b, a)
    }

    /// Whether this lattice has a genuine least element (vs. an unbounded
    /// descending chain). `Factory::new_map` rejects lattices that answer
    /// `false` here — a `BloomMap` cell must always have somewhere to start.
    fn is_bounded_below(&self) -> bool {
        true
    }

    /// Whether `v` lies within this lattice, i.e. `bottom <= v <= top`.
    /// `BloomMap::put` rejects a value for which this is false.
    fn contains(&self, v: &V) -> bool {
        self.is_ordered(&self.bottom(), v) && self.is_ordered(v, &self.top())
    }

    /// The top of the *store* lattice this access-lattice ultimately derives
    /// from — equal to `top()` except for a [`BoundedAboveLattice`], whose
    /// own `top()` is the narrower cap `u`. `BloomMap::is_full` needs this:
    /// fullness is checked against the store-lattice top, not whatever cap a
    /// `bounded_above` view happens to read through.
    fn root_top(&self) -> V {
        self.top()
    }

    /// Type-erased equality, used to compare two `Rc<dyn Lattice<V>>`
    /// instances for `BloomMap::bounds()` compatibility without requiring
    /// `Self: PartialEq` to be object-safe on its own.
    fn dyn_eq(&self, other: &dyn Lattice<V>) -> bool;

    /// Supports the `dyn_eq` downcast.
    fn as_any(&self) -> &dyn Any;
}

impl<V> PartialEq for dyn Lattice<V> {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other)
    }
}

// `Rc<dyn Lattice<V>>` gets `PartialEq` for free from std's blanket
// `impl<T: ?Sized + PartialEq> PartialEq for Rc<T>`, dispatching to the
// `dyn Lattice<V>` impl above (and so to `dyn_eq`) — a second manual impl
// here would conflict with it.

/// A sub-lattice combinator implementing `BloomMap::bounded_above(u)`: every
/// value is capped at `u`, so this lattice's top is `u` rather than the
/// parent's top.
///
/// `bounded_above` must return the *same kind of thing* (another lattice
/// usable to build a `BloomMap`) regardless of how many times it's nested —
/// `BoundedAboveLattice` wraps its parent as `Rc<dyn Lattice<V>>` rather than
/// a generic parameter precisely so that `bounded_above(bounded_above(l,
/// u1), u2)` has the same type as `bounded_above(l, u1)`.
pub struct BoundedAboveLattice<V> {
    parent: Rc<dyn Lattice<V>>,
    cap: V,
}

impl<V> BoundedAboveLattice<V> {
    /// Wraps `parent`, capping every value at `cap`.
    ///
    /// `cap` must satisfy `parent.is_ordered(parent.bottom(), cap)`; this is
    /// validated by the caller (`BloomMap::bounded_above`), not here, since
    /// enforcing it requires `Result`-returning construction, and the
    /// `InvalidArgument` rejection belongs on the `BloomMap` method rather
    /// than the lattice constructor.
    pub fn new(parent: Rc<dyn Lattice<V>>, cap: V) -> Self {
        BoundedAboveLattice { parent, cap }
    }
}

impl<V: Clone + 'static> Lattice<V> for BoundedAboveLattice<V> {
    fn top(&self) -> V {
        self.cap.clone()
    }

    fn bottom(&self) -> V {
        self.parent.bottom()
    }

    fn join(&self, a: &V, b: &V) -> V {
        // Deliberately uncapped: a bounded_above view's writes perform their
        // join in the store lattice, which may push a cell above `cap`. Only
        // reads (`top()`/`root_top()`-mediated) clamp; see
        // `BloomMap::get_supremum`.
        self.parent.join(a, b)
    }

    fn meet(&self, a: &V, b: &V) -> V {
        self.parent.meet(a, b)
    }

    fn is_ordered(&self, a: &V, b: &V) -> bool {
        self.parent.is_ordered(a, b)
    }

    fn is_bounded_below(&self) -> bool {
        self.parent.is_bounded_below()
    }

    fn root_top(&self) -> V {
        self.parent.root_top()
    }

    fn dyn_eq(&self, other: &dyn Lattice<V>) -> bool {
        match other.as_any().downcast_ref::<BoundedAboveLattice<V>>() {
            Some(o) => self.parent.dyn_eq(o.parent.as_ref()) && self.parent.values_equal(&self.cap, &o.cap),
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A lattice with no least element, kept only so tests can exercise the
/// `InvalidArgument` rejection path `Factory::new_map` takes when handed a
/// lattice that is not bounded below. Not exported outside the crate.
#[cfg(test)]
pub(crate) struct UnboundedBelowLattice;

#[cfg(test)]
impl Lattice<i64> for UnboundedBelowLattice {
    fn top(&self) -> i64 {
        i64::MAX
    }

    fn bottom(&self) -> i64 {
        i64::MIN
    }

    fn join(&self, a: &i64, b: &i64) -> i64 {
        (*a).max(*b)
    }

    fn meet(&self, a: &i64, b: &i64) -> i64 {
        (*a).min(*b)
    }

    fn is_ordered(&self, a: &i64, b: &i64) -> bool {
        a <= b
    }

    fn is_bounded_below(&self) -> bool {
        false
    }

    fn dyn_eq(&self, other: &dyn Lattice<i64>) -> bool {
        other.as_any().downcast_ref::<UnboundedBelowLattice>().is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// `BoundedAboveLattice` and `UnboundedBelowLattice` combinator behavior is
// exercised in `bounded_integer`'s test module, where a concrete lattice
// (`BoundedIntLattice`) is available to wrap.
