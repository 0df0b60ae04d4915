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

//! `BloomMap`: the lattice-valued generalization of `BloomSet`.
//!
//! Where a `BloomSet` marks each hashed index with a single bit, a
//! `BloomMap<K, V, Ls, H>` joins a lattice value into each index a key
//! hashes to. A classical Bloom filter is the special case
//! `BloomMap<K, bool, BoolLattice, H>`; `BloomSet` is kept as its own type
//! only because that specialization is common enough to deserve an
//! ergonomic name and a bit-packed (rather than `Vec<bool>`-packed) store.

use std::cell::RefCell;
use std::rc::Rc;

use crate::bits::BitView;
use crate::config::BloomConfig;
use crate::error::Error;
use crate::hash::KeyHasher;
use crate::hash::Murmur3Hasher;
use crate::lattice::BoundedAboveLattice;
use crate::lattice::Lattice;
use crate::set::BloomSet;
use crate::set::ProjectionWriter;
use crate::values::ValueStoreData;

/// Joins `value` into every index `indices` yields, in order, mutating
/// `store` as it goes. Returns the meet (over `lattice`, starting from
/// `lattice.top()`) of each index's value *before* that index's own write —
/// the supremum `getSupremum` would have reported for this key immediately
/// before this call.
///
/// A single sequential pass, not a two-phase read-then-write split: if the
/// same index occurs twice in one key's index stream, the second visit sees
/// the first visit's write rather than the value from before this call
/// started.
fn put_over<V: Clone>(
    lattice: &dyn Lattice<V>,
    store: &mut ValueStoreData<V>,
    indices: impl Iterator<Item = usize>,
    value: &V,
) -> V {
    let mut previous = lattice.top();
    for i in indices {
        let old = store.get(i).clone();
        previous = lattice.meet(&previous, &old);
        let joined = lattice.join(value, &old);
        store.set(i, joined);
    }
    previous
}

/// The meet, over `lattice` starting from `lattice.top()`, of the values at
/// `indices`. Shared by `BloomMap::get_supremum` and `put_over`'s "previous"
/// computation so the two always agree on what supremum a given set of
/// cells represents.
fn supremum_over<V: Clone>(lattice: &dyn Lattice<V>, store: &ValueStoreData<V>, indices: impl Iterator<Item = usize>) -> V {
    let mut acc = lattice.top();
    for i in indices {
        acc = lattice.meet(&acc, store.get(i));
    }
    acc
}

/// Which membership predicate a [`ProjectionView`] reports.
enum ProjectionMode {
    /// `keys()`: true wherever a cell has moved off `bottom`.
    AboveBottom,
    /// `asBloomSet()`: true wherever a cell has reached `top`.
    AtTop,
}

/// The `BitView` backing both `BloomMap::keys()` and
/// `BloomMap::as_bloom_set()`. Both projections read the same underlying
/// value store; they differ only in which predicate over a cell's value
/// they report, which is exactly [`ProjectionMode`].
struct ProjectionView<V, Ls> {
    cell: Rc<RefCell<ValueStoreData<V>>>,
    lattice: Rc<Ls>,
    mode: ProjectionMode,
}

impl<V: 'static, Ls: Lattice<V> + 'static> BitView for ProjectionView<V, Ls> {
    fn len(&self) -> usize {
        self.cell.borrow().len()
    }

    fn get(&self, index: usize) -> bool {
        let store = self.cell.borrow();
        let value = store.get(index);
        match self.mode {
            ProjectionMode::AboveBottom => !self.lattice.values_equal(value, &self.lattice.bottom()),
            ProjectionMode::AtTop => self.lattice.values_equal(value, &self.lattice.top()),
        }
    }

    fn count_ones(&self) -> usize {
        (0..self.len()).filter(|&i| self.get(i)).count()
    }
}

/// A compact approximator: a lattice-valued generalization of `BloomSet`.
pub struct BloomMap<K: ?Sized, V, Ls: Lattice<V>, H: KeyHasher<K> = Murmur3Hasher<K>> {
    config: Rc<BloomConfig<K, H>>,
    lattice: Rc<Ls>,
    cell: Rc<RefCell<ValueStoreData<V>>>,
    mutable: bool,
    as_bloom_set_cache: RefCell<Option<BloomSet<K, H>>>,
}

impl<K: ?Sized, V: Clone, Ls: Lattice<V>, H: KeyHasher<K>> Clone for BloomMap<K, V, Ls, H> {
    fn clone(&self) -> Self {
        BloomMap {
            config: Rc::clone(&self.config),
            lattice: Rc::clone(&self.lattice),
            cell: Rc::clone(&self.cell),
            mutable: self.mutable,
            as_bloom_set_cache: RefCell::new(self.as_bloom_set_cache.borrow().clone()),
        }
    }
}

impl<K: ?Sized, V, Ls: Lattice<V>, H: KeyHasher<K>> std::fmt::Debug for BloomMap<K, V, Ls, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomMap")
            .field("capacity", &self.config.capacity())
            .field("hash_count", &self.config.hash_count())
            .field("mutable", &self.mutable)
            .finish()
    }
}

impl<K: ?Sized, V: std::hash::Hash, Ls: Lattice<V>, H: KeyHasher<K>> std::hash::Hash for BloomMap<K, V, Ls, H> {
    /// Hashes `config` and every cell's value, in index order. `equals`
    /// additionally requires the access lattice to match, but two maps with
    /// an equal value store hash equally here regardless of lattice — equal
    /// values still hash equal, which is all `Hash`/`Eq` requires.
    fn hash<St: std::hash::Hasher>(&self, state: &mut St) {
        self.config.capacity().hash(state);
        self.config.hash_count().hash(state);
        let store = self.cell.borrow();
        for i in 0..store.len() {
            store.get(i).hash(state);
        }
    }
}

impl<K: ?Sized, V: 'static, Ls: Lattice<V> + 'static, H: KeyHasher<K>> BloomMap<K, V, Ls, H> {
    /// Builds a fresh, mutable map over `lattice`, every cell starting at
    /// `lattice.bottom()`.
    pub(crate) fn new_owned(config: Rc<BloomConfig<K, H>>, lattice: Rc<Ls>) -> Self {
        let capacity = config.capacity();
        let bottom = lattice.bottom();
        Self::new_owned_with_store(config, lattice, ValueStoreData::new(capacity, bottom))
    }

    /// Builds a fresh, mutable map over `lattice`, adopting `store` as its
    /// value array instead of allocating one — `store`'s length must already
    /// equal `config`'s capacity.
    pub(crate) fn new_owned_with_store(config: Rc<BloomConfig<K, H>>, lattice: Rc<Ls>, store: ValueStoreData<V>) -> Self {
        BloomMap {
            config,
            lattice,
            cell: Rc::new(RefCell::new(store)),
            mutable: true,
            as_bloom_set_cache: RefCell::new(None),
        }
    }

    fn new_view(
        config: Rc<BloomConfig<K, H>>,
        lattice: Rc<Ls>,
        cell: Rc<RefCell<ValueStoreData<V>>>,
        mutable: bool,
    ) -> Self {
        BloomMap {
            config,
            lattice,
            cell,
            mutable,
            as_bloom_set_cache: RefCell::new(None),
        }
    }

    pub(crate) fn config(&self) -> &Rc<BloomConfig<K, H>> {
        &self.config
    }

    /// Whether this handle permits `put`.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// A read-only view sharing this map's storage.
    pub fn immutable_view(&self) -> Self {
        Self::new_view(
            Rc::clone(&self.config),
            Rc::clone(&self.lattice),
            Rc::clone(&self.cell),
            false,
        )
    }

    /// An independent, read-only snapshot of this map's current values.
    pub fn immutable_copy(&self) -> Self
    where
        V: Clone,
    {
        self.copy_with_mutability(false)
    }

    /// An independent, mutable snapshot of this map's current values.
    pub fn mutable_copy(&self) -> Self
    where
        V: Clone,
    {
        self.copy_with_mutability(true)
    }

    fn copy_with_mutability(&self, mutable: bool) -> Self
    where
        V: Clone,
    {
        let store = self.cell.borrow();
        let mut data = ValueStoreData::new(store.len(), self.lattice.bottom());
        for i in 0..store.len() {
            data.set(i, store.get(i).clone());
        }
        Self::new_view(
            Rc::clone(&self.config),
            Rc::clone(&self.lattice),
            Rc::new(RefCell::new(data)),
            mutable,
        )
    }

    /// Joins `value` into every index `key` hashes to, returning the
    /// supremum this map would have reported for `key` immediately *before*
    /// this call (i.e. what `get_supremum(key)` would have returned).
    ///
    /// # Errors
    ///
    /// Returns `Immutable` if this handle cannot mutate, or `InvalidArgument`
    /// if `value` does not lie within the access lattice (`bottom <= value
    /// <= top`).
    pub fn put(&self, key: &K, value: V) -> Result<V, Error>
    where
        V: Clone,
    {
        if !self.mutable {
            return Err(Error::immutable("put"));
        }
        if !self.lattice.contains(&value) {
            return Err(Error::invalid_argument("value lies outside the access lattice"));
        }
        let indices: Vec<usize> = self.config.indices_for(key).collect();
        let mut store = self.cell.borrow_mut();
        Ok(put_over(self.lattice.as_ref(), &mut store, indices.into_iter(), &value))
    }

    /// The tightest upper bound this sketch can prove for `key`: the meet,
    /// across every index `key` hashes to, of that index's recorded value
    /// (starting from `top(L_a)`, so a `boundedAbove` view's cap is honored
    /// even though the backing store itself may hold higher values — see
    /// [`Self::bounded_above`]).
    ///
    /// Each individual cell is itself an over-approximation (it may also
    /// hold contributions joined in by other keys colliding on that index),
    /// so the meet across all of a key's indices is the most precise bound
    /// derivable from the sketch — still guaranteed to be `>=` the true
    /// value, by the same argument that makes a classical Bloom filter free
    /// of false negatives.
    pub fn get_supremum(&self, key: &K) -> V
    where
        V: Clone,
    {
        let store = self.cell.borrow();
        supremum_over(self.lattice.as_ref(), &store, self.config.indices_for(key))
    }

    /// Whether `key` might have been `put`: true iff none of the `hashCount`
    /// indexed cells still sit at `bottom(L_s)`.
    pub fn might_contain(&self, key: &K) -> bool {
        let store = self.cell.borrow();
        let bottom = self.lattice.bottom();
        self.config.indices_for(key).all(|i| !self.lattice.values_equal(store.get(i), &bottom))
    }

    /// Whether every key yielded by `keys` might have been `put`, per
    /// [`Self::might_contain`].
    pub fn might_contain_all<'a, I>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        keys.into_iter().all(|k| self.might_contain(k))
    }

    /// Resets every cell to `bottom`.
    ///
    /// # Errors
    ///
    /// Returns `Immutable` if this handle cannot mutate.
    pub fn clear(&self) -> Result<(), Error> {
        if !self.mutable {
            return Err(Error::immutable("clear"));
        }
        self.cell.borrow_mut().clear(self.lattice.bottom());
        Ok(())
    }

    /// Whether every cell is still at `bottom`.
    pub fn is_empty(&self) -> bool {
        let store = self.cell.borrow();
        (0..store.len()).all(|i| self.lattice.values_equal(store.get(i), &self.lattice.bottom()))
    }

    /// Whether every cell has reached `top(L_s)` — the store lattice's top,
    /// not this handle's (possibly narrower) access cap.
    pub fn is_full(&self) -> bool {
        let store = self.cell.borrow();
        let top = self.lattice.root_top();
        (0..store.len()).all(|i| self.lattice.values_equal(store.get(i), &top))
    }

    /// Whether `other` is compatible with this map for comparison purposes:
    /// equal `BloomConfig` *and* an equal access lattice. Stricter than
    /// `BloomSet`'s config-only compatibility, since two maps over
    /// differently-ordered lattices cannot be meaningfully compared even
    /// with matching capacity and hash count.
    pub fn bounds(&self, other: &Self) -> bool
    where
        H: PartialEq,
    {
        self.config == other.config && self.lattice.dyn_eq(other.lattice.as_ref())
    }

    /// Whether this map and `other` contain the same values at every
    /// index, under a compatible config and lattice.
    pub fn equals(&self, other: &Self) -> bool
    where
        H: PartialEq,
    {
        if !self.bounds(other) {
            return false;
        }
        let a = self.cell.borrow();
        let b = other.cell.borrow();
        (0..a.len()).all(|i| self.lattice.values_equal(a.get(i), b.get(i)))
    }

    /// The key-membership projection: a live, read-only `BloomSet<K, H>`
    /// whose bit `i` is set exactly when this map's cell `i` has moved off
    /// `bottom`.
    pub fn keys(&self) -> BloomSet<K, H> {
        let view = ProjectionView {
            cell: Rc::clone(&self.cell),
            lattice: Rc::clone(&self.lattice),
            mode: ProjectionMode::AboveBottom,
        };
        BloomSet::new_derived(Rc::clone(&self.config), Rc::new(view))
    }

    /// The saturation projection: a live `BloomSet<K, H>` whose bit `i` is
    /// set exactly when this map's cell `i` has reached `top(L_a)`. Unlike
    /// [`Self::keys`], this projection is mutable whenever `self` is: its
    /// `add`/`addAll`/`clear` write through to this map's storage (see
    /// [`AsBloomSetWriter`]). Memoized: repeated calls return a clone of the
    /// same underlying view rather than reconstructing it.
    pub fn as_bloom_set(&self) -> BloomSet<K, H> {
        if let Some(cached) = self.as_bloom_set_cache.borrow().as_ref() {
            return cached.clone();
        }
        let view = ProjectionView {
            cell: Rc::clone(&self.cell),
            lattice: Rc::clone(&self.lattice),
            mode: ProjectionMode::AtTop,
        };
        let writer = self.writer();
        let set = BloomSet::new_projection(Rc::clone(&self.config), Rc::new(view), writer, self.mutable);
        *self.as_bloom_set_cache.borrow_mut() = Some(set.clone());
        set
    }

    /// Builds a live view of this map capped at `cap`: every `get_supremum`
    /// read through the result is clamped to `cap`, and the result's own
    /// `top()` becomes `cap` rather than this map's lattice's top. `put`
    /// through the view still performs its join in the store lattice (so a
    /// stored value can end up above `cap`) but rejects any `value` outside
    /// `[bottom, cap]`. The view shares storage with `self` and inherits
    /// `self`'s mutability — both structures see each other's mutations.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `cap` is below this lattice's `bottom`.
    pub fn bounded_above(&self, cap: V) -> Result<BloomMap<K, V, BoundedAboveLattice<V>, H>, Error>
    where
        V: Clone,
    {
        if !self.lattice.is_ordered(&self.lattice.bottom(), &cap) {
            return Err(Error::invalid_argument("cap must be >= the lattice's bottom"));
        }
        let parent: Rc<dyn Lattice<V>> = Rc::clone(&self.lattice) as Rc<dyn Lattice<V>>;
        let capped = Rc::new(BoundedAboveLattice::new(parent, cap));
        Ok(BloomMap::new_view(
            Rc::clone(&self.config),
            capped,
            Rc::clone(&self.cell),
            self.mutable,
        ))
    }

    /// The saturation projection's write-through sink: raises a key (or a
    /// single index, for `addAll`) to `top(L_a)` by performing a `put`
    /// against this map's own storage and lattice.
    fn writer(&self) -> Rc<AsBloomSetWriter<K, V, Ls, H>> {
        Rc::new(AsBloomSetWriter {
            config: Rc::clone(&self.config),
            lattice: Rc::clone(&self.lattice),
            cell: Rc::clone(&self.cell),
        })
    }
}

/// Backs `BloomMap::as_bloom_set()`'s mutation side: `add`/`addAll`/`clear`
/// on the projection translate into `put`-shaped writes against the owning
/// map's value store rather than direct bit flips, since the projection has
/// no bit storage of its own (see `BloomSet`'s module doc).
struct AsBloomSetWriter<K: ?Sized, V, Ls, H: KeyHasher<K>> {
    config: Rc<BloomConfig<K, H>>,
    lattice: Rc<Ls>,
    cell: Rc<RefCell<ValueStoreData<V>>>,
}

impl<K: ?Sized, V: Clone + 'static, Ls: Lattice<V> + 'static, H: KeyHasher<K>> ProjectionWriter<K> for AsBloomSetWriter<K, V, Ls, H> {
    fn raise(&self, element: &K) -> Result<bool, Error> {
        let top = self.lattice.top();
        let indices: Vec<usize> = self.config.indices_for(element).collect();
        let mut store = self.cell.borrow_mut();
        let previous = put_over(self.lattice.as_ref(), &mut store, indices.into_iter(), &top);
        Ok(!self.lattice.values_equal(&previous, &top))
    }

    fn raise_index(&self, index: usize) -> Result<bool, Error> {
        let top = self.lattice.top();
        let mut store = self.cell.borrow_mut();
        let old = store.get(index).clone();
        let joined = self.lattice.join(&top, &old);
        if self.lattice.values_equal(&old, &joined) {
            return Ok(false);
        }
        store.set(index, joined);
        Ok(true)
    }

    fn clear_owner(&self) -> Result<(), Error> {
        self.cell.borrow_mut().clear(self.lattice.bottom());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::hash::Hash;
    use std::hash::Hasher;

    use super::*;
    use crate::lattice::BoolLattice;
    use crate::lattice::BoundedIntLattice;

    fn bool_map(capacity: usize, hash_count: usize) -> BloomMap<&'static str, bool, BoolLattice> {
        let config = Rc::new(BloomConfig::new(capacity, hash_count).unwrap());
        BloomMap::new_owned(config, Rc::new(BoolLattice::new()))
    }

    fn int_map(capacity: usize, hash_count: usize, lo: i64, hi: i64) -> BloomMap<&'static str, i64, BoundedIntLattice> {
        let config = Rc::new(BloomConfig::new(capacity, hash_count).unwrap());
        BloomMap::new_owned(config, Rc::new(BoundedIntLattice::new(lo, hi)))
    }

    #[test]
    fn put_then_might_contain_true_value() {
        let map = bool_map(1_000, 4);
        map.put(&"rust", true).unwrap();
        assert!(map.might_contain(&"rust"));
    }

    #[test]
    fn get_supremum_defaults_to_bottom() {
        let map = bool_map(1_000, 4);
        assert_eq!(map.get_supremum(&"rust"), false);
    }

    #[test]
    fn int_lattice_tracks_approximate_maximum() {
        let map = int_map(2_000, 4, 0, 1_000);
        map.put(&"sensor-a", 5).unwrap();
        map.put(&"sensor-a", 42).unwrap();
        map.put(&"sensor-a", 10).unwrap();
        assert_eq!(map.get_supremum(&"sensor-a"), 42);
    }

    #[test]
    fn keys_projection_reflects_any_put() {
        let map = bool_map(1_000, 4);
        let keys = map.keys();
        assert!(!keys.might_contain(&"rust"));
        map.put(&"rust", true).unwrap();
        assert!(keys.might_contain(&"rust"));
    }

    #[test]
    fn as_bloom_set_reflects_saturation_only() {
        let map = int_map(2_000, 4, 0, 100);
        let saturated = map.as_bloom_set();
        map.put(&"a", 30).unwrap();
        assert!(!saturated.might_contain(&"a"));
        map.put(&"a", 100).unwrap();
        assert!(saturated.might_contain(&"a"));
    }

    #[test]
    fn as_bloom_set_is_memoized() {
        let map = bool_map(1_000, 4);
        let a = map.as_bloom_set();
        let b = map.as_bloom_set();
        map.put(&"rust", true).unwrap();
        assert!(a.might_contain(&"rust"));
        assert!(b.might_contain(&"rust"));
    }

    #[test]
    fn bounded_above_clamps_reads() {
        let map = int_map(2_000, 4, 0, 1_000);
        map.put(&"sensor-a", 900).unwrap();
        let capped = map.bounded_above(50).unwrap();
        assert_eq!(capped.get_supremum(&"sensor-a"), 50);
    }

    #[test]
    fn bounded_above_rejects_cap_below_bottom() {
        let map = int_map(2_000, 4, 10, 1_000);
        let err = map.bounded_above(5).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn bounded_above_rejects_value_above_cap() {
        let map = int_map(2_000, 4, 0, 1_000);
        let capped = map.bounded_above(50).unwrap();
        let err = capped.put(&"x", 100).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn bounded_above_allows_in_range_put_and_is_visible_from_base() {
        let map = int_map(2_000, 4, 0, 1_000);
        let capped = map.bounded_above(50).unwrap();
        capped.put(&"x", 20).unwrap();
        assert!(map.might_contain(&"x"));
        assert_eq!(capped.get_supremum(&"x"), 20);
    }

    #[test]
    fn immutable_view_rejects_put() {
        let map = bool_map(1_000, 4);
        let view = map.immutable_view();
        let err = view.put(&"rust", true).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Immutable);
    }

    #[test]
    fn bounds_requires_equal_lattice_values() {
        let config = Rc::new(BloomConfig::new(1_000, 4).unwrap());
        let a = BloomMap::new_owned(Rc::clone(&config), Rc::new(BoundedIntLattice::new(0, 100)));
        let b = BloomMap::new_owned(Rc::clone(&config), Rc::new(BoundedIntLattice::new(0, 200)));
        assert!(!a.bounds(&b));
    }

    #[test]
    fn equals_compares_values() {
        let config = Rc::new(BloomConfig::new(1_000, 4).unwrap());
        let lattice = Rc::new(BoolLattice::new());
        let a = BloomMap::new_owned(Rc::clone(&config), Rc::clone(&lattice));
        let b = BloomMap::new_owned(Rc::clone(&config), Rc::clone(&lattice));
        assert!(a.equals(&b));
        a.put(&"rust", true).unwrap();
        assert!(!a.equals(&b));
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn equal_maps_hash_equal() {
        let config = Rc::new(BloomConfig::new(1_000, 4).unwrap());
        let lattice = Rc::new(BoolLattice::new());
        let a = BloomMap::new_owned(Rc::clone(&config), Rc::clone(&lattice));
        let b = BloomMap::new_owned(Rc::clone(&config), Rc::clone(&lattice));
        a.put(&"rust", true).unwrap();
        b.put(&"rust", true).unwrap();
        assert!(a.equals(&b));
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn differing_values_hash_differently() {
        let config = Rc::new(BloomConfig::new(1_000, 4).unwrap());
        let lattice = Rc::new(BoolLattice::new());
        let a = BloomMap::new_owned(Rc::clone(&config), Rc::clone(&lattice));
        let b = BloomMap::new_owned(Rc::clone(&config), Rc::clone(&lattice));
        a.put(&"rust", true).unwrap();
        assert_ne!(hash_of(&a), hash_of(&b));
    }
}
