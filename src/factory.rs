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

//! `Factory`: the single entry point for building `BloomSet`s and
//! `BloomMap`s that agree on a [`BloomConfig`].
//!
//! Validates once at construction and stamps out ready-to-use sketches
//! afterward; since a `BloomConfig` is immutable and cheaply `Rc`-shared, a
//! `Factory` can mint any number of independent `BloomSet`/`BloomMap`
//! instances that are all guaranteed pairwise-compatible. A factory can also
//! adopt externally-owned storage (`new_set_from`, `new_map_from`,
//! `new_map_with_storage`) rather than always allocating its own.

use std::rc::Rc;

use crate::bits::BitStoreData;
use crate::bits::BitView;
use crate::config::BloomConfig;
use crate::error::Error;
use crate::hash::KeyHasher;
use crate::hash::Murmur3Hasher;
use crate::lattice::Lattice;
use crate::map::BloomMap;
use crate::set::BloomSet;
use crate::values::ValueStoreData;

/// Builds `BloomSet`/`BloomMap` instances sharing one [`BloomConfig`].
pub struct Factory<K: ?Sized, H: KeyHasher<K> = Murmur3Hasher<K>> {
    config: Rc<BloomConfig<K, H>>,
}

impl<K: ?Sized, H: KeyHasher<K>> Clone for Factory<K, H> {
    fn clone(&self) -> Self {
        Factory {
            config: Rc::clone(&self.config),
        }
    }
}

impl<K: std::hash::Hash + ?Sized> Factory<K, Murmur3Hasher<K>> {
    /// Builds a factory from an explicit capacity and hash count, using the
    /// default `Murmur3Hasher`.
    pub fn new(capacity: usize, hash_count: usize) -> Result<Self, Error> {
        Ok(Factory {
            config: Rc::new(BloomConfig::new(capacity, hash_count)?),
        })
    }

    /// Builds a factory sized for `max_items` at a target false-positive
    /// probability `fpp`, via [`BloomConfig::suggest_capacity`] and
    /// [`BloomConfig::suggest_hash_count`].
    pub fn sized_for(max_items: usize, fpp: f64) -> Result<Self, Error> {
        let capacity = BloomConfig::<K>::suggest_capacity(max_items, fpp);
        let hash_count = BloomConfig::<K>::suggest_hash_count(max_items, capacity);
        Self::new(capacity, hash_count)
    }
}

impl<K: ?Sized, H: KeyHasher<K>> Factory<K, H> {
    /// Builds a factory from a caller-supplied hasher, capacity, and hash
    /// count.
    pub fn with_hasher(hasher: H, capacity: usize, hash_count: usize) -> Result<Self, Error> {
        Ok(Factory {
            config: Rc::new(BloomConfig::with_hasher(hasher, capacity, hash_count)?),
        })
    }

    /// The config every sketch this factory produces shares.
    pub fn config(&self) -> &Rc<BloomConfig<K, H>> {
        &self.config
    }

    /// Mints a fresh, empty, mutable `BloomSet`.
    pub fn new_set(&self) -> BloomSet<K, H> {
        BloomSet::new_owned(Rc::clone(&self.config))
    }

    /// Mints a mutable `BloomSet` adopting `bits` as its bit array instead of
    /// allocating one. This config's hasher is rebound to `bits.len()` (which
    /// may be larger or smaller than this factory's own capacity), so the
    /// returned set's config differs from [`Self::config`] whenever the
    /// lengths differ.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `mutable` is false (an adopted store that
    /// can't be written to can never back a usable `BloomSet`) or if
    /// `bits.len()` is zero.
    pub fn new_set_from(&self, bits: BitStoreData, mutable: bool) -> Result<BloomSet<K, H>, Error> {
        if !mutable {
            return Err(Error::invalid_argument("adopted bit store must be mutable"));
        }
        let config = Rc::new(self.config.rebound_to(bits.len())?);
        Ok(BloomSet::new_owned_with_store(config, bits))
    }

    /// Mints a fresh, empty, mutable `BloomMap` over `lattice`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `lattice` is not bounded below — every
    /// `BloomMap` cell must have a well-defined starting value.
    pub fn new_map<V, Ls>(&self, lattice: Ls) -> Result<BloomMap<K, V, Ls, H>, Error>
    where
        V: 'static,
        Ls: Lattice<V> + 'static,
    {
        if !lattice.is_bounded_below() {
            return Err(Error::invalid_argument(
                "access lattice must be bounded below to serve as a BloomMap's cell type",
            ));
        }
        Ok(BloomMap::new_owned(Rc::clone(&self.config), Rc::new(lattice)))
    }

    /// Mints a mutable `BloomMap` over `lattice`, adopting `store` as its
    /// value array instead of allocating one. This config's hasher is
    /// rebound to `store.len()`, exactly as in [`Self::new_set_from`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `lattice` is not bounded below, if
    /// `mutable` is false, if `admits_null` is true (a `BloomMap` cell must
    /// always read back a genuine value, never an absent one), or if
    /// `store.len()` is zero.
    pub fn new_map_from<V, Ls>(
        &self,
        store: ValueStoreData<V>,
        lattice: Ls,
        mutable: bool,
        admits_null: bool,
    ) -> Result<BloomMap<K, V, Ls, H>, Error>
    where
        V: 'static,
        Ls: Lattice<V> + 'static,
    {
        if !lattice.is_bounded_below() {
            return Err(Error::invalid_argument(
                "access lattice must be bounded below to serve as a BloomMap's cell type",
            ));
        }
        if !mutable {
            return Err(Error::invalid_argument("adopted value store must be mutable"));
        }
        if admits_null {
            return Err(Error::invalid_argument("adopted value store must not admit null reads"));
        }
        let config = Rc::new(self.config.rebound_to(store.len())?);
        Ok(BloomMap::new_owned_with_store(config, Rc::new(lattice), store))
    }

    /// Mints a fresh, mutable `BloomMap` over `lattice`, allocating its value
    /// store by calling `storage_factory` with this factory's capacity
    /// instead of filling every cell with `lattice.bottom()` directly —
    /// useful when a caller wants control over how the backing `Vec` is
    /// pre-sized or pooled.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `lattice` is not bounded below.
    pub fn new_map_with_storage<V, Ls>(
        &self,
        lattice: Ls,
        storage_factory: impl FnOnce(usize) -> ValueStoreData<V>,
    ) -> Result<BloomMap<K, V, Ls, H>, Error>
    where
        V: 'static,
        Ls: Lattice<V> + 'static,
    {
        if !lattice.is_bounded_below() {
            return Err(Error::invalid_argument(
                "access lattice must be bounded below to serve as a BloomMap's cell type",
            ));
        }
        let store = storage_factory(self.config.capacity());
        Ok(BloomMap::new_owned_with_store(Rc::clone(&self.config), Rc::new(lattice), store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::BoolLattice;

    #[test]
    fn new_set_and_new_map_share_compatible_configs() {
        let factory = Factory::<&str>::new(1_000, 4).unwrap();
        let set = factory.new_set();
        let other_set = factory.new_set();
        set.add(&"rust").unwrap();
        assert!(set.bounded_by(&other_set).is_ok());
    }

    #[test]
    fn new_map_rejects_unbounded_below_lattice() {
        let factory = Factory::<&str>::new(1_000, 4).unwrap();
        let err = factory
            .new_map::<i64, _>(crate::lattice::UnboundedBelowLattice)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn new_map_accepts_bool_lattice() {
        let factory = Factory::<&str>::new(1_000, 4).unwrap();
        let map = factory.new_map(BoolLattice::new()).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn sized_for_produces_a_usable_factory() {
        let factory = Factory::<&str>::sized_for(10_000, 0.01).unwrap();
        let set = factory.new_set();
        assert!(set.config().capacity() > 0);
    }

    #[test]
    fn new_set_from_adopts_external_store_and_rebinds_capacity() {
        let factory = Factory::<&str>::new(1_000, 4).unwrap();
        let bits = crate::bits::BitStoreData::new(5_000);
        let set = factory.new_set_from(bits, true).unwrap();
        assert_eq!(set.config().capacity(), 5_000);
        assert!(set.is_empty());
        set.add(&"rust").unwrap();
        assert!(set.might_contain(&"rust"));
    }

    #[test]
    fn new_set_from_rejects_immutable_store() {
        let factory = Factory::<&str>::new(1_000, 4).unwrap();
        let bits = crate::bits::BitStoreData::new(1_000);
        let err = factory.new_set_from(bits, false).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn new_map_from_adopts_external_store() {
        let factory = Factory::<&str>::new(1_000, 4).unwrap();
        let store = crate::values::ValueStoreData::new(1_000, false);
        let map = factory.new_map_from(store, BoolLattice::new(), true, false).unwrap();
        assert_eq!(map.config().capacity(), 1_000);
        assert!(map.is_empty());
    }

    #[test]
    fn new_map_from_rejects_unbounded_below_lattice() {
        let factory = Factory::<&str>::new(1_000, 4).unwrap();
        let store = crate::values::ValueStoreData::new(1_000, 0i64);
        let err = factory
            .new_map_from(store, crate::lattice::UnboundedBelowLattice, true, false)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn new_map_from_rejects_immutable_store() {
        let factory = Factory::<&str>::new(1_000, 4).unwrap();
        let store = crate::values::ValueStoreData::new(1_000, false);
        let err = factory
            .new_map_from(store, BoolLattice::new(), false, false)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn new_map_from_rejects_null_admitting_store() {
        let factory = Factory::<&str>::new(1_000, 4).unwrap();
        let store = crate::values::ValueStoreData::new(1_000, false);
        let err = factory
            .new_map_from(store, BoolLattice::new(), true, true)
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn new_map_with_storage_uses_factorys_capacity() {
        let factory = Factory::<&str>::new(1_000, 4).unwrap();
        let map = factory
            .new_map_with_storage(BoolLattice::new(), |len| crate::values::ValueStoreData::new(len, false))
            .unwrap();
        assert_eq!(map.config().capacity(), 1_000);
        assert!(map.is_empty());
    }

    #[test]
    fn new_map_with_storage_rejects_unbounded_below_lattice() {
        let factory = Factory::<&str>::new(1_000, 4).unwrap();
        let err = factory
            .new_map_with_storage(crate::lattice::UnboundedBelowLattice, |len| {
                crate::values::ValueStoreData::new(len, 0i64)
            })
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }
}
