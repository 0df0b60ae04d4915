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

//! `BloomConfig`: the shared hasher + hash-count + capacity triple both
//! `BloomSet` and `BloomMap` are built on.

use std::marker::PhantomData;

use crate::error::Error;
use crate::hash::HashSize;
use crate::hash::KeyHasher;
use crate::hash::Murmur3Hasher;

/// The capacity, hash count, and hasher a `BloomSet`/`BloomMap` agree on.
///
/// Two structures are compatible for any pairwise operation (`addAll` with
/// another set, `boundedBy`, `bounds`) exactly when their configs are equal
/// — which, since `hasher` is rebound to `capacity` at construction
/// (see [`KeyHasher::sized`]), reduces to comparing `capacity` and
/// `hash_count` plus whatever the hasher itself considers part of its
/// identity (for `Murmur3Hasher`, its seed).
pub struct BloomConfig<E: ?Sized, H: KeyHasher<E> = Murmur3Hasher<E>> {
    hasher: H,
    hash_count: usize,
    capacity: usize,
    _marker: PhantomData<fn(&E)>,
}

impl<E: ?Sized, H: KeyHasher<E>> Clone for BloomConfig<E, H> {
    fn clone(&self) -> Self {
        BloomConfig {
            hasher: self.hasher.clone(),
            hash_count: self.hash_count,
            capacity: self.capacity,
            _marker: PhantomData,
        }
    }
}

impl<E: ?Sized, H: KeyHasher<E> + PartialEq> PartialEq for BloomConfig<E, H> {
    fn eq(&self, other: &Self) -> bool {
        self.hash_count == other.hash_count
            && self.capacity == other.capacity
            && self.hasher == other.hasher
    }
}

impl<E: ?Sized, H: KeyHasher<E> + std::fmt::Debug> std::fmt::Debug for BloomConfig<E, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomConfig")
            .field("hasher", &self.hasher)
            .field("hash_count", &self.hash_count)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<E: ?Sized, H: KeyHasher<E>> BloomConfig<E, H> {
    /// Builds a config from an explicit hasher, capacity (number of bits /
    /// lattice cells), and hash count. The hasher's declared `size` must be
    /// at least `capacity`; if it's strictly larger, the hasher is rebound
    /// down to `capacity` via [`KeyHasher::sized`] so every index it ever
    /// emits already lies in `[0, capacity)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `capacity` is zero, `hash_count` is
    /// zero, `hash_count` exceeds `hasher.quantity()`, or `hasher.size()` is
    /// smaller than the requested `capacity`.
    pub fn with_hasher(hasher: H, capacity: usize, hash_count: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::invalid_argument("capacity must be greater than zero"));
        }
        if hash_count == 0 {
            return Err(Error::invalid_argument("hash_count must be greater than zero"));
        }
        if hash_count > hasher.quantity() {
            return Err(Error::invalid_argument(format!(
                "hash_count {hash_count} exceeds this hasher's maximum quantity {}",
                hasher.quantity()
            )));
        }
        if hasher.size().value() < capacity as u64 {
            return Err(Error::invalid_argument(format!(
                "hasher size {} is smaller than the requested capacity {capacity}",
                hasher.size().value()
            )));
        }
        let hasher = hasher.sized(HashSize::from(capacity));
        Ok(BloomConfig {
            hasher,
            hash_count,
            capacity,
            _marker: PhantomData,
        })
    }

    /// Builds a config from a hasher and hash count, deriving `capacity`
    /// from the hasher's own declared `size()` — the counterpart to
    /// [`Self::with_hasher`], which instead takes an explicit capacity and
    /// narrows the hasher down to it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the hasher's size doesn't fit in a
    /// `usize`, or `InvalidArgument` per [`Self::with_hasher`]'s other
    /// rejection conditions.
    pub fn from_hasher(hasher: H, hash_count: usize) -> Result<Self, Error> {
        let capacity = hasher.size().as_capacity()?;
        Self::with_hasher(hasher, capacity, hash_count)
    }

    /// The number of bits (or lattice cells) every structure built from this
    /// config allocates.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The number of indices derived per element.
    pub fn hash_count(&self) -> usize {
        self.hash_count
    }

    /// The hasher this config binds.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// The first `hash_count` indices for `element`, in a fixed order every
    /// caller observing this config agrees on.
    pub fn indices_for(&self, element: &E) -> impl Iterator<Item = usize> + use<'_, E, H> {
        self.hasher.hash(element).take(self.hash_count)
    }

    /// Derives a new config with capacity `new_capacity`, rebinding this
    /// config's hasher accordingly. Unlike [`Self::with_hasher`], this starts
    /// from an already-built config rather than a bare hasher, and only ever
    /// narrows: `new_capacity` must not exceed this config's hasher's
    /// declared size, since the hasher itself is reused unresized going into
    /// the validation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` under the same conditions as
    /// [`Self::with_hasher`] (in particular, `new_capacity` must not exceed
    /// this config's hasher's declared size).
    pub fn with_capacity(&self, new_capacity: usize) -> Result<Self, Error> {
        Self::with_hasher(self.hasher.clone(), new_capacity, self.hash_count)
    }

    /// Derives a new config whose hasher is rebound to `new_size` before
    /// validation, so — unlike [`Self::with_capacity`] — this can grow the
    /// capacity as well as shrink it. Used when adopting externally-owned
    /// storage of a given length: the hasher simply takes on that length as
    /// its new modulus rather than being checked against its previous one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `new_size` is zero or exceeds
    /// `hash_count`'s hasher quantity; see [`Self::with_hasher`].
    pub fn rebound_to(&self, new_size: usize) -> Result<Self, Error> {
        let hasher = self.hasher.clone().sized(HashSize::from(new_size));
        Self::with_hasher(hasher, new_size, self.hash_count)
    }
}

impl<E: std::hash::Hash + ?Sized> BloomConfig<E, Murmur3Hasher<E>> {
    /// Builds a config using the default `Murmur3Hasher` with the default
    /// seed, sized to exactly `capacity`.
    pub fn new(capacity: usize, hash_count: usize) -> Result<Self, Error> {
        let hasher = Murmur3Hasher::new(HashSize::from(capacity));
        Self::with_hasher(hasher, capacity, hash_count)
    }

    /// Suggests a capacity (number of bits) for `max_items` elements at a
    /// target false-positive probability `fpp`, using the classical
    /// `m = ceil(-n * ln(p) / ln(2)^2)` formula.
    ///
    /// # Panics
    ///
    /// Panics if `max_items` is zero or `fpp` is not in `(0, 1)` — a
    /// programmer error at call time rather than a runtime condition.
    pub fn suggest_capacity(max_items: usize, fpp: f64) -> usize {
        assert!(max_items > 0, "max_items must be greater than zero");
        assert!(fpp > 0.0 && fpp < 1.0, "fpp must be in (0, 1)");
        let n = max_items as f64;
        let m = -(n * fpp.ln()) / (std::f64::consts::LN_2 * std::f64::consts::LN_2);
        m.ceil() as usize
    }

    /// Suggests a hash count for `max_items` elements and a given capacity,
    /// using `k = round(m/n * ln 2)`, clamped to at least 1.
    pub fn suggest_hash_count(max_items: usize, capacity: usize) -> usize {
        assert!(max_items > 0, "max_items must be greater than zero");
        let k = (capacity as f64 / max_items as f64) * std::f64::consts::LN_2;
        (k.round() as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_capacity() {
        let err = BloomConfig::<&str>::new(0, 3).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn rejects_zero_hash_count() {
        let err = BloomConfig::<&str>::new(100, 0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn rejects_hash_count_above_quantity() {
        let err = BloomConfig::<&str>::new(100, 1_000).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn equal_params_produce_equal_configs() {
        let a = BloomConfig::<&str>::new(1_000, 4).unwrap();
        let b = BloomConfig::<&str>::new(1_000, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_capacity_is_not_equal() {
        let a = BloomConfig::<&str>::new(1_000, 4).unwrap();
        let b = BloomConfig::<&str>::new(2_000, 4).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn indices_for_yields_hash_count_values() {
        let cfg = BloomConfig::<&str>::new(500, 5).unwrap();
        let indices: Vec<usize> = cfg.indices_for(&"elephant").collect();
        assert_eq!(indices.len(), 5);
        assert!(indices.iter().all(|&i| i < 500));
    }

    #[test]
    fn suggest_capacity_matches_known_ratio() {
        let m = BloomConfig::<&str>::suggest_capacity(1_000, 0.01);
        assert!(m > 9_000 && m < 9_600);
    }

    #[test]
    fn suggest_hash_count_is_at_least_one() {
        let k = BloomConfig::<&str>::suggest_hash_count(1_000_000, 10);
        assert_eq!(k, 1);
    }

    #[test]
    fn with_hasher_rejects_capacity_above_hasher_size() {
        let hasher = crate::hash::Murmur3Hasher::<&str>::new(HashSize::new(50));
        let err = BloomConfig::with_hasher(hasher, 100, 3).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }

    #[test]
    fn from_hasher_derives_capacity_from_hasher_size() {
        let hasher = crate::hash::Murmur3Hasher::<&str>::new(HashSize::new(500));
        let cfg = BloomConfig::from_hasher(hasher, 4).unwrap();
        assert_eq!(cfg.capacity(), 500);
    }

    #[test]
    fn instance_with_capacity_rebinds_to_new_size() {
        let cfg = BloomConfig::<&str>::new(1_000, 4).unwrap();
        let narrowed = cfg.with_capacity(200).unwrap();
        assert_eq!(narrowed.capacity(), 200);
        assert_eq!(narrowed.hash_count(), cfg.hash_count());
        let indices: Vec<usize> = narrowed.indices_for(&"elephant").collect();
        assert!(indices.iter().all(|&i| i < 200));
    }

    #[test]
    fn rebound_to_can_grow_past_the_original_hasher_size() {
        let cfg = BloomConfig::<&str>::new(100, 4).unwrap();
        let grown = cfg.rebound_to(5_000).unwrap();
        assert_eq!(grown.capacity(), 5_000);
        let indices: Vec<usize> = grown.indices_for(&"elephant").collect();
        assert!(indices.iter().all(|&i| i < 5_000));
    }

    #[test]
    fn rebound_to_rejects_zero_size() {
        let cfg = BloomConfig::<&str>::new(1_000, 4).unwrap();
        let err = cfg.rebound_to(0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidArgument);
    }
}
