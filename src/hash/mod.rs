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

//! The hasher collaborator: binds an element type to a lazy stream of bit
//! indices.
//!
//! [`KeyHasher`] is a polymorphic object that, given an element, produces an
//! index stream of unbounded length (practically infinite, since it is
//! generated by a double-hashing recurrence) but guaranteed to be at least
//! [`KeyHasher::quantity`] long before callers stop consuming it.
//! [`Murmur3Hasher`] is the one concrete implementation this crate ships.

mod murmur3;

pub use self::murmur3::Murmur3Hasher;
pub use self::murmur3::DEFAULT_SEED;

use crate::error::Error;

/// The modulus a [`KeyHasher`] produces indices into, i.e. `m`. Kept as its
/// own type (rather than a bare `usize`) because a hash size is not always
/// representable as a native integer — `as_capacity` is where that gets
/// checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashSize(u64);

impl HashSize {
    /// Constructs a hash size from its raw modulus.
    pub const fn new(size: u64) -> Self {
        HashSize(size)
    }

    /// The raw modulus.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Converts to a `usize` capacity, usable as a `Vec` length.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ErrorKind::InvalidState`] if the modulus does
    /// not fit in a `usize` on this platform (only reachable on 32-bit
    /// targets with a modulus above ~4 billion).
    pub fn as_capacity(self) -> Result<usize, Error> {
        usize::try_from(self.0)
            .map_err(|_| Error::invalid_state(format!("hash size {} exceeds usize::MAX", self.0)))
    }
}

impl From<usize> for HashSize {
    fn from(value: usize) -> Self {
        HashSize(value as u64)
    }
}

/// A lazy, deterministic sequence of indices in `[0, size)` for one element.
///
/// Produced by [`KeyHasher::hash`]. Implementations are plain `Iterator<Item
/// = usize>`s; callers take exactly `hash_count` values from the front and
/// must not reorder them — `put` and `get_supremum` on `BloomMap` must visit
/// the same indices in the same order for a given key.
pub trait HashStream: Iterator<Item = usize> {}
impl<T: Iterator<Item = usize>> HashStream for T {}

/// The hasher collaborator: binds an element type to an index stream.
///
/// A `KeyHasher` is rebindable to a new modulus via [`sized`](Self::sized)
/// without changing the underlying hash values it derives indices from —
/// `BloomConfig` uses this to guarantee that every index a hasher emits
/// already lies in `[0, capacity)`, so no caller ever needs to reduce an
/// index modulo capacity itself.
pub trait KeyHasher<E: ?Sized>: Clone {
    /// The concrete stream type `hash` returns.
    type Stream: HashStream;

    /// Produces the lazy index stream for `element`.
    fn hash(&self, element: &E) -> Self::Stream;

    /// The modulus every produced index is strictly less than.
    fn size(&self) -> HashSize;

    /// The minimum guaranteed stream length before index quality degrades.
    /// `BloomConfig` rejects any `hashCount` above this.
    fn quantity(&self) -> usize;

    /// Returns an equivalent hasher rebound to a new modulus.
    fn sized(&self, size: HashSize) -> Self;
}
