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

use std::hash::Hash;
use std::hash::Hasher as StdHasher;
use std::marker::PhantomData;

use super::HashSize;
use super::KeyHasher;

/// Default hash seed.
pub const DEFAULT_SEED: u32 = 9001;

/// The maximum hash-function multiplicity this hasher will vouch for.
/// Mirrors `BloomFilterBuilder::validate_params`'s `num_hashes <= 100` bound:
/// beyond this, two 64-bit base hashes combined via Kirsch-Mitzenmacher start
/// producing correlated indices.
const MAX_QUANTITY: usize = 100;

/// Accumulates the bytes `std::hash::Hash::hash` feeds it; write-only, since
/// its only purpose is bridging a generic `T: Hash` to murmur3's byte-slice
/// API.
struct ByteCollector {
    bytes: Vec<u8>,
}

impl StdHasher for ByteCollector {
    fn finish(&self) -> u64 {
        unreachable!("ByteCollector is write-only, see hash_pair")
    }

    fn write(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }
}

fn hash_pair<E: Hash + ?Sized>(element: &E, seed: u32) -> (u64, u64) {
    let mut collector = ByteCollector {
        bytes: Vec::with_capacity(32),
    };
    element.hash(&mut collector);
    mur3::murmurhash3_x64_128(&collector.bytes, seed)
}

/// A [`KeyHasher`] backed by MurmurHash3 x64 128, indexing via
/// Kirsch-Mitzenmacher double hashing: `index_i = (h1 + i * h2) mod size`.
///
/// The modulus is rebindable rather than a fixed field, so a single pair of
/// base hashes can be reindexed against whatever size [`KeyHasher::sized`]
/// is asked for.
#[derive(Debug)]
pub struct Murmur3Hasher<E: ?Sized> {
    seed: u32,
    size: HashSize,
    _marker: PhantomData<fn(&E)>,
}

// Hand-written instead of derived: a derive would add `E: Clone`/`E:
// PartialEq`/... bounds even though `E` only ever appears inside
// `PhantomData`.
impl<E: ?Sized> Clone for Murmur3Hasher<E> {
    fn clone(&self) -> Self {
        Murmur3Hasher {
            seed: self.seed,
            size: self.size,
            _marker: PhantomData,
        }
    }
}

impl<E: ?Sized> PartialEq for Murmur3Hasher<E> {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed && self.size == other.size
    }
}

impl<E: ?Sized> Murmur3Hasher<E> {
    /// Builds a hasher with the default seed and the given modulus.
    pub fn new(size: HashSize) -> Self {
        Self::with_seed(DEFAULT_SEED, size)
    }

    /// Builds a hasher with a custom seed.
    ///
    /// Hashers with different seeds are never equal, and therefore never
    /// compatible under `BloomConfig` equality.
    pub fn with_seed(seed: u32, size: HashSize) -> Self {
        Murmur3Hasher {
            seed,
            size,
            _marker: PhantomData,
        }
    }

    /// The configured seed.
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

/// The lazy index stream produced by [`Murmur3Hasher::hash`].
pub struct Murmur3Stream {
    h1: u64,
    h2: u64,
    modulus: u64,
    next: u64,
}

impl Iterator for Murmur3Stream {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let i = self.next;
        self.next += 1;
        let combined = self.h1.wrapping_add(i.wrapping_mul(self.h2));
        Some((combined % self.modulus) as usize)
    }
}

impl<E: Hash + ?Sized> KeyHasher<E> for Murmur3Hasher<E> {
    type Stream = Murmur3Stream;

    fn hash(&self, element: &E) -> Murmur3Stream {
        let (h1, h2) = hash_pair(element, self.seed);
        Murmur3Stream {
            h1,
            h2,
            modulus: self.size.value().max(1),
            next: 0,
        }
    }

    fn size(&self) -> HashSize {
        self.size
    }

    fn quantity(&self) -> usize {
        MAX_QUANTITY
    }

    fn sized(&self, size: HashSize) -> Self {
        Murmur3Hasher {
            seed: self.seed,
            size,
            _marker: PhantomData,
        }
    }
}
