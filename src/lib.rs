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

//! Bloom filters and lattice-valued compact approximators over a shared
//! hash-and-bit-mark core.
//!
//! - [`BloomSet`] is a classical Bloom filter: add elements, ask whether an
//!   element might have been added, never get a false negative.
//! - [`BloomMap`] generalizes the same index-marking trick to any
//!   bounded-below join-semilattice of values instead of a single bit,
//!   yielding sketches like "the approximate maximum value ever recorded
//!   per key" ([`lattice::BoundedIntLattice`]) alongside the classical
//!   `{false, true}` case ([`lattice::BoolLattice`]).
//! - Every sketch is built through a [`Factory`], which pins down the
//!   [`BloomConfig`] (hasher, hash count, capacity) two sketches must share
//!   before any pairwise operation between them — `addAll`, `boundedBy`, or
//!   `bounds` — is meaningful.
//! - All four structures follow the same mutability discipline: a freshly
//!   built sketch is live and mutable; [`BloomSet::immutable_view`] and
//!   [`BloomMap::immutable_view`] hand out a read-only handle onto the same
//!   storage; `_copy` variants instead snapshot into independent storage,
//!   mutable or not.
//!
//! This crate is single-threaded and synchronous: every handle is `Rc`-based
//! interior mutability, not `Arc`/`Mutex`, and no operation here ever
//! blocks or spans an await point.

pub mod bits;
pub mod config;
pub mod error;
pub mod factory;
pub mod hash;
pub mod lattice;
pub mod map;
pub mod set;
pub mod values;

pub use crate::config::BloomConfig;
pub use crate::error::Error;
pub use crate::error::ErrorKind;
pub use crate::factory::Factory;
pub use crate::map::BloomMap;
pub use crate::set::BloomSet;
