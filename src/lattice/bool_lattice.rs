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

/// The two-element lattice `{false, true}` ordered `false < true`.
///
/// A `BloomMap<K, bool, BoolLattice>` is exactly a classical Bloom filter
/// expressed in map form; `BloomSet` is the ergonomic specialization of this
/// case that avoids spelling out `bool` everywhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoolLattice;

impl BoolLattice {
    /// Constructs the lattice. It carries no state; every instance is
    /// interchangeable.
    pub const fn new() -> Self {
        BoolLattice
    }
}

impl Lattice<bool> for BoolLattice {
    fn top(&self) -> bool {
        true
    }

    fn bottom(&self) -> bool {
        false
    }

    fn join(&self, a: &bool, b: &bool) -> bool {
        *a || *b
    }

    fn meet(&self, a: &bool, b: &bool) -> bool {
        *a && *b
    }

    fn is_ordered(&self, a: &bool, b: &bool) -> bool {
        !*a || *b
    }

    fn dyn_eq(&self, other: &dyn Lattice<bool>) -> bool {
        other.as_any().downcast_ref::<BoolLattice>().is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_or() {
        let l = BoolLattice::new();
        assert!(l.join(&false, &true));
        assert!(!l.join(&false, &false));
    }

    #[test]
    fn ordered_is_implication() {
        let l = BoolLattice::new();
        assert!(l.is_ordered(&false, &false));
        assert!(l.is_ordered(&false, &true));
        assert!(!l.is_ordered(&true, &false));
        assert!(l.is_ordered(&true, &true));
    }

    #[test]
    fn two_instances_are_equal() {
        let a: &dyn Lattice<bool> = &BoolLattice::new();
        let b: &dyn Lattice<bool> = &BoolLattice::new();
        assert!(a.dyn_eq(b));
    }
}
