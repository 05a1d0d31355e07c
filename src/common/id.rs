//! Identifier and distance definitions
//!
// https://github.com/ryankurte/rust-kad
// Copyright 2018-2023 ryan kurte

use std::fmt::Debug;
use std::hash::Hash;

use num::bigint::BigUint;
use num::Zero;

/// Id trait must be implemented for viable id types
///
/// Ids are fixed-width bit strings, ordered and compared as big-endian integers.
pub trait DatabaseId: Hash + Default + PartialEq + Eq + Ord + Clone + Send + Sync + Debug {
    /// Exclusive or two IDs to calculate distance
    fn xor(a: &Self, b: &Self) -> Self;

    /// Count number of bits required to express a given ID
    fn bits(&self) -> usize;

    /// Check if an ID is zero
    fn is_zero(&self) -> bool;

    /// Bit length of the ID type
    fn max_bits(&self) -> usize;

    /// Number of leading bits shared by two IDs, `max_bits` when equal
    fn prefix_len(a: &Self, b: &Self) -> usize;

    /// Create a zero ID
    fn zero() -> Self;

    /// Create a max (all bits set) ID
    fn max() -> Self;
}

/// DatabaseId implementation for arbitrary types around &[u8]
impl<T> DatabaseId for T
where
    T: AsRef<[u8]>
        + AsMut<[u8]>
        + Hash
        + Default
        + PartialEq
        + Eq
        + Ord
        + Clone
        + Sync
        + Send
        + Debug,
{
    fn xor(a: &T, b: &T) -> Self {
        let a = a.as_ref();
        let b = b.as_ref();
        let mut c = T::default();

        {
            let c = c.as_mut();
            assert!(
                a.len() == b.len() && a.len() == c.len(),
                "dht IDs must be the same length"
            );

            for i in 0..a.len() {
                c[i] = a[i] ^ b[i];
            }
        }

        c
    }

    fn bits(&self) -> usize {
        let a = BigUint::from_bytes_be(self.as_ref());
        a.bits() as usize
    }

    fn is_zero(&self) -> bool {
        let a = BigUint::from_bytes_be(self.as_ref());
        Zero::is_zero(&a)
    }

    fn max_bits(&self) -> usize {
        self.as_ref().len() * 8
    }

    fn prefix_len(a: &Self, b: &Self) -> usize {
        let mut n = 0;

        for (x, y) in a.as_ref().iter().zip(b.as_ref()) {
            let d = x ^ y;
            if d != 0 {
                return n + d.leading_zeros() as usize;
            }
            n += 8;
        }

        n
    }

    fn zero() -> Self {
        Self::default()
    }

    fn max() -> Self {
        let mut a = Self::default();

        for b in a.as_mut() {
            *b = 0xFF;
        }

        a
    }
}

/// XOR distance between two IDs.
///
/// Ordering is numeric, so sorting by [Distance] sorts by closeness.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Distance<Id>(Id);

impl<Id: DatabaseId> Distance<Id> {
    /// Compute the distance between two IDs
    pub fn between(a: &Id, b: &Id) -> Self {
        Distance(Id::xor(a, b))
    }

    /// Check whether this is the zero distance (ie. `a == b`)
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Access the raw XOR value
    pub fn value(&self) -> &Id {
        &self.0
    }
}
