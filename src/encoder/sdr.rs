//! Sparse vector - the fixed-width bit sequence every encoder produces

use serde::{Deserialize, Serialize};

/// Fixed-length sequence of 0/1 values.
///
/// Produced fresh by every encode call; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SparseVector {
    bits: Vec<u8>,
}

impl SparseVector {
    /// Build a vector from raw bits. Any non-zero value is normalized to 1.
    #[must_use]
    pub fn from_bits(bits: impl IntoIterator<Item = u8>) -> Self {
        Self {
            bits: bits.into_iter().map(|b| u8::from(b != 0)).collect(),
        }
    }

    /// All-zero vector of the given length.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self { bits: vec![0; len] }
    }

    /// Vector of `len` bits with the given positions set.
    ///
    /// Positions outside `0..len` are ignored.
    #[must_use]
    pub fn with_active(len: usize, active: impl IntoIterator<Item = usize>) -> Self {
        let mut bits = vec![0; len];
        for idx in active {
            if let Some(bit) = bits.get_mut(idx) {
                *bit = 1;
            }
        }
        Self { bits }
    }

    /// Ordered concatenation of several vectors.
    #[must_use]
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a Self>) -> Self {
        Self {
            bits: parts
                .into_iter()
                .flat_map(|p| p.bits.iter().copied())
                .collect(),
        }
    }

    /// Number of bits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// True when the vector has no bits at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of bits set to 1.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.bits.iter().filter(|&&b| b == 1).count()
    }

    /// Indices of the active bits in ascending order.
    #[must_use]
    pub fn active_indices(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| (b == 1).then_some(i))
            .collect()
    }

    /// Raw bit slice.
    #[must_use]
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Render as a compact `0101...` string (used in logs).
    #[must_use]
    pub fn to_bit_string(&self) -> String {
        self.bits
            .iter()
            .map(|&b| if b == 1 { '1' } else { '0' })
            .collect()
    }

    /// Number of positions where both vectors are active.
    ///
    /// Vectors of different lengths only compare their common prefix.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> usize {
        self.bits
            .iter()
            .zip(&other.bits)
            .filter(|(&a, &b)| a == 1 && b == 1)
            .count()
    }
}

impl From<SparseVector> for Vec<u8> {
    fn from(vector: SparseVector) -> Self {
        vector.bits
    }
}
