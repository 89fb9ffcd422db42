//! Reference oracle for Hadamard transforms of non-power-of-two sizes.
//!
//! Fast Hadamard transforms handle power-of-two lengths recursively. The
//! "special" lengths (12, 20, 28 and 40) instead use a fixed ±1 matrix, and
//! this crate provides the brute-force O(n²) multiply by those matrices. The
//! results are ground truth for validating faster implementations.
//!
//! Each committed matrix `M` satisfies `M·Mᵗ = n·I`. The matrices are not
//! symmetric, so the inverse of the forward transform (up to the factor `n`)
//! is the transposed transform:
//!
//! ```
//! use special_hadamard::{hadamard_mult_12, hadamard_mult_12_transposed};
//!
//! let original: [f32; 12] = std::array::from_fn(|i| i as f32);
//! let mut x = original;
//! hadamard_mult_12(&mut x);
//! hadamard_mult_12_transposed(&mut x);
//! for (got, want) in x.iter().zip(original) {
//!     assert!((got - 12.0 * want).abs() < 1e-3);
//! }
//! ```
//!
//! The per-size entry points bind the length in the argument type, so a
//! buffer of the wrong length does not compile:
//!
//! ```compile_fail
//! let mut x = [0.0f32; 13];
//! special_hadamard::hadamard_mult_12(&mut x);
//! ```
//!
//! When the size is only known at runtime, [`SpecialSize`] and
//! [`apply_slice`] check the length and return an [`Error`] instead.

mod matrix;
mod transform;
pub mod verify;

pub use num_traits::AsPrimitive;

pub use crate::{
    matrix::SignMatrix,
    transform::{
        Accumulator,
        Direction,
        SpecialSize,
        apply_slice,
        hadamard_mult_12,
        hadamard_mult_12_in,
        hadamard_mult_12_transposed,
        hadamard_mult_12_transposed_in,
        hadamard_mult_20,
        hadamard_mult_20_in,
        hadamard_mult_20_transposed,
        hadamard_mult_20_transposed_in,
        hadamard_mult_28,
        hadamard_mult_28_in,
        hadamard_mult_28_transposed,
        hadamard_mult_28_transposed_in,
        hadamard_mult_40,
        hadamard_mult_40_in,
        hadamard_mult_40_transposed,
        hadamard_mult_40_transposed_in,
        is_special_size,
    },
};

/// Errors reported by the runtime-sized API and the verification harness.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The length has no committed sign table.
    #[error("no special Hadamard table for size {0}")]
    UnsupportedSize(usize),
    /// A buffer does not have the length the operation requires.
    #[error("expected a buffer of length {expected}, got {actual}")]
    LengthMismatch {
        /// Required length.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
    /// A candidate output differs from the reference beyond the tolerance.
    #[error("mismatch at index {index}: expected {expected}, got {actual}")]
    Mismatch {
        /// First index outside the tolerance.
        index: usize,
        /// Reference value.
        expected: f64,
        /// Candidate value.
        actual: f64,
    },
    /// The transformed energy is not `n` times the input energy.
    #[error("energy mismatch: expected {expected}, got {actual}")]
    EnergyMismatch {
        /// `n` times the input energy.
        expected: f64,
        /// Energy of the transformed vector.
        actual: f64,
    },
}
