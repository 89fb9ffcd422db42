//! Bit-packed ±1 coefficient matrices.
//!
//! Every entry of a Hadamard-type matrix has magnitude one, so a row of up to
//! 64 entries fits in a single `u64`: bit `j` is set when the coefficient in
//! column `j` is `-1`.

pub(crate) mod tables;


use std::fmt::{self, Display};

/// An `N`×`N` matrix whose entries are all `+1` or `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignMatrix<const N: usize> {
    rows: [u64; N],
}

impl<const N: usize> SignMatrix<N> {
    /// Builds a matrix from rows written as strings of `+` and `-`.
    ///
    /// This is a `const fn`, so a malformed table used in a `const` item is
    /// rejected at compile time.
    ///
    /// # Panics
    ///
    /// - If `N` is larger than 64.
    /// - If a row does not have exactly `N` characters.
    /// - If a row contains anything other than `+` or `-`.
    #[inline]
    #[must_use]
    pub const fn from_rows(rows: [&str; N]) -> Self {
        assert!(N <= 64, "sign matrices are limited to 64 columns");

        let mut bits = [0u64; N];
        let mut i = 0;
        while i < N {
            let row = rows[i].as_bytes();
            assert!(row.len() == N, "sign matrix row has the wrong length");
            let mut j = 0;
            while j < N {
                match row[j] {
                    b'+' => {}
                    b'-' => bits[i] |= 1 << j,
                    _ => panic!("sign matrix rows may only contain '+' and '-'"),
                }
                j += 1;
            }
            i += 1;
        }

        Self { rows: bits }
    }

    /// Builds a matrix directly from packed rows.
    ///
    /// Bits at or above position `N` are cleared.
    #[inline]
    #[must_use]
    pub const fn from_bits(mut rows: [u64; N]) -> Self {
        let mask = Self::column_mask();
        let mut i = 0;
        while i < N {
            rows[i] &= mask;
            i += 1;
        }
        Self { rows }
    }

    const fn column_mask() -> u64 {
        match 1u64.checked_shl(N as u32) {
            Some(bit) => bit - 1,
            None => u64::MAX,
        }
    }

    /// The matrix dimension.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// Whether the matrix has no rows.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// The packed rows. Bit `j` of row `i` is set when `M[i][j] == -1`.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> &[u64; N] {
        &self.rows
    }

    /// The packed bits of row `i`.
    ///
    /// # Panics
    ///
    /// - If `i >= N`.
    #[inline]
    #[must_use]
    pub const fn row_bits(&self, i: usize) -> u64 {
        self.rows[i]
    }

    /// The coefficient `M[i][j]`, either `1` or `-1`.
    ///
    /// # Panics
    ///
    /// - If `i >= N` or `j >= N`.
    #[inline]
    #[must_use]
    pub const fn sign(&self, i: usize, j: usize) -> i8 {
        assert!(j < N);
        if (self.rows[i] >> j) & 1 == 0 { 1 } else { -1 }
    }

    /// Returns `Mᵗ`.
    #[inline]
    #[must_use]
    pub const fn transpose(&self) -> Self {
        let mut bits = [0u64; N];
        let mut i = 0;
        while i < N {
            let mut j = 0;
            while j < N {
                bits[j] |= ((self.rows[i] >> j) & 1) << i;
                j += 1;
            }
            i += 1;
        }
        Self { rows: bits }
    }

    /// Inner product of rows `i` and `k`.
    ///
    /// Entries agree where the packed bits match, so the product is the
    /// number of agreements minus the number of disagreements.
    ///
    /// # Panics
    ///
    /// - If `i >= N` or `k >= N`.
    #[inline]
    #[must_use]
    pub const fn dot_rows(&self, i: usize, k: usize) -> i32 {
        let differing = (self.rows[i] ^ self.rows[k]).count_ones() as i32;
        N as i32 - 2 * differing
    }

    /// Checks `M·Mᵗ = N·I`.
    #[inline]
    #[must_use]
    pub fn is_orthogonal(&self) -> bool {
        (0..N).all(|i| {
            (i..N).all(|k| {
                let expected = if i == k { N as i32 } else { 0 };
                self.dot_rows(i, k) == expected
            })
        })
    }

    /// Checks `M = Mᵗ`.
    #[inline]
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        *self == self.transpose()
    }
}

impl<const N: usize> Display for SignMatrix<N> {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, &row) in self.rows.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            for j in 0..N {
                f.write_str(if (row >> j) & 1 == 0 { "+" } else { "-" })?;
            }
        }
        Ok(())
    }
}
