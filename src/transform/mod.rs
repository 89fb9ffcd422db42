#[cfg(test)]
mod tests;

use std::fmt::{self, Display};

use log::debug;
use num_traits::{AsPrimitive, Num};

use crate::{
    Error,
    matrix::{SignMatrix, tables},
};

/// Working precision for the transform.
///
/// Every output is accumulated in this type and converted back to the
/// caller's element type only after all outputs are known.
pub trait Accumulator: Num + Copy + 'static {}

impl<W: Num + Copy + 'static> Accumulator for W {}

impl<const N: usize> SignMatrix<N> {
    /// Multiplies `x` by this matrix in place.
    ///
    /// All `N` outputs are computed from the original input into a stack
    /// buffer before `x` is written.
    #[inline]
    pub fn apply<W, T>(&self, x: &mut [T; N])
    where
        W: Accumulator + AsPrimitive<T>,
        T: AsPrimitive<W>,
    {
        let mut out = [W::zero(); N];
        for (acc, &row) in out.iter_mut().zip(self.rows()) {
            *acc = x.iter().enumerate().fold(W::zero(), |sum, (j, &v)| {
                if (row >> j) & 1 == 0 {
                    sum + v.as_()
                } else {
                    sum - v.as_()
                }
            });
        }

        for (dst, src) in x.iter_mut().zip(out) {
            *dst = src.as_();
        }
    }

    /// Multiplies `x` by `Mᵗ` in place.
    #[inline]
    pub fn apply_transposed<W, T>(&self, x: &mut [T; N])
    where
        W: Accumulator + AsPrimitive<T>,
        T: AsPrimitive<W>,
    {
        self.transpose().apply::<W, T>(x);
    }
}

/// Which way to multiply by a special-size matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// `y = M·x`
    Forward,
    /// `y = Mᵗ·x`, the inverse of [`Direction::Forward`] up to a factor of `n`.
    Transposed,
}

/// A transform length with a committed sign table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum SpecialSize {
    /// 12 points.
    H12,
    /// 20 points.
    H20,
    /// 28 points.
    H28,
    /// 40 points.
    H40,
}

impl SpecialSize {
    /// Every supported size, in increasing order.
    pub const ALL: [SpecialSize; 4] = [
        SpecialSize::H12,
        SpecialSize::H20,
        SpecialSize::H28,
        SpecialSize::H40,
    ];

    /// The transform length.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            SpecialSize::H12 => 12,
            SpecialSize::H20 => 20,
            SpecialSize::H28 => 28,
            SpecialSize::H40 => 40,
        }
    }

    /// Always `false`; present for symmetry with [`SpecialSize::len`].
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }

    /// The coefficient in row `i`, column `j`, either `1` or `-1`.
    ///
    /// # Panics
    ///
    /// - If `i` or `j` is not below [`SpecialSize::len`].
    #[inline]
    #[must_use]
    pub const fn sign(self, i: usize, j: usize) -> i8 {
        match self {
            SpecialSize::H12 => tables::H12.sign(i, j),
            SpecialSize::H20 => tables::H20.sign(i, j),
            SpecialSize::H28 => tables::H28.sign(i, j),
            SpecialSize::H40 => tables::H40.sign(i, j),
        }
    }

    /// Renders the sign table as one line of `+`/`-` per row.
    #[inline]
    #[must_use]
    pub fn table(self) -> String {
        match self {
            SpecialSize::H12 => tables::H12.to_string(),
            SpecialSize::H20 => tables::H20.to_string(),
            SpecialSize::H28 => tables::H28.to_string(),
            SpecialSize::H40 => tables::H40.to_string(),
        }
    }

    /// Forward transform of `x` in place, accumulating in `f32`.
    ///
    /// # Errors
    ///
    /// - Returns `LengthMismatch` if `x.len() != self.len()`.
    #[inline]
    pub fn apply<T>(self, x: &mut [T]) -> Result<(), Error>
    where
        T: AsPrimitive<f32>,
        f32: AsPrimitive<T>,
    {
        self.transform::<f32, T>(Direction::Forward, x)
    }

    /// Transposed transform of `x` in place, accumulating in `f32`.
    ///
    /// # Errors
    ///
    /// - Returns `LengthMismatch` if `x.len() != self.len()`.
    #[inline]
    pub fn apply_transposed<T>(self, x: &mut [T]) -> Result<(), Error>
    where
        T: AsPrimitive<f32>,
        f32: AsPrimitive<T>,
    {
        self.transform::<f32, T>(Direction::Transposed, x)
    }

    /// Transforms `x` in place with an explicit working precision `W`.
    ///
    /// # Errors
    ///
    /// - Returns `LengthMismatch` if `x.len() != self.len()`.
    #[inline]
    pub fn transform<W, T>(self, direction: Direction, x: &mut [T]) -> Result<(), Error>
    where
        W: Accumulator + AsPrimitive<T>,
        T: AsPrimitive<W>,
    {
        debug!("{}-point special Hadamard transform ({:?})", self, direction);
        match self {
            SpecialSize::H12 => run::<W, T, 12>(&tables::H12, &tables::H12_T, direction, x),
            SpecialSize::H20 => run::<W, T, 20>(&tables::H20, &tables::H20_T, direction, x),
            SpecialSize::H28 => run::<W, T, 28>(&tables::H28, &tables::H28_T, direction, x),
            SpecialSize::H40 => run::<W, T, 40>(&tables::H40, &tables::H40_T, direction, x),
        }
    }
}

impl TryFrom<usize> for SpecialSize {
    type Error = Error;

    #[inline]
    fn try_from(n: usize) -> Result<Self, Self::Error> {
        match n {
            12 => Ok(SpecialSize::H12),
            20 => Ok(SpecialSize::H20),
            28 => Ok(SpecialSize::H28),
            40 => Ok(SpecialSize::H40),
            _ => Err(Error::UnsupportedSize(n)),
        }
    }
}

impl Display for SpecialSize {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.len())
    }
}

fn run<W, T, const N: usize>(
    forward: &SignMatrix<N>,
    transposed: &SignMatrix<N>,
    direction: Direction,
    x: &mut [T],
) -> Result<(), Error>
where
    W: Accumulator + AsPrimitive<T>,
    T: AsPrimitive<W>,
{
    let actual = x.len();
    let x: &mut [T; N] = x.try_into().map_err(|_| Error::LengthMismatch {
        expected: N,
        actual,
    })?;
    match direction {
        Direction::Forward => forward.apply::<W, T>(x),
        Direction::Transposed => transposed.apply::<W, T>(x),
    }
    Ok(())
}

/// Whether `n` has a committed sign table.
#[inline]
#[must_use]
pub fn is_special_size(n: usize) -> bool {
    SpecialSize::try_from(n).is_ok()
}

/// Forward transform of `x` in place, picking the table from `x.len()`.
///
/// Accumulates in `f32`.
///
/// # Errors
///
/// - Returns `UnsupportedSize` if no table exists for `x.len()`.
#[inline]
pub fn apply_slice<T>(x: &mut [T]) -> Result<SpecialSize, Error>
where
    T: AsPrimitive<f32>,
    f32: AsPrimitive<T>,
{
    let size = SpecialSize::try_from(x.len())?;
    size.apply(x)?;
    Ok(size)
}

macro_rules! entry_points {
    ($($n:literal: $table:ident, $table_t:ident => $fwd:ident, $fwd_in:ident, $inv:ident, $inv_in:ident;)*) => {
        $(
            #[doc = concat!("Forward ", stringify!($n), "-point transform of `x` in place, accumulating in `f32`.")]
            #[inline]
            pub fn $fwd<T>(x: &mut [T; $n])
            where
                T: AsPrimitive<f32>,
                f32: AsPrimitive<T>,
            {
                tables::$table.apply::<f32, T>(x);
            }

            #[doc = concat!("Forward ", stringify!($n), "-point transform of `x` in place, accumulating in `W`.")]
            #[inline]
            pub fn $fwd_in<W, T>(x: &mut [T; $n])
            where
                W: Accumulator + AsPrimitive<T>,
                T: AsPrimitive<W>,
            {
                tables::$table.apply::<W, T>(x);
            }

            #[doc = concat!("Transposed ", stringify!($n), "-point transform of `x` in place, accumulating in `f32`.")]
            ///
            /// Undoes the forward transform up to a factor of the size.
            #[inline]
            pub fn $inv<T>(x: &mut [T; $n])
            where
                T: AsPrimitive<f32>,
                f32: AsPrimitive<T>,
            {
                tables::$table_t.apply::<f32, T>(x);
            }

            #[doc = concat!("Transposed ", stringify!($n), "-point transform of `x` in place, accumulating in `W`.")]
            #[inline]
            pub fn $inv_in<W, T>(x: &mut [T; $n])
            where
                W: Accumulator + AsPrimitive<T>,
                T: AsPrimitive<W>,
            {
                tables::$table_t.apply::<W, T>(x);
            }
        )*
    };
}

entry_points! {
    12: H12, H12_T => hadamard_mult_12, hadamard_mult_12_in, hadamard_mult_12_transposed, hadamard_mult_12_transposed_in;
    20: H20, H20_T => hadamard_mult_20, hadamard_mult_20_in, hadamard_mult_20_transposed, hadamard_mult_20_transposed_in;
    28: H28, H28_T => hadamard_mult_28, hadamard_mult_28_in, hadamard_mult_28_transposed, hadamard_mult_28_transposed_in;
    40: H40, H40_T => hadamard_mult_40, hadamard_mult_40_in, hadamard_mult_40_transposed, hadamard_mult_40_transposed_in;
}
