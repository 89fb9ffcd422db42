//! Harness side of the oracle.
//!
//! Consumers validate a fast implementation by running it and the oracle on
//! the same input and comparing the outputs within a [`Tolerance`]. The
//! property checks and [`self_test`] exercise the oracle's own invariants.


use log::{info, warn};
use num_traits::AsPrimitive;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;

use crate::{Direction, Error, SpecialSize};

/// How far a candidate value may deviate from the reference.
///
/// A value passes when `|expected - actual| <= abs + rel * |expected|`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerance {
    /// Absolute slack.
    pub abs: f64,
    /// Slack relative to the reference value.
    pub rel: f64,
}

impl Tolerance {
    /// Bit-exact comparison, for integer element types.
    pub const EXACT: Tolerance = Tolerance { abs: 0.0, rel: 0.0 };

    /// The largest allowed deviation from the reference value `expected`.
    #[inline]
    #[must_use]
    pub fn bound(&self, expected: f64) -> f64 {
        self.abs + self.rel * expected.abs()
    }
}

impl Default for Tolerance {
    #[inline]
    fn default() -> Self {
        Tolerance {
            abs: 1e-5,
            rel: 1e-3,
        }
    }
}

/// Summary of a successful comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Comparison {
    /// Number of compared elements.
    pub len: usize,
    /// Largest absolute difference observed.
    pub max_abs_diff: f64,
}

/// Compares `candidate` against `reference` element by element.
///
/// NaN never compares equal, not even to NaN.
///
/// # Errors
///
/// - Returns `LengthMismatch` if the slices differ in length.
/// - Returns `Mismatch` for the first element outside the tolerance.
#[inline]
pub fn compare<T>(reference: &[T], candidate: &[T], tolerance: Tolerance) -> Result<Comparison, Error>
where
    T: AsPrimitive<f64>,
{
    if reference.len() != candidate.len() {
        return Err(Error::LengthMismatch {
            expected: reference.len(),
            actual: candidate.len(),
        });
    }

    let mut max_abs_diff = 0.0f64;
    for (index, (&expected, &actual)) in reference.iter().zip(candidate).enumerate() {
        let (expected, actual): (f64, f64) = (expected.as_(), actual.as_());
        let diff = (expected - actual).abs();
        // Negated so that NaN fails.
        if !(diff <= tolerance.bound(expected)) {
            return Err(Error::Mismatch {
                index,
                expected,
                actual,
            });
        }
        max_abs_diff = max_abs_diff.max(diff);
    }

    Ok(Comparison {
        len: reference.len(),
        max_abs_diff,
    })
}

/// Runs `candidate` and the oracle's forward transform on copies of `input`
/// and compares the results.
///
/// # Errors
///
/// - Returns `LengthMismatch` if `input` does not have `size.len()` elements.
/// - Returns `Mismatch` if the candidate disagrees with the oracle.
#[inline]
pub fn check_candidate<F>(
    size: SpecialSize,
    input: &[f32],
    candidate: F,
    tolerance: Tolerance,
) -> Result<Comparison, Error>
where
    F: FnOnce(&mut [f32]),
{
    let mut expected = input.to_vec();
    size.apply(&mut expected)?;

    let mut actual = input.to_vec();
    candidate(&mut actual);

    compare(&expected, &actual, tolerance)
}

/// Checks that the transposed transform undoes the forward one:
/// `Mᵗ·(M·x) = n·x`, accumulating in `f64`.
///
/// # Errors
///
/// - Returns `LengthMismatch` if `x` does not have `size.len()` elements.
/// - Returns `Mismatch` if the round trip is outside the tolerance.
#[inline]
pub fn check_inverse(size: SpecialSize, x: &[f32], tolerance: Tolerance) -> Result<Comparison, Error> {
    let mut round_trip = widen(x);
    size.transform::<f64, f64>(Direction::Forward, &mut round_trip)?;
    size.transform::<f64, f64>(Direction::Transposed, &mut round_trip)?;

    let n = size.len() as f64;
    let expected: Vec<f64> = x.iter().map(|&v| n * f64::from(v)).collect();
    compare(&expected, &round_trip, tolerance)
}

/// Checks `‖M·x‖² = n·‖x‖²`, accumulating in `f64`.
///
/// # Errors
///
/// - Returns `LengthMismatch` if `x` does not have `size.len()` elements.
/// - Returns `EnergyMismatch` if the energies differ beyond the tolerance.
#[inline]
pub fn check_energy(size: SpecialSize, x: &[f32], tolerance: Tolerance) -> Result<(), Error> {
    let mut y = widen(x);
    let expected = size.len() as f64 * y.iter().map(|v| v * v).sum::<f64>();

    size.transform::<f64, f64>(Direction::Forward, &mut y)?;
    let actual = y.iter().map(|v| v * v).sum::<f64>();

    if (expected - actual).abs() <= tolerance.bound(expected) {
        Ok(())
    } else {
        Err(Error::EnergyMismatch { expected, actual })
    }
}

/// Checks `M·(a·x + b·y) = a·M·x + b·M·y`, accumulating in `f64`.
///
/// # Errors
///
/// - Returns `LengthMismatch` if `x` or `y` does not have `size.len()`
///   elements.
/// - Returns `Mismatch` if the two sides differ beyond the tolerance.
#[inline]
pub fn check_linearity(
    size: SpecialSize,
    x: &[f32],
    y: &[f32],
    a: f32,
    b: f32,
    tolerance: Tolerance,
) -> Result<Comparison, Error> {
    if x.len() != y.len() {
        return Err(Error::LengthMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }

    let (a, b) = (f64::from(a), f64::from(b));
    let (mut tx, mut ty) = (widen(x), widen(y));
    let mut combined: Vec<f64> = tx.iter().zip(&ty).map(|(&u, &v)| a * u + b * v).collect();
    size.transform::<f64, f64>(Direction::Forward, &mut combined)?;

    size.transform::<f64, f64>(Direction::Forward, &mut tx)?;
    size.transform::<f64, f64>(Direction::Forward, &mut ty)?;
    let separate: Vec<f64> = tx.iter().zip(&ty).map(|(&u, &v)| a * u + b * v).collect();

    compare(&separate, &combined, tolerance)
}

fn widen(x: &[f32]) -> Vec<f64> {
    x.iter().map(|&v| f64::from(v)).collect()
}

/// The invariant a self-test check exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum Property {
    /// Forward then transposed gives `n·x`.
    Inverse,
    /// Parseval identity.
    Energy,
    /// Superposition.
    Linearity,
}

/// Options for [`self_test`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfTestConfig {
    /// Random vectors per size.
    pub trials: usize,
    /// Seed for the vector generator. Trial `t` uses `seed + t`.
    pub seed: u64,
    /// Tolerance for every check.
    pub tolerance: Tolerance,
}

impl Default for SelfTestConfig {
    #[inline]
    fn default() -> Self {
        SelfTestConfig {
            trials: 256,
            seed: 0x5eed,
            tolerance: Tolerance::default(),
        }
    }
}

/// One failed check.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SelfTestFailure {
    /// Size under test.
    pub size: SpecialSize,
    /// Trial index.
    pub trial: usize,
    /// The violated invariant.
    pub property: Property,
    /// What went wrong.
    pub message: String,
}

/// Outcome of [`self_test`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct SelfTestReport {
    /// Number of trials run.
    pub trials: usize,
    /// Number of individual checks run.
    pub checks: usize,
    /// Failed checks, ordered by trial.
    pub failures: Vec<SelfTestFailure>,
}

impl SelfTestReport {
    /// Whether every check passed.
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

const CHECKS_PER_SIZE: usize = 3;

/// Runs every property check on seeded random vectors for every size.
///
/// Trials run in parallel; the report is deterministic for a given config.
#[inline]
#[must_use]
pub fn self_test(config: SelfTestConfig) -> SelfTestReport {
    let failures: Vec<SelfTestFailure> = (0..config.trials)
        .into_par_iter()
        .flat_map_iter(|trial| run_trial(trial, &config))
        .collect();

    for failure in &failures {
        warn!(
            "[self-test] size {} trial {}: {:?} failed: {}",
            failure.size, failure.trial, failure.property, failure.message
        );
    }

    let checks = config.trials * SpecialSize::ALL.len() * CHECKS_PER_SIZE;
    info!(
        "[self-test] {} checks over {} trials, {} failed",
        checks,
        config.trials,
        failures.len()
    );

    SelfTestReport {
        trials: config.trials,
        checks,
        failures,
    }
}

fn run_trial(trial: usize, config: &SelfTestConfig) -> Vec<SelfTestFailure> {
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(trial as u64));
    let mut failures = Vec::new();

    for size in SpecialSize::ALL {
        let x = random_vector(&mut rng, size.len());
        let y = random_vector(&mut rng, size.len());
        let a = rng.gen_range(-2.0f32..2.0);
        let b = rng.gen_range(-2.0f32..2.0);

        let results = [
            (Property::Inverse, check_inverse(size, &x, config.tolerance).map(drop)),
            (Property::Energy, check_energy(size, &x, config.tolerance)),
            (
                Property::Linearity,
                check_linearity(size, &x, &y, a, b, config.tolerance).map(drop),
            ),
        ];
        for (property, result) in results {
            if let Err(err) = result {
                failures.push(SelfTestFailure {
                    size,
                    trial,
                    property,
                    message: err.to_string(),
                });
            }
        }
    }

    failures
}

/// A vector of `len` values drawn uniformly from `[-1, 1)`.
#[inline]
pub fn random_vector<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}
