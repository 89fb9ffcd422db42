#![allow(clippy::unwrap_used, reason = "allow in test files")]

use std::{cell::RefCell, sync::Once};

use log::LevelFilter;
use rand::{SeedableRng, rngs::StdRng};

use super::*;
use crate::verify::random_vector;

fn assert_close(got: &[f32], want: &[f32], tol: f32) {
    assert_eq!(got.len(), want.len());
    let scale = want.iter().fold(0.0f32, |m, v| m.max(v.abs()));
    for (i, (g, w)) in got.iter().zip(want).enumerate() {
        assert!(
            (g - w).abs() <= tol * scale.max(1.0),
            "index {i}: got {g}, want {w}"
        );
    }
}

fn ones_forward(size: SpecialSize) -> Vec<f32> {
    let mut x = vec![1.0f32; size.len()];
    size.apply(&mut x).unwrap();
    x
}

#[test]
fn zero_vector_stays_zero() {
    for size in SpecialSize::ALL {
        let mut x = vec![0.0f32; size.len()];
        size.apply(&mut x).unwrap();
        assert!(x.iter().all(|&v| v == 0.0), "size {size}");
        size.apply_transposed(&mut x).unwrap();
        assert!(x.iter().all(|&v| v == 0.0), "size {size}");
    }
}

#[test]
fn ones_give_row_sums() {
    let out = ones_forward(SpecialSize::H12);
    assert_eq!(out[0], -10.0);
    assert!(out[1..].iter().all(|&v| v == 2.0));

    let out = ones_forward(SpecialSize::H40);
    assert_eq!(out[0], -36.0);
    assert!(out[1..20].iter().all(|&v| v == 4.0));
    assert!(out[20..].iter().all(|&v| v == 0.0));

    for size in SpecialSize::ALL {
        let out = ones_forward(size);
        for (i, &v) in out.iter().enumerate() {
            let row_sum: i32 = (0..size.len()).map(|j| i32::from(size.sign(i, j))).sum();
            assert_eq!(v, row_sum as f32, "size {size}, row {i}");
        }
    }
}

#[test]
fn unit_vector_selects_column() {
    for size in SpecialSize::ALL {
        let n = size.len();
        for j in [0, 1, n / 2, n - 1] {
            let mut x = vec![0.0f32; n];
            x[j] = 1.0;
            size.apply(&mut x).unwrap();
            for (i, &v) in x.iter().enumerate() {
                assert_eq!(v, f32::from(size.sign(i, j)), "size {size}, ({i}, {j})");
            }
        }
    }
}

#[test]
fn ramp_matches_hand_computed_output() {
    let mut x: [i32; 12] = std::array::from_fn(|i| i as i32);
    hadamard_mult_12(&mut x);
    assert_eq!(x, [-66, 12, 2, 14, 4, -6, -16, -4, 8, 20, 10, 22]);

    let mut x: [i64; 28] = std::array::from_fn(|i| i as i64);
    hadamard_mult_28_transposed_in::<i64, i64>(&mut x);
    assert_eq!(
        x,
        [
            42, 40, 38, 36, 34, 32, 30, -56, -62, -40, -46, -52, -30, -36, -112, -118, -124, -102,
            -80, -86, -92, -126, -104, -110, -116, -122, -128, -106,
        ]
    );
}

#[test]
fn forward_then_transposed_scales_by_size() {
    let mut rng = StdRng::seed_from_u64(7);
    for size in SpecialSize::ALL {
        let x = random_vector(&mut rng, size.len());
        let mut y = x.clone();
        size.apply(&mut y).unwrap();
        size.apply_transposed(&mut y).unwrap();

        let n = size.len() as f32;
        let want: Vec<f32> = x.iter().map(|v| n * v).collect();
        assert_close(&y, &want, 1e-4);

        // Transposed first works the same way.
        let mut y = x.clone();
        size.apply_transposed(&mut y).unwrap();
        size.apply(&mut y).unwrap();
        assert_close(&y, &want, 1e-4);
    }
}

#[test]
fn forward_twice_is_not_the_inverse() {
    let mut x = [1i64, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    hadamard_mult_12_in::<i64, i64>(&mut x);
    hadamard_mult_12_in::<i64, i64>(&mut x);
    assert_ne!(x, [12, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn integer_round_trip_is_exact() {
    let original: [i32; 40] = std::array::from_fn(|i| (i as i32 * 37 % 101) - 50);
    let mut x = original;
    hadamard_mult_40_in::<i64, i32>(&mut x);
    hadamard_mult_40_transposed_in::<i64, i32>(&mut x);
    let want = original.map(|v| 40 * v);
    assert_eq!(x, want);

    let original: [i16; 20] = std::array::from_fn(|i| i as i16 - 10);
    let mut x = original;
    hadamard_mult_20_transposed_in::<i32, i16>(&mut x);
    hadamard_mult_20_in::<i32, i16>(&mut x);
    assert_eq!(x, original.map(|v| 20 * v));
}

#[test]
fn linearity_is_exact_for_integers() {
    let x: [i64; 28] = std::array::from_fn(|i| i as i64 * 3 - 40);
    let y: [i64; 28] = std::array::from_fn(|i| 17 - (i as i64 * i as i64) % 23);
    let (a, b) = (5i64, -3i64);

    let mut combined: [i64; 28] = std::array::from_fn(|i| a * x[i] + b * y[i]);
    hadamard_mult_28_in::<i64, i64>(&mut combined);

    let (mut tx, mut ty) = (x, y);
    hadamard_mult_28_in::<i64, i64>(&mut tx);
    hadamard_mult_28_in::<i64, i64>(&mut ty);
    let separate: [i64; 28] = std::array::from_fn(|i| a * tx[i] + b * ty[i]);

    assert_eq!(combined, separate);
}

#[test]
fn energy_is_scaled_by_size() {
    let mut rng = StdRng::seed_from_u64(11);
    for size in SpecialSize::ALL {
        let x: Vec<f64> = random_vector(&mut rng, size.len())
            .into_iter()
            .map(f64::from)
            .collect();
        let mut y = x.clone();
        size.transform::<f64, f64>(Direction::Forward, &mut y).unwrap();

        let before: f64 = x.iter().map(|v| v * v).sum();
        let after: f64 = y.iter().map(|v| v * v).sum();
        assert!((after - size.len() as f64 * before).abs() < 1e-9 * after.max(1.0));
    }
}

#[test]
fn array_and_slice_entry_points_agree() {
    let mut rng = StdRng::seed_from_u64(3);
    let x = random_vector(&mut rng, 20);

    let mut arr: [f32; 20] = x.clone().try_into().unwrap();
    hadamard_mult_20(&mut arr);

    let mut slice = x.clone();
    assert_eq!(apply_slice(&mut slice).unwrap(), SpecialSize::H20);
    assert_eq!(&arr[..], &slice[..]);

    let mut via_matrix = x;
    SpecialSize::H20.apply(&mut via_matrix).unwrap();
    assert_eq!(&arr[..], &via_matrix[..]);
}

#[test]
fn f64_working_precision_is_available() {
    let mut x = [0.1f32; 12];
    hadamard_mult_12_in::<f64, f32>(&mut x);
    assert!((x[0] + 1.0).abs() < 1e-6);
    assert!(x[1..].iter().all(|v| (v - 0.2).abs() < 1e-6));
}

#[test]
fn end_to_end_size_20() {
    let mut rng = StdRng::seed_from_u64(20);
    let original = random_vector(&mut rng, 20);

    let mut x: [f32; 20] = original.clone().try_into().unwrap();
    hadamard_mult_20(&mut x);
    hadamard_mult_20_transposed(&mut x);

    for (got, want) in x.iter().zip(&original) {
        let want = 20.0 * want;
        assert!(
            (got - want).abs() <= 1e-3 * want.abs().max(1.0),
            "got {got}, want {want}"
        );
    }
}

#[test]
fn wrong_length_is_rejected() {
    let mut short = vec![1.0f32; 11];
    assert_eq!(
        SpecialSize::H12.apply(&mut short),
        Err(Error::LengthMismatch {
            expected: 12,
            actual: 11
        })
    );
    assert!(short.iter().all(|&v| v == 1.0));

    let mut long = vec![1.0f32; 13];
    assert_eq!(
        SpecialSize::H12.apply_transposed(&mut long),
        Err(Error::LengthMismatch {
            expected: 12,
            actual: 13
        })
    );
    assert_eq!(apply_slice(&mut long), Err(Error::UnsupportedSize(13)));
}

#[test]
fn size_conversions() {
    for size in SpecialSize::ALL {
        assert_eq!(SpecialSize::try_from(size.len()), Ok(size));
        assert!(is_special_size(size.len()));
        assert_eq!(size.to_string(), size.len().to_string());
    }
    for n in [0, 1, 8, 16, 24, 32, 36, 64] {
        assert_eq!(SpecialSize::try_from(n), Err(Error::UnsupportedSize(n)));
        assert!(!is_special_size(n));
    }
}

#[test]
fn table_renders_every_row() {
    let table = SpecialSize::H28.table();
    assert_eq!(table.lines().count(), 28);
    assert!(table.lines().all(|line| line.len() == 28));
    assert!(table.starts_with("+------++----++-+--+-+--++--\n"));
}

#[test]
fn matrix_apply_transposed_matches_table() {
    let mut rng = StdRng::seed_from_u64(40);
    let x: [f32; 40] = random_vector(&mut rng, 40).try_into().unwrap();

    let mut via_matrix = x;
    tables::H40.apply_transposed::<f32, f32>(&mut via_matrix);
    let mut via_entry_point = x;
    hadamard_mult_40_transposed(&mut via_entry_point);
    assert_eq!(via_matrix, via_entry_point);
}

#[test]
fn default_precision_is_f32_for_every_element_type() {
    // 2^24 + 1 is exact in f64 but rounds to 2^24 in f32.
    let mut input = [0.0f64; 12];
    input[0] = 16_777_217.0;
    input[1] = 1.0;

    // Row 0 of H12 is + followed by eleven -.
    let mut x = input;
    hadamard_mult_12(&mut x);
    assert_eq!(x[0], 16_777_215.0);

    let mut x = input;
    hadamard_mult_12_in::<f64, f64>(&mut x);
    assert_eq!(x[0], 16_777_216.0);
}

thread_local! {
    static RECORDS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

struct Capture;

impl log::Log for Capture {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        if record.level() == log::Level::Debug {
            RECORDS.with(|r| r.borrow_mut().push(record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture;

fn debug_records(f: impl FnOnce()) -> Vec<String> {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(LevelFilter::Debug);
    });
    RECORDS.with(|r| r.borrow_mut().clear());
    f();
    RECORDS.with(RefCell::take)
}

#[test]
fn runtime_sized_transforms_log_size_and_direction() {
    let records = debug_records(|| {
        SpecialSize::H28
            .apply_transposed(&mut [0.0f32; 28])
            .unwrap();
        apply_slice(&mut [0.0f32; 12]).unwrap();
        SpecialSize::H40
            .transform::<f64, f64>(Direction::Forward, &mut [0.0f64; 40])
            .unwrap();
    });
    assert_eq!(
        records,
        [
            "28-point special Hadamard transform (Transposed)",
            "12-point special Hadamard transform (Forward)",
            "40-point special Hadamard transform (Forward)",
        ]
    );
}
