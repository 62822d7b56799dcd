// cell/tests.rs
// Construction and aggregate queries of ChargeCell

use super::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn occupancy_sets_population() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let cell = ChargeCell::new(12, &mut rng);
    assert_eq!(cell.population(), 12);
    assert!(cell.iter().all(|q| q == POSITIVE || q == NEGATIVE));
    assert_eq!(
        cell.positive_count() as i64 - cell.negative_count() as i64,
        cell.total_charge()
    );
}

#[test]
fn non_positive_occupancy_gives_empty_cell() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    assert!(ChargeCell::new(0, &mut rng).is_empty());
    assert!(ChargeCell::new(-3, &mut rng).is_empty());
    assert_eq!(ChargeCell::new(0, &mut rng).total_charge(), 0);
}

#[test]
fn random_signs_are_roughly_balanced() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let cell = ChargeCell::new(10_000, &mut rng);
    let positive = cell.positive_count();
    assert!((4_700..=5_300).contains(&positive), "positive = {positive}");
}

#[test]
fn same_seed_same_cell() {
    let a = ChargeCell::new(64, &mut ChaCha8Rng::seed_from_u64(3));
    let b = ChargeCell::new(64, &mut ChaCha8Rng::seed_from_u64(3));
    assert_eq!(a, b);
}

#[test]
fn add_charge_has_no_occupancy_bound() {
    let mut cell = ChargeCell::empty();
    for _ in 0..100 {
        cell.add_charge(POSITIVE);
    }
    cell.add_charge(NEGATIVE);
    assert_eq!(cell.population(), 101);
    assert_eq!(cell.total_charge(), 99);
}

#[test]
fn with_counts_is_deterministic() {
    let cell = ChargeCell::with_counts(3, 5);
    assert_eq!(cell.population(), 8);
    assert_eq!(cell.total_charge(), -2);
    assert_eq!(cell.positive_count(), 3);
    assert_eq!(cell.negative_count(), 5);
}

#[test]
fn clear_keeps_nothing() {
    let mut cell = ChargeCell::with_counts(2, 2);
    cell.clear();
    assert!(cell.is_empty());
    assert_eq!(cell.total_charge(), 0);
}
