// lattice/tests.rs

use super::*;
use crate::error::LatticeError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(2024)
}

#[test]
fn occupancy_grid_sets_dimensions_and_population() {
    let grid = vec![vec![0, 1, 2], vec![3, 0, 5]];
    let lattice = Lattice::from_occupancy(&grid, &mut rng()).unwrap();
    assert_eq!(lattice.dimensions(), (3, 2));
    assert_eq!(lattice.population_field(), grid);
    assert_eq!(lattice.total_population(), 11);
    assert_eq!(lattice.cell(2, 1).population(), 5);
}

#[test]
fn charge_field_matches_cells() {
    let grid = vec![vec![4, 4], vec![4, 4]];
    let lattice = Lattice::from_occupancy(&grid, &mut rng()).unwrap();
    let field = lattice.charge_field();
    for y in 0..2 {
        for x in 0..2 {
            assert_eq!(field[y][x], lattice.cell(x, y).total_charge());
            assert!(field[y][x].abs() <= 4);
            assert_eq!(field[y][x].rem_euclid(2), 0);
        }
    }
    assert_eq!(field.iter().flatten().sum::<i64>(), lattice.total_charge());
}

#[test]
fn ragged_grid_fails_fast() {
    let grid = vec![vec![1, 1], vec![1]];
    let err = Lattice::from_occupancy(&grid, &mut rng()).unwrap_err();
    assert!(matches!(err, LatticeError::InvalidDimensions(ref m) if m.contains("row 1")));
}

#[test]
fn negative_count_fails_fast() {
    let grid = vec![vec![1, -2]];
    assert!(matches!(
        Lattice::from_occupancy(&grid, &mut rng()),
        Err(LatticeError::InvalidDimensions(_))
    ));
}

#[test]
fn empty_grid_is_rejected() {
    let grid: Vec<Vec<i64>> = Vec::new();
    assert!(Lattice::from_occupancy(&grid, &mut rng()).is_err());
    let grid: Vec<Vec<i64>> = vec![Vec::new()];
    assert!(Lattice::from_occupancy(&grid, &mut rng()).is_err());
}

#[test]
fn signed_maps_place_exact_charges() {
    let positive = vec![vec![2, 0], vec![0, 1]];
    let negative = vec![vec![0, 3], vec![0, 1]];
    let lattice = Lattice::from_signed_maps(&positive, &negative).unwrap();
    assert_eq!(lattice.charge_field(), vec![vec![2, -3], vec![0, 0]]);
    assert_eq!(lattice.population_field(), vec![vec![2, 3], vec![0, 2]]);
}

#[test]
fn signed_maps_must_share_shape() {
    let positive = vec![vec![1, 1]];
    let negative = vec![vec![1], vec![1]];
    assert!(matches!(
        Lattice::from_signed_maps(&positive, &negative),
        Err(LatticeError::InvalidDimensions(_))
    ));
}

#[test]
fn contains_checks_both_axes() {
    let lattice = Lattice::empty(4, 2);
    assert!(lattice.contains(0, 0));
    assert!(lattice.contains(3, 1));
    assert!(!lattice.contains(4, 0));
    assert!(!lattice.contains(0, 2));
    assert!(!lattice.contains(-1, 0));
    assert!(!lattice.contains(0, -1));
}

#[test]
fn from_cells_checks_cell_count() {
    assert!(Lattice::from_cells(2, 2, vec![ChargeCell::empty(); 3]).is_err());
    assert!(Lattice::from_cells(0, 0, Vec::new()).is_err());
    assert!(Lattice::from_cells(2, 1, vec![ChargeCell::empty(); 2]).is_ok());
}

#[test]
fn clear_empties_every_cell() {
    let mut lattice = Lattice::from_occupancy(&filled_grid(3, 3, 2), &mut rng()).unwrap();
    lattice.clear();
    assert_eq!(lattice.total_population(), 0);
    assert_eq!(lattice.dimensions(), (3, 3));
}

#[test]
fn non_unit_charges_are_rejected() {
    let mut bad = ChargeCell::with_counts(1, 1);
    bad.charges.push(5);
    let cells = vec![ChargeCell::empty(), bad];
    assert!(matches!(
        Lattice::from_cells(2, 1, cells),
        Err(LatticeError::InvalidParameter { name: "charge", .. })
    ));
}
