// diffusion.rs
// One synchronous diffusion step: every charge of the old lattice proposes a
// move, energies are read from the old lattice only, and the outcome is
// written into the (cleared) scratch lattice.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::cell::Charge;
use crate::config::{AcceptanceRule, SimConfig, WalkRule};
use crate::lattice::Lattice;
use crate::profile_scope;

use super::streams::row_stream;

/// Orthogonal neighbours in heat-bath order: left, right, top, bottom.
const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Parameters of a single step, resolved once from the config.
#[derive(Clone, Copy, Debug)]
pub struct StepRules {
    pub temperature: f64,
    pub coupling: f64,
    pub walk: WalkRule,
    pub acceptance: AcceptanceRule,
}

impl StepRules {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            temperature: config.temperature,
            coupling: config.coupling.value(),
            walk: config.walk,
            acceptance: config.acceptance,
        }
    }

    /// Interaction energy of charge `q` with the net charge `q_dest` already
    /// sitting at the destination.
    #[inline]
    pub fn energy(&self, q: Charge, q_dest: i64) -> f64 {
        self.coupling * q_dest as f64 * q as f64
    }
}

/// `exp(-energy / T)`
#[inline]
pub fn boltzmann_factor(energy: f64, temperature: f64) -> f64 {
    (-energy / temperature).exp()
}

/// Single-threaded step. `next` must be empty and of the same dimensions.
pub fn step_serial(old: &Lattice, next: &mut Lattice, rules: &StepRules, step_seed: u64) {
    profile_scope!("step_serial");
    for y in 0..old.height() {
        let mut rng = row_stream(step_seed, y);
        diffuse_row(old, y, rules, &mut rng, |x, y, q| next.cell_mut(x, y).add_charge(q));
    }
}

/// Rows are diffused on the rayon pool into per-row buffers, which are then
/// merged in row order. Produces exactly the same lattice as `step_serial`.
pub fn step_parallel(old: &Lattice, next: &mut Lattice, rules: &StepRules, step_seed: u64) {
    profile_scope!("step_parallel");
    let placements: Vec<Vec<(usize, Charge)>> = (0..old.height())
        .into_par_iter()
        .map(|y| {
            let mut rng = row_stream(step_seed, y);
            let mut local = Vec::new();
            diffuse_row(old, y, rules, &mut rng, |x, y, q| local.push((old.index(x, y), q)));
            local
        })
        .collect();

    let cells = next.cells_mut();
    for row in placements {
        for (idx, q) in row {
            cells[idx].add_charge(q);
        }
    }
}

/// Moves every charge of row `y` and reports each final position via `place`.
fn diffuse_row(
    old: &Lattice,
    y: usize,
    rules: &StepRules,
    rng: &mut ChaCha8Rng,
    mut place: impl FnMut(usize, usize, Charge),
) {
    for (x, cell) in old.row(y).iter().enumerate() {
        for q in cell.iter() {
            let (nx, ny) = match rules.walk {
                WalkRule::Diagonal => diagonal_move(old, x, y, q, rules, rng),
                WalkRule::HeatBath => heat_bath_move(old, x, y, q, rules, rng),
            };
            place(nx, ny, q);
        }
    }
}

/// Proposes `(x +- 1, y +- 1)` and applies the acceptance rule. Rejected and
/// out-of-bounds proposals leave the charge where it was.
fn diagonal_move(
    old: &Lattice,
    x: usize,
    y: usize,
    q: Charge,
    rules: &StepRules,
    rng: &mut ChaCha8Rng,
) -> (usize, usize) {
    let dx: isize = if rng.random_bool(0.5) { 1 } else { -1 };
    let dy: isize = if rng.random_bool(0.5) { 1 } else { -1 };
    let nx = x as isize + dx;
    let ny = y as isize + dy;
    if !old.contains(nx, ny) {
        return (x, y);
    }
    let (nx, ny) = (nx as usize, ny as usize);
    let energy = rules.energy(q, old.charge_at(nx, ny));
    let bf = boltzmann_factor(energy, rules.temperature);
    if rules.acceptance.accepts(bf, || rng.random::<f64>()) {
        (nx, ny)
    } else {
        (x, y)
    }
}

/// Picks one of the four orthogonal neighbours with probability proportional
/// to its Boltzmann factor. Neighbours outside the lattice weigh zero; with
/// no admissible neighbour the charge stays.
fn heat_bath_move(
    old: &Lattice,
    x: usize,
    y: usize,
    q: Charge,
    rules: &StepRules,
    rng: &mut ChaCha8Rng,
) -> (usize, usize) {
    let mut weights = [0.0f64; 4];
    for (w, &(dx, dy)) in weights.iter_mut().zip(ORTHOGONAL.iter()) {
        let nx = x as isize + dx;
        let ny = y as isize + dy;
        if old.contains(nx, ny) {
            let energy = rules.energy(q, old.charge_at(nx as usize, ny as usize));
            *w = boltzmann_factor(energy, rules.temperature);
        }
    }
    let target = |i: usize| {
        let (dx, dy) = ORTHOGONAL[i];
        ((x as isize + dx) as usize, (y as isize + dy) as usize)
    };

    // Overflowed weights dominate everything finite: choose among them uniformly.
    let infinite: Vec<usize> = (0..4).filter(|&i| weights[i].is_infinite()).collect();
    if !infinite.is_empty() {
        return target(infinite[rng.random_range(0..infinite.len())]);
    }

    let sum: f64 = weights.iter().sum();
    if !(sum > 0.0) {
        return (x, y);
    }
    let r = sum * rng.random::<f64>();
    let mut upper = 0.0;
    let mut last_admissible = None;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        upper += w;
        last_admissible = Some(i);
        if r < upper {
            return target(i);
        }
    }
    // r landed on the rounding gap above the final cumulative limit
    match last_admissible {
        Some(i) => target(i),
        None => (x, y),
    }
}
