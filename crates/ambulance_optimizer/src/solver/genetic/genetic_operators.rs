use rand::Rng;

use crate::{
    problem::{base_station::BaseStationIdx, shift::ShiftType},
    solver::solution::Solution,
};

/// Single point crossover of each shift, applied with `probability`.
pub fn crossover<R: Rng>(
    parent_a: &Solution,
    parent_b: &Solution,
    probability: f64,
    rng: &mut R,
) -> (Solution, Solution) {
    let mut child_a = parent_a.clone();
    let mut child_b = parent_b.clone();

    if !rng.random_bool(probability) {
        return (child_a, child_b);
    }

    for shift in ShiftType::ALL {
        let a = parent_a.allocation().shift(shift);
        let b = parent_b.allocation().shift(shift);
        if a.len() < 2 || a.len() != b.len() {
            continue;
        }

        let point = rng.random_range(1..a.len());
        child_a.set_shift(shift, [&a[..point], &b[point..]].concat());
        child_b.set_shift(shift, [&b[..point], &a[point..]].concat());
    }

    (child_a, child_b)
}

/// Each position mutates with `probability`, either a station swap or a random flip.
pub fn mutate<R: Rng>(
    solution: &mut Solution,
    probability: f64,
    use_swap_mutation: bool,
    num_base_stations: usize,
    rng: &mut R,
) {
    for shift in ShiftType::ALL {
        let mut stations = solution.allocation().shift(shift).to_vec();
        let mut mutated = false;

        for locus in 0..stations.len() {
            if !rng.random_bool(probability) {
                continue;
            }

            mutated = true;
            if use_swap_mutation && rng.random_bool(0.5) {
                swap_mutation(&mut stations, locus, rng);
            } else {
                stations[locus] = BaseStationIdx::new(rng.random_range(0..num_base_stations));
            }
        }

        if mutated {
            solution.set_shift(shift, stations);
        }
    }
}

/// Exchanges every occurrence of the station at `locus` with another station of the shift.
pub fn swap_mutation<R: Rng>(stations: &mut [BaseStationIdx], locus: usize, rng: &mut R) {
    let station = stations[locus];
    let others = stations
        .iter()
        .copied()
        .filter(|&other| other != station)
        .collect::<Vec<_>>();
    if others.is_empty() {
        return;
    }

    let other = others[rng.random_range(0..others.len())];
    for entry in stations.iter_mut() {
        if *entry == station {
            *entry = other;
        } else if *entry == other {
            *entry = station;
        }
    }
}
