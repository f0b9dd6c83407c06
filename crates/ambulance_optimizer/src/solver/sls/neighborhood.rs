use std::{fmt::Display, str::FromStr};

use rand::{Rng, seq::IteratorRandom};
use serde::{Deserialize, Serialize};

use crate::{
    error::{OptimizerError, ParamsError},
    problem::{base_station::BaseStationIdx, shift::ShiftType},
    solver::{
        evaluator::Evaluator,
        solution::{Solution, evaluate_all},
    },
};

pub const DEFAULT_LAZY_SIZE: usize = 80;

/// Allocations reachable from a root by changing a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborhoodFunction {
    /// Every position moved to the next station.
    Forward,
    /// Every position moved to every other station.
    Hamming,
    /// `size` random single position flips.
    Lazy { size: usize },
}

impl Default for NeighborhoodFunction {
    fn default() -> Self {
        NeighborhoodFunction::Lazy {
            size: DEFAULT_LAZY_SIZE,
        }
    }
}

impl NeighborhoodFunction {
    pub fn neighbors<R: Rng>(
        &self,
        root: &Solution,
        num_base_stations: usize,
        rng: &mut R,
    ) -> Result<Vec<Solution>, OptimizerError> {
        let allocation = root.allocation();

        match *self {
            NeighborhoodFunction::Forward => allocation
                .loci()
                .map(|(shift, index)| {
                    let next = (allocation.get(shift, index).get() + 1) % num_base_stations;
                    neighbor(root, shift, index, BaseStationIdx::new(next))
                })
                .collect(),
            NeighborhoodFunction::Hamming => allocation
                .loci()
                .flat_map(|(shift, index)| {
                    let current = allocation.get(shift, index);
                    BaseStationIdx::all(num_base_stations)
                        .filter(move |&station| station != current)
                        .map(move |station| neighbor(root, shift, index, station))
                })
                .collect(),
            NeighborhoodFunction::Lazy { size } => (0..size)
                .filter_map(|_| random_neighbor(root, num_base_stations, rng).transpose())
                .collect(),
        }
    }

    pub fn parse_with_size(name: &str, lazy_size: usize) -> Result<Self, ParamsError> {
        match name.parse()? {
            NeighborhoodFunction::Lazy { .. } => Ok(NeighborhoodFunction::Lazy { size: lazy_size }),
            neighborhood => Ok(neighborhood),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ParamsError> {
        if let NeighborhoodFunction::Lazy { size: 0 } = self {
            return Err(ParamsError::OutOfRange {
                name: "neighborhood",
                reason: String::from("a lazy neighborhood needs at least one neighbor"),
            });
        }
        Ok(())
    }
}

fn neighbor(
    root: &Solution,
    shift: ShiftType,
    index: usize,
    station: BaseStationIdx,
) -> Result<Solution, OptimizerError> {
    if root.allocation().get(shift, index) == station {
        return Err(OptimizerError::DegenerateNeighbor { shift, index });
    }

    let mut neighbor = root.clone();
    neighbor.set(shift, index, station);
    Ok(neighbor)
}

/// Flips one random position to a different random station, `None` for an empty allocation.
pub fn random_neighbor<R: Rng>(
    root: &Solution,
    num_base_stations: usize,
    rng: &mut R,
) -> Result<Option<Solution>, OptimizerError> {
    let Some((shift, index)) = root.allocation().loci().choose(rng) else {
        return Ok(None);
    };

    let current = root.allocation().get(shift, index).get();
    let station = (current + rng.random_range(1..num_base_stations.max(2))) % num_base_stations;
    neighbor(root, shift, index, BaseStationIdx::new(station)).map(Some)
}

/// Best member of the neighborhood, evaluated on the current rayon pool.
pub fn best_neighbor<R: Rng>(
    root: &Solution,
    neighborhood: NeighborhoodFunction,
    evaluator: &Evaluator,
    rng: &mut R,
) -> Result<Option<Solution>, OptimizerError> {
    let num_base_stations = evaluator.region().num_base_stations();
    let mut neighbors = neighborhood.neighbors(root, num_base_stations, rng)?;
    evaluate_all(&mut neighbors, evaluator)?;

    Ok(neighbors.into_iter().min_by(Solution::compare_fitness))
}

/// Moves to the best neighbor unless it is worse. Returns whether the solution moved.
pub fn greedy_step<R: Rng>(
    solution: &mut Solution,
    neighborhood: NeighborhoodFunction,
    evaluator: &Evaluator,
    rng: &mut R,
) -> Result<bool, OptimizerError> {
    let current = solution.fitness(evaluator)?;
    let Some(best) = best_neighbor(solution, neighborhood, evaluator, rng)? else {
        return Ok(false);
    };

    if best.cached_fitness().is_some_and(|fitness| fitness <= current) {
        *solution = best;
        return Ok(true);
    }

    Ok(false)
}

impl FromStr for NeighborhoodFunction {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" => Ok(NeighborhoodFunction::Forward),
            "hamming" => Ok(NeighborhoodFunction::Hamming),
            "lazy" => Ok(NeighborhoodFunction::default()),
            _ => Err(ParamsError::UnknownName {
                kind: "neighborhood function",
                value: s.to_owned(),
            }),
        }
    }
}

impl Display for NeighborhoodFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeighborhoodFunction::Forward => write!(f, "forward"),
            NeighborhoodFunction::Hamming => write!(f, "hamming"),
            NeighborhoodFunction::Lazy { size } => write!(f, "lazy({size})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::test_utils;

    use super::*;

    fn root() -> Solution {
        Solution::new(test_utils::create_allocation(&[0, 1, 2], &[0, 2]))
    }

    #[test]
    fn test_neighborhood_sizes() {
        let mut rng = SmallRng::seed_from_u64(3);
        let root = root();

        let forward = NeighborhoodFunction::Forward
            .neighbors(&root, 3, &mut rng)
            .unwrap();
        assert_eq!(forward.len(), 5);

        let hamming = NeighborhoodFunction::Hamming
            .neighbors(&root, 3, &mut rng)
            .unwrap();
        assert_eq!(hamming.len(), 5 * 2);

        let lazy = NeighborhoodFunction::Lazy { size: 7 }
            .neighbors(&root, 3, &mut rng)
            .unwrap();
        assert_eq!(lazy.len(), 7);
    }

    #[test]
    fn test_neighbors_differ_in_one_position() {
        let mut rng = SmallRng::seed_from_u64(3);
        let root = root();

        let neighbors = NeighborhoodFunction::Hamming
            .neighbors(&root, 3, &mut rng)
            .unwrap();
        for neighbor in &neighbors {
            let changed = root
                .allocation()
                .loci()
                .filter(|&(shift, index)| {
                    root.allocation().get(shift, index) != neighbor.allocation().get(shift, index)
                })
                .count();
            assert_eq!(changed, 1);
        }
    }

    #[test]
    fn test_greedy_step_never_worsens() {
        let evaluator = test_utils::create_test_evaluator();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut solution = Solution::new(test_utils::create_allocation(&[2, 2, 2], &[2, 2]));

        let mut previous = solution.fitness(&evaluator).unwrap();
        for _ in 0..3 {
            greedy_step(&mut solution, NeighborhoodFunction::Forward, &evaluator, &mut rng).unwrap();
            let fitness = solution.fitness(&evaluator).unwrap();
            assert!(fitness <= previous);
            previous = fitness;
        }
    }

    #[test]
    fn test_parse_neighborhood() {
        assert_eq!(
            NeighborhoodFunction::parse_with_size("lazy", 12),
            Ok(NeighborhoodFunction::Lazy { size: 12 })
        );
        assert_eq!(
            NeighborhoodFunction::parse_with_size("Hamming", 12),
            Ok(NeighborhoodFunction::Hamming)
        );
        assert!("tabu".parse::<NeighborhoodFunction>().is_err());
    }
}
