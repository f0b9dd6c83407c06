use std::{cmp::Ordering, fmt::Display, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::{OptimizerError, ParamsError},
    problem::{base_station::BaseStationIdx, shift::ShiftType},
    solver::{
        evaluator::Evaluator,
        sls::neighborhood::{NeighborhoodFunction, best_neighbor},
        solution::{Solution, evaluate_all},
    },
};

/// Local search applied to an offspring, producing an evaluated neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementOperator {
    /// Moves one ambulance from an over-provisioned station to an under-provisioned one.
    RobinHood {
        shift: ShiftType,
        stations: usize,
        first_improvement: bool,
    },
    Sls(NeighborhoodFunction),
}

impl ImprovementOperator {
    /// `None` when the operator has no candidate for this solution.
    pub fn improve<R: Rng>(
        &self,
        solution: &mut Solution,
        evaluator: &Evaluator,
        rng: &mut R,
    ) -> Result<Option<Solution>, OptimizerError> {
        match *self {
            ImprovementOperator::RobinHood {
                shift,
                stations,
                first_improvement,
            } => robin_hood(solution, shift, stations, first_improvement, evaluator),
            ImprovementOperator::Sls(neighborhood) => {
                best_neighbor(solution, neighborhood, evaluator, rng)
            }
        }
    }
}

/// Every robin hood variant, both shifts with both acceptance modes.
pub fn robin_hood_operators(stations: usize) -> Vec<ImprovementOperator> {
    ShiftType::ALL
        .into_iter()
        .flat_map(|shift| {
            [true, false].map(|first_improvement| ImprovementOperator::RobinHood {
                shift,
                stations,
                first_improvement,
            })
        })
        .collect()
}

/// Provisioning of each station relative to its population proportionate share.
fn provisioning_ratios(counts: &[usize], distribution: &[f64], num_ambulances: usize) -> Vec<f64> {
    counts
        .iter()
        .zip(distribution)
        .map(|(&count, &share)| {
            let fair = share * num_ambulances as f64;
            match (count, fair > 0.0) {
                (_, true) => count as f64 / fair,
                (0, false) => 1.0,
                (_, false) => f64::INFINITY,
            }
        })
        .collect()
}

fn robin_hood(
    solution: &mut Solution,
    shift: ShiftType,
    stations: usize,
    first_improvement: bool,
    evaluator: &Evaluator,
) -> Result<Option<Solution>, OptimizerError> {
    let region = evaluator.region();
    let num_base_stations = region.num_base_stations();
    let current = solution.fitness(evaluator)?;

    let allocation = solution.allocation();
    let counts = allocation.station_counts(shift, num_base_stations);
    let ratios = provisioning_ratios(
        &counts,
        region.population_distribution(),
        allocation.len(shift),
    );

    let mut ranked = BaseStationIdx::all(num_base_stations).collect::<Vec<_>>();
    ranked.sort_by(|&a, &b| ratios[a.get()].total_cmp(&ratios[b.get()]));

    let donors = ranked
        .iter()
        .rev()
        .copied()
        .filter(|station| counts[station.get()] > 0)
        .take(stations)
        .collect::<Vec<_>>();
    let recipients = ranked.iter().copied().take(stations).collect::<Vec<_>>();

    let mut candidates = Vec::with_capacity(donors.len() * recipients.len());
    for &donor in &donors {
        let Some(index) = allocation
            .shift(shift)
            .iter()
            .position(|&station| station == donor)
        else {
            continue;
        };

        for &recipient in recipients.iter().filter(|&&recipient| recipient != donor) {
            let mut candidate = solution.clone();
            candidate.set(shift, index, recipient);
            candidates.push(candidate);
        }
    }

    if first_improvement {
        let mut best: Option<Solution> = None;
        for mut candidate in candidates {
            let fitness = candidate.fitness(evaluator)?;
            if fitness <= current {
                return Ok(Some(candidate));
            }

            if best
                .as_ref()
                .is_none_or(|best| candidate.compare_fitness(best) == Ordering::Less)
            {
                best = Some(candidate);
            }
        }
        return Ok(best);
    }

    evaluate_all(&mut candidates, evaluator)?;
    Ok(candidates.into_iter().min_by(Solution::compare_fitness))
}

impl Display for ImprovementOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImprovementOperator::RobinHood {
                shift,
                stations,
                first_improvement,
            } => {
                let mode = if *first_improvement { "first" } else { "best" };
                write!(f, "robin_hood({shift:?}, {stations}, {mode})")
            }
            ImprovementOperator::Sls(neighborhood) => write!(f, "sls({neighborhood})"),
        }
    }
}

/// Which improvement operators the memetic algorithm draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImproveStrategy {
    /// A uniformly random robin hood variant.
    RobinHood,
    Sls,
    /// Adaptive selection among every operator.
    #[default]
    OperatorCritic,
}

impl FromStr for ImproveStrategy {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "robin_hood" => Ok(ImproveStrategy::RobinHood),
            "sls" => Ok(ImproveStrategy::Sls),
            "operator_critic" => Ok(ImproveStrategy::OperatorCritic),
            _ => Err(ParamsError::UnknownName {
                kind: "improve strategy",
                value: s.to_owned(),
            }),
        }
    }
}

impl Display for ImproveStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImproveStrategy::RobinHood => write!(f, "robin_hood"),
            ImproveStrategy::Sls => write!(f, "sls"),
            ImproveStrategy::OperatorCritic => write!(f, "operator_critic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::test_utils;

    use super::*;

    #[test]
    fn test_ratios() {
        let ratios = provisioning_ratios(&[3, 0, 1], &[0.5, 0.5, 0.0], 4);
        assert_eq!(ratios, vec![1.5, 0.0, f64::INFINITY]);

        let ratios = provisioning_ratios(&[0], &[0.0], 4);
        assert_eq!(ratios, vec![1.0]);
    }

    #[test]
    fn test_robin_hood_moves_from_donor_to_recipient() {
        let evaluator = test_utils::create_test_evaluator();
        let mut rng = SmallRng::seed_from_u64(5);

        // Station C holds everything while A covers half of the population
        let mut solution = Solution::new(test_utils::create_allocation(&[2, 2, 2], &[0, 1]));
        let operator = ImprovementOperator::RobinHood {
            shift: ShiftType::Day,
            stations: 1,
            first_improvement: false,
        };

        let neighbor = operator
            .improve(&mut solution, &evaluator, &mut rng)
            .unwrap()
            .unwrap();

        assert!(neighbor.is_evaluated());
        assert_eq!(
            neighbor.allocation().sorted(ShiftType::Day),
            test_utils::create_allocation(&[0, 2, 2], &[]).sorted(ShiftType::Day)
        );
        assert_eq!(
            neighbor.allocation().shift(ShiftType::Night),
            solution.allocation().shift(ShiftType::Night)
        );
    }

    #[test]
    fn test_every_variant_yields_a_neighbor() {
        let evaluator = test_utils::create_test_evaluator();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut solution = Solution::new(test_utils::create_allocation(&[2, 2, 2], &[2, 2]));
        let current = solution.fitness(&evaluator).unwrap();

        for operator in robin_hood_operators(2) {
            let neighbor = operator
                .improve(&mut solution, &evaluator, &mut rng)
                .unwrap()
                .unwrap();

            assert_ne!(neighbor, solution);
            assert!(neighbor.is_evaluated());
        }
        assert_eq!(solution.cached_fitness(), Some(current));
    }

    #[test]
    fn test_sls_operator() {
        let evaluator = test_utils::create_test_evaluator();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut solution = Solution::new(test_utils::create_allocation(&[0, 1, 2], &[0, 2]));

        let neighbor = ImprovementOperator::Sls(NeighborhoodFunction::Forward)
            .improve(&mut solution, &evaluator, &mut rng)
            .unwrap()
            .unwrap();

        assert!(neighbor.is_evaluated());
        assert_ne!(neighbor, solution);
    }

    #[test]
    fn test_names() {
        assert_eq!(robin_hood_operators(3).len(), 4);
        assert_eq!("robin-hood".parse(), Ok(ImproveStrategy::RobinHood));
        assert_eq!(
            ImprovementOperator::Sls(NeighborhoodFunction::Hamming).to_string(),
            "sls(hamming)"
        );
    }
}
