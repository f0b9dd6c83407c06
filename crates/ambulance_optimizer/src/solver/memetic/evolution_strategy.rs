use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::ParamsError, solver::solution::Solution};

/// How an improved neighbor of an offspring flows back into the population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionStrategy {
    /// Offspring stay as the genetic operators produced them.
    Darwinian,
    /// Offspring keep their allocation but take the neighbor's fitness.
    Baldwinian,
    /// Offspring are replaced by the neighbor.
    #[default]
    Lamarckian,
}

impl EvolutionStrategy {
    pub fn is_darwinian(&self) -> bool {
        matches!(self, EvolutionStrategy::Darwinian)
    }

    /// Applies `neighbor` unless it is worse than `offspring_fitness`. Returns whether it was adopted.
    pub fn adopt(&self, offspring: &mut Solution, offspring_fitness: f64, neighbor: Solution) -> bool {
        let Some(fitness) = neighbor.cached_fitness() else {
            return false;
        };

        if fitness > offspring_fitness {
            return false;
        }

        match self {
            EvolutionStrategy::Darwinian => false,
            EvolutionStrategy::Baldwinian => {
                offspring.set_fitness(fitness);
                true
            }
            EvolutionStrategy::Lamarckian => {
                *offspring = neighbor;
                true
            }
        }
    }
}

impl FromStr for EvolutionStrategy {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "darwinian" => Ok(EvolutionStrategy::Darwinian),
            "baldwinian" => Ok(EvolutionStrategy::Baldwinian),
            "lamarckian" => Ok(EvolutionStrategy::Lamarckian),
            _ => Err(ParamsError::UnknownName {
                kind: "evolution strategy",
                value: s.to_owned(),
            }),
        }
    }
}

impl Display for EvolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvolutionStrategy::Darwinian => write!(f, "darwinian"),
            EvolutionStrategy::Baldwinian => write!(f, "baldwinian"),
            EvolutionStrategy::Lamarckian => write!(f, "lamarckian"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils;

    use super::*;

    fn evaluated(day: &[usize], night: &[usize], fitness: f64) -> Solution {
        let mut solution = Solution::new(test_utils::create_allocation(day, night));
        solution.set_fitness(fitness);
        solution
    }

    #[test]
    fn test_baldwinian_keeps_allocation() {
        let mut offspring = evaluated(&[0, 0, 1], &[0, 1], 500.0);
        let neighbor = evaluated(&[0, 2, 1], &[0, 1], 420.0);

        assert!(EvolutionStrategy::Baldwinian.adopt(&mut offspring, 500.0, neighbor));
        assert_eq!(offspring.cached_fitness(), Some(420.0));
        assert_eq!(
            offspring.allocation(),
            &test_utils::create_allocation(&[0, 0, 1], &[0, 1])
        );
    }

    #[test]
    fn test_lamarckian_replaces_offspring() {
        let mut offspring = evaluated(&[0, 0, 1], &[0, 1], 500.0);
        let neighbor = evaluated(&[0, 2, 1], &[0, 1], 500.0);

        assert!(EvolutionStrategy::Lamarckian.adopt(&mut offspring, 500.0, neighbor.clone()));
        assert_eq!(offspring, neighbor);
    }

    #[test]
    fn test_worse_neighbor_is_rejected() {
        for strategy in [
            EvolutionStrategy::Darwinian,
            EvolutionStrategy::Baldwinian,
            EvolutionStrategy::Lamarckian,
        ] {
            let mut offspring = evaluated(&[0, 0, 1], &[0, 1], 500.0);
            let neighbor = evaluated(&[0, 2, 1], &[0, 1], 501.0);

            assert!(!strategy.adopt(&mut offspring, 500.0, neighbor));
            assert_eq!(offspring.cached_fitness(), Some(500.0));
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("Baldwinian".parse(), Ok(EvolutionStrategy::Baldwinian));
        assert!("lysenkoist".parse::<EvolutionStrategy>().is_err());
    }
}
