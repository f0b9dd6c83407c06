use rand::{Rng, seq::IndexedRandom};

use crate::{
    error::EvaluationError,
    problem::shift::ShiftType,
    solver::{
        evaluator::Evaluator,
        initializer::Initializer,
        solution::{Solution, evaluate_all},
    },
};

/// Fixed size set of candidate solutions of one generation.
#[derive(Debug, Clone, Default)]
pub struct Population {
    individuals: Vec<Solution>,
}

impl Population {
    pub fn new(individuals: Vec<Solution>) -> Self {
        Self { individuals }
    }

    /// `seeding_size` population proportionate individuals, the rest from `initializer`.
    pub fn initialize<R: Rng>(
        size: usize,
        seeding_size: usize,
        initializer: Initializer,
        evaluator: &Evaluator,
        rng: &mut R,
    ) -> Self {
        let region = evaluator.region();
        let config = evaluator.config();

        let individuals = (0..size)
            .map(|index| {
                let initializer = if index < seeding_size {
                    Initializer::PopulationProportionate
                } else {
                    initializer
                };
                Solution::new(initializer.initialize(region, config, rng))
            })
            .collect();

        Self { individuals }
    }

    pub fn individuals(&self) -> &[Solution] {
        &self.individuals
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Evaluates every individual in parallel, then sorts them best first.
    pub fn evaluate(&mut self, evaluator: &Evaluator) -> Result<(), EvaluationError> {
        evaluate_all(&mut self.individuals, evaluator)?;
        self.individuals.sort_by(Solution::compare_fitness);
        Ok(())
    }

    pub fn best(&self) -> Option<&Solution> {
        self.individuals.iter().min_by(|a, b| a.compare_fitness(b))
    }

    pub fn best_fitness(&self) -> f64 {
        self.best()
            .and_then(Solution::cached_fitness)
            .unwrap_or(f64::INFINITY)
    }

    pub fn average_fitness(&self) -> f64 {
        let fitnesses = self
            .individuals
            .iter()
            .filter_map(Solution::cached_fitness)
            .collect::<Vec<_>>();

        if fitnesses.is_empty() {
            return f64::INFINITY;
        }
        fitnesses.iter().sum::<f64>() / fitnesses.len() as f64
    }

    /// The `size` fittest individuals with their cached fitness.
    pub fn elite(&self, size: usize) -> Vec<Solution> {
        let mut sorted = self.individuals.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| a.compare_fitness(b));
        sorted.into_iter().take(size).cloned().collect()
    }

    /// Best two of `size` distinct random individuals, `None` for an empty population.
    pub fn tournament<R: Rng>(&self, size: usize, rng: &mut R) -> Option<(Solution, Solution)> {
        let mut contestants = self
            .individuals
            .choose_multiple(rng, size.max(2))
            .collect::<Vec<_>>();
        contestants.sort_by(|a, b| a.compare_fitness(b));

        let first = *contestants.first()?;
        let second = contestants.get(1).copied().unwrap_or(first);
        Some((first.clone(), second.clone()))
    }

    /// Normalized entropy of the station counts, averaged over both shifts. Within `[0, 1]`.
    pub fn diversity(&self, num_base_stations: usize) -> f64 {
        if num_base_stations < 2 {
            return 0.0;
        }

        let max_entropy = (num_base_stations as f64).ln();
        let total: f64 = ShiftType::ALL
            .into_iter()
            .map(|shift| {
                let mut counts = vec![0usize; num_base_stations];
                for individual in &self.individuals {
                    for station in individual.allocation().shift(shift) {
                        if let Some(count) = counts.get_mut(station.get()) {
                            *count += 1;
                        }
                    }
                }

                let total = counts.iter().sum::<usize>() as f64;
                if total == 0.0 {
                    return 0.0;
                }

                let entropy: f64 = counts
                    .iter()
                    .filter(|&&count| count > 0)
                    .map(|&count| {
                        let p = count as f64 / total;
                        -p * p.ln()
                    })
                    .sum();
                entropy / max_entropy
            })
            .sum();

        total / ShiftType::ALL.len() as f64
    }
}

impl IntoIterator for Population {
    type Item = Solution;
    type IntoIter = std::vec::IntoIter<Solution>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use crate::test_utils;

    use super::*;

    fn evaluated(day: &[usize], night: &[usize], fitness: f64) -> Solution {
        let mut solution = Solution::new(test_utils::create_allocation(day, night));
        solution.set_fitness(fitness);
        solution
    }

    #[test]
    fn test_elite_and_statistics() {
        let population = Population::new(vec![
            evaluated(&[0, 0], &[0], 500.0),
            evaluated(&[1, 1], &[1], 300.0),
            evaluated(&[2, 2], &[2], 400.0),
        ]);

        let elite = population.elite(2);
        assert_eq!(elite[0].cached_fitness(), Some(300.0));
        assert_eq!(elite[1].cached_fitness(), Some(400.0));
        assert_eq!(population.best_fitness(), 300.0);
        assert_eq!(population.average_fitness(), 400.0);
    }

    #[test]
    fn test_tournament_picks_best_of_distinct_sample() {
        let population = Population::new(vec![
            evaluated(&[0, 0], &[0], 500.0),
            evaluated(&[1, 1], &[1], 300.0),
            evaluated(&[2, 2], &[2], 400.0),
        ]);
        let mut rng = SmallRng::seed_from_u64(11);

        let (first, second) = population.tournament(3, &mut rng).unwrap();
        assert_eq!(first.cached_fitness(), Some(300.0));
        assert_eq!(second.cached_fitness(), Some(400.0));
    }

    #[test]
    fn test_diversity_bounds() {
        let uniform = Population::new(vec![
            evaluated(&[0, 0], &[0], 1.0),
            evaluated(&[0, 0], &[0], 1.0),
        ]);
        assert_eq!(uniform.diversity(3), 0.0);

        let spread = Population::new(vec![
            evaluated(&[0, 1, 2], &[0, 1, 2], 1.0),
            evaluated(&[2, 1, 0], &[1, 2, 0], 1.0),
        ]);
        assert!((spread.diversity(3) - 1.0).abs() < 1e-9);

        let mixed = Population::new(vec![
            evaluated(&[0, 1], &[0], 1.0),
            evaluated(&[0, 0], &[2], 1.0),
        ]);
        let diversity = mixed.diversity(3);
        assert!(diversity > 0.0 && diversity < 1.0);
    }
}
