use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};

use crate::{
    error::EvaluationError,
    problem::{allocation::Allocation, base_station::BaseStationIdx, shift::ShiftType},
};

use super::evaluator::Evaluator;

/// An allocation with its lazily simulated fitness.
#[derive(Debug, Clone)]
pub struct Solution {
    allocation: Allocation,
    fitness: Option<f64>,
}

impl Solution {
    pub fn new(allocation: Allocation) -> Self {
        Self {
            allocation,
            fitness: None,
        }
    }

    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    pub fn into_allocation(self) -> Allocation {
        self.allocation
    }

    /// Mean response time in seconds, simulated only if the allocation changed.
    pub fn fitness(&mut self, evaluator: &Evaluator) -> Result<f64, EvaluationError> {
        if let Some(fitness) = self.fitness {
            return Ok(fitness);
        }

        let fitness = evaluator.evaluate(&self.allocation)?;
        self.fitness = Some(fitness);
        Ok(fitness)
    }

    pub fn cached_fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Overrides the cached fitness without touching the allocation.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    pub fn set_allocation(&mut self, allocation: Allocation) {
        if !self.allocation.same_stations(&allocation) {
            self.fitness = None;
        }
        self.allocation = allocation;
    }

    pub fn set(&mut self, shift: ShiftType, index: usize, station: BaseStationIdx) {
        if self.allocation.set(shift, index, station) {
            self.fitness = None;
        }
    }

    pub fn set_shift(&mut self, shift: ShiftType, stations: Vec<BaseStationIdx>) {
        let previous = self.allocation.sorted(shift);
        if self.allocation.replace_shift(shift, stations)
            && self.allocation.sorted(shift) != previous
        {
            self.fitness = None;
        }
    }

    /// Lower fitness first, unevaluated solutions last.
    pub fn compare_fitness(&self, other: &Solution) -> Ordering {
        let fitness = self.fitness.unwrap_or(f64::INFINITY);
        fitness.total_cmp(&other.fitness.unwrap_or(f64::INFINITY))
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.allocation.same_stations(&other.allocation)
    }
}

impl Eq for Solution {}

impl Hash for Solution {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for shift in ShiftType::ALL {
            self.allocation.sorted(shift).hash(state);
        }
    }
}

/// Evaluates every solution on the current rayon pool.
pub fn evaluate_all(solutions: &mut [Solution], evaluator: &Evaluator) -> Result<(), EvaluationError> {
    solutions
        .par_iter_mut()
        .try_for_each(|solution| solution.fitness(evaluator).map(|_| ()))
}

#[cfg(test)]
mod tests {
    use fxhash::FxHashSet;

    use crate::test_utils;

    use super::*;

    #[test]
    fn test_fitness_is_cached_until_stations_change() {
        let evaluator = test_utils::create_test_evaluator();
        let mut solution = Solution::new(test_utils::create_allocation(&[0, 1, 2], &[0, 2]));

        let fitness = solution.fitness(&evaluator).unwrap();
        assert_eq!(solution.cached_fitness(), Some(fitness));

        // Same multiset of stations keeps the cache
        solution.set_shift(ShiftType::Day, vec![2, 1, 0].into_iter().map(BaseStationIdx::new).collect());
        assert_eq!(solution.cached_fitness(), Some(fitness));

        solution.set(ShiftType::Night, 0, BaseStationIdx::new(2));
        assert_eq!(solution.cached_fitness(), None);
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = Solution::new(test_utils::create_allocation(&[0, 1, 2], &[0, 2]));
        let b = Solution::new(test_utils::create_allocation(&[2, 0, 1], &[2, 0]));
        let c = Solution::new(test_utils::create_allocation(&[2, 2, 1], &[2, 0]));

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set = [a, b, c].into_iter().collect::<FxHashSet<_>>();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_unevaluated_sort_last() {
        let mut evaluated = Solution::new(test_utils::create_allocation(&[0], &[0]));
        evaluated.set_fitness(600.0);
        let unevaluated = Solution::new(test_utils::create_allocation(&[1], &[1]));

        let mut solutions = vec![unevaluated, evaluated];
        solutions.sort_by(Solution::compare_fitness);

        assert_eq!(solutions[0].cached_fitness(), Some(600.0));
        assert!(!solutions[1].is_evaluated());
    }
}
