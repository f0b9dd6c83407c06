use parking_lot::Mutex;

use crate::solver::solution::Solution;

use super::population::Population;

/// Next generation under construction, shared by the offspring tasks.
pub struct NextGeneration {
    capacity: usize,
    individuals: Mutex<Vec<Solution>>,
}

impl NextGeneration {
    /// Starts from the elite, kept with their cached fitness.
    pub fn new(capacity: usize, elite: Vec<Solution>) -> Self {
        let mut individuals = Vec::with_capacity(capacity);
        individuals.extend(elite.into_iter().take(capacity));

        Self {
            capacity,
            individuals: Mutex::new(individuals),
        }
    }

    /// Inserts both offspring while there is room. Returns how many were inserted.
    pub fn insert_pair(&self, first: Solution, second: Solution) -> usize {
        let mut individuals = self.individuals.lock();
        let mut inserted = 0;

        for offspring in [first, second] {
            if individuals.len() < self.capacity {
                individuals.push(offspring);
                inserted += 1;
            }
        }

        inserted
    }

    pub fn len(&self) -> usize {
        self.individuals.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn into_population(self) -> Population {
        Population::new(self.individuals.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use rayon::iter::{IntoParallelIterator, ParallelIterator};

    use crate::test_utils;

    use super::*;

    fn solution(station: usize) -> Solution {
        Solution::new(test_utils::create_allocation(&[station], &[station]))
    }

    #[test]
    fn test_insert_stops_at_capacity() {
        let mut elite = solution(0);
        elite.set_fitness(100.0);
        let next = NextGeneration::new(4, vec![elite]);

        assert_eq!(next.insert_pair(solution(1), solution(2)), 2);
        assert_eq!(next.insert_pair(solution(1), solution(2)), 1);
        assert_eq!(next.insert_pair(solution(1), solution(2)), 0);
        assert!(next.is_full());

        let population = next.into_population();
        assert_eq!(population.len(), 4);
        assert_eq!(population.individuals()[0].cached_fitness(), Some(100.0));
    }

    #[test]
    fn test_concurrent_inserts_never_overflow() {
        let next = NextGeneration::new(25, vec![]);

        let inserted: usize = (0..20)
            .into_par_iter()
            .map(|index| next.insert_pair(solution(index % 3), solution((index + 1) % 3)))
            .sum();

        assert_eq!(inserted, 25);
        assert_eq!(next.len(), 25);
    }
}
