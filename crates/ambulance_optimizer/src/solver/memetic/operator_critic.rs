use std::fmt::{Debug, Display};

use rand::{Rng, seq::IndexedRandom};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct OperatorCredit<S> {
    operator: S,
    total_improvement: f64,
    trials: usize,
}

impl<S> OperatorCredit<S> {
    fn mean_improvement(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.total_improvement / self.trials as f64
        }
    }
}

/// Picks operators proportionally to the mean fitness improvement they produced.
#[derive(Debug, Clone, Serialize)]
pub struct OperatorCritic<S> {
    credits: Vec<OperatorCredit<S>>,
    enabled: bool,
}

impl<S> OperatorCritic<S>
where
    S: Copy + Debug,
{
    /// Every operator starts with one trial of a small random credit.
    pub fn new<R: Rng>(operators: Vec<S>, rng: &mut R) -> Self {
        let credits = operators
            .into_iter()
            .map(|operator| OperatorCredit {
                operator,
                total_improvement: rng.random::<f64>() / 100.0,
                trials: 1,
            })
            .collect();

        Self {
            credits,
            enabled: true,
        }
    }

    /// A critic that always selects uniformly at random.
    pub fn uniform(operators: Vec<S>) -> Self {
        let credits = operators
            .into_iter()
            .map(|operator| OperatorCredit {
                operator,
                total_improvement: 0.0,
                trials: 0,
            })
            .collect();

        Self {
            credits,
            enabled: false,
        }
    }

    pub fn len(&self) -> usize {
        self.credits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credits.is_empty()
    }

    pub fn operator(&self, index: usize) -> S {
        self.credits[index].operator
    }

    pub fn trials(&self, index: usize) -> usize {
        self.credits[index].trials
    }

    pub fn mean_improvement(&self, index: usize) -> f64 {
        self.credits[index].mean_improvement()
    }

    /// Roulette wheel over the positive mean improvements, uniform when none is positive.
    pub fn select_next<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        if self.credits.is_empty() {
            return None;
        }

        let indices = (0..self.credits.len()).collect::<Vec<_>>();
        if self.enabled
            && let Ok(&index) = indices.choose_weighted(rng, |&index| {
                self.credits[index].mean_improvement().max(0.0)
            })
        {
            return Some(index);
        }

        indices.choose(rng).copied()
    }

    /// `improvement` is the parent fitness minus the child fitness, negative when worse.
    pub fn assign_credit(&mut self, index: usize, improvement: f64) {
        if let Some(credit) = self.credits.get_mut(index) {
            credit.total_improvement += improvement;
            credit.trials += 1;
        }
    }
}

impl<S> Display for OperatorCritic<S>
where
    S: Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{:<40} {:>8} {:>16}", "Operator", "Trials", "Improvement")?;
        writeln!(f, "{:-<66}", "")?;
        for credit in &self.credits {
            writeln!(
                f,
                "{:<40} {:>8} {:>16.4}",
                credit.operator.to_string(),
                credit.trials,
                credit.mean_improvement()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};

    use super::*;

    #[test]
    fn test_initial_credit_is_small_and_positive() {
        let mut rng = SmallRng::seed_from_u64(1);
        let critic = OperatorCritic::new(vec!['a', 'b', 'c'], &mut rng);

        for index in 0..critic.len() {
            assert_eq!(critic.trials(index), 1);
            let credit = critic.mean_improvement(index);
            assert!((0.0..0.01).contains(&credit));
        }
    }

    #[test]
    fn test_converges_on_improving_operator() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut critic = OperatorCritic::new(vec!['a', 'b', 'c'], &mut rng);

        let mut selected_a = 0;
        for round in 0..300 {
            let Some(index) = critic.select_next(&mut rng) else {
                panic!("critic has operators");
            };
            let improvement = match critic.operator(index) {
                'a' => 12.0,
                'b' => -4.0,
                _ => 0.5,
            };
            critic.assign_credit(index, improvement);

            if round >= 200 && index == 0 {
                selected_a += 1;
            }
        }

        assert!(critic.mean_improvement(0) > critic.mean_improvement(2));
        assert!(critic.mean_improvement(1) < 0.0);
        assert!(selected_a > 80, "selected a {selected_a} times out of 100");
    }

    #[test]
    fn test_falls_back_to_uniform() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut critic = OperatorCritic::new(vec!['a', 'b'], &mut rng);
        critic.assign_credit(0, -10.0);
        critic.assign_credit(1, -10.0);

        let mut seen = [false; 2];
        for _ in 0..50 {
            seen[critic.select_next(&mut rng).unwrap()] = true;
        }
        assert_eq!(seen, [true, true]);

        let uniform = OperatorCritic::uniform(vec!['a', 'b']);
        assert!(uniform.select_next(&mut rng).is_some());
    }

    #[test]
    fn test_display_lists_operators() {
        let mut rng = SmallRng::seed_from_u64(3);
        let critic = OperatorCritic::new(vec!['x', 'y'], &mut rng);
        let table = critic.to_string();

        assert!(table.contains("Operator"));
        assert_eq!(table.lines().count(), 5);
    }
}
