use crate::error::OptimizerError;

use super::{solution::Solution, statistics::RunStatistics};

/// Snapshot reported to progress handlers after every iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub iteration: usize,
    pub best_fitness: f64,
}

pub type ProgressHandler = Box<dyn FnMut(Progress) + Send + 'static>;

pub trait Optimizer {
    fn optimize(&mut self) -> Result<(), OptimizerError>;

    /// Best solution of the last run, `None` before the first run.
    fn optimal_solution(&self) -> Option<&Solution>;

    fn run_statistics(&self) -> RunStatistics;

    fn abbreviation(&self) -> String;

    fn on_progress(&mut self, handler: ProgressHandler);
}
