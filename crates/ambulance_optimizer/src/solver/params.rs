use jiff::{SignedDuration, Timestamp};
use tracing::debug;

use crate::error::{OptimizerError, ParamsError};

/// Budget of a run, the first condition met stops the search.
#[derive(Clone, Debug, PartialEq)]
pub enum Termination {
    Duration(SignedDuration),
    Iterations(usize),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Threads {
    Single,
    #[default]
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => *num,
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }

    pub(crate) fn build_pool(&self) -> Result<rayon::ThreadPool, OptimizerError> {
        Ok(rayon::ThreadPoolBuilder::new()
            .num_threads(self.number_of_threads())
            .build()?)
    }
}

pub const DEFAULT_SEED: u64 = 10062022;

pub fn default_terminations(iterations: usize) -> Vec<Termination> {
    vec![
        Termination::Iterations(iterations),
        Termination::Duration(SignedDuration::from_mins(240)),
    ]
}

pub(crate) fn validate_terminations(terminations: &[Termination]) -> Result<(), ParamsError> {
    if terminations.is_empty() {
        return Err(ParamsError::OutOfRange {
            name: "terminations",
            reason: String::from("at least one termination condition is required"),
        });
    }

    if let Some(Termination::Duration(duration)) = terminations
        .iter()
        .find(|termination| matches!(termination, Termination::Duration(d) if !d.is_positive()))
    {
        return Err(ParamsError::OutOfRange {
            name: "terminations",
            reason: format!("duration {duration:?} is not positive"),
        });
    }

    Ok(())
}

fn check_termination(termination: &Termination, start: Timestamp, iteration: usize) -> bool {
    match *termination {
        Termination::Iterations(max_iterations) => iteration >= max_iterations,
        Termination::Duration(max_duration) => Timestamp::now().duration_since(start) > max_duration,
    }
}

pub(crate) fn should_terminate(
    terminations: &[Termination],
    start: Timestamp,
    iteration: usize,
) -> bool {
    terminations.iter().any(|termination| {
        if check_termination(termination, start, iteration) {
            debug!("Termination condition met: {:?} at iteration {}", termination, iteration);
            true
        } else {
            false
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_terminate() {
        let start = Timestamp::now();
        let terminations = default_terminations(10);

        assert!(!should_terminate(&terminations, start, 9));
        assert!(should_terminate(&terminations, start, 10));

        let elapsed = start - SignedDuration::from_mins(241);
        assert!(should_terminate(&terminations, elapsed, 0));
    }

    #[test]
    fn test_validate_terminations() {
        assert!(validate_terminations(&default_terminations(1)).is_ok());
        assert!(validate_terminations(&[]).is_err());
        assert!(
            validate_terminations(&[Termination::Duration(SignedDuration::ZERO)]).is_err()
        );
    }
}
