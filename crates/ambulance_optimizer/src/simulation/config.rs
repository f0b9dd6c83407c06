use jiff::{
    SignedDuration,
    civil::{DateTime, date},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ParamsError,
    problem::{
        dispatch_policy::DispatchPolicy,
        shift::{ShiftSchedule, ShiftType},
    },
};

/// Parameters of one simulation run. Runs sharing a config share their call list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// First call contributing to the response times.
    pub start: DateTime,
    /// Calls from this time on are not simulated.
    pub end: DateTime,
    pub num_ambulances_day: usize,
    pub num_ambulances_night: usize,
    pub dispatch_policy: DispatchPolicy,
    /// Warm-up window before `start`, its calls occupy ambulances but are not scored.
    pub buffer: SignedDuration,
    pub location_update_period: SignedDuration,
    pub shifts: ShiftSchedule,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start: date(2018, 1, 8).at(0, 0, 0, 0),
            end: date(2018, 1, 15).at(0, 0, 0, 0),
            num_ambulances_day: 39,
            num_ambulances_night: 22,
            dispatch_policy: DispatchPolicy::Fastest,
            buffer: SignedDuration::from_hours(4),
            location_update_period: SignedDuration::from_mins(5),
            shifts: ShiftSchedule::default(),
        }
    }
}

impl SimulationConfig {
    pub fn num_ambulances(&self, shift: ShiftType) -> usize {
        match shift {
            ShiftType::Day => self.num_ambulances_day,
            ShiftType::Night => self.num_ambulances_night,
        }
    }

    pub fn warm_up_start(&self) -> DateTime {
        self.start - self.buffer
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.start >= self.end {
            return Err(ParamsError::OutOfRange {
                name: "end",
                reason: format!("{} is not after the start {}", self.end, self.start),
            });
        }

        if self.buffer.is_negative() {
            return Err(ParamsError::OutOfRange {
                name: "buffer",
                reason: format!("{:?} is negative", self.buffer),
            });
        }

        if !self.location_update_period.is_positive() {
            return Err(ParamsError::OutOfRange {
                name: "location_update_period",
                reason: format!("{:?} is not positive", self.location_update_period),
            });
        }

        if self.shifts.day_start >= self.shifts.night_start {
            return Err(ParamsError::OutOfRange {
                name: "shifts",
                reason: String::from("the day shift must start before the night shift"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SimulationConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.warm_up_start(), date(2018, 1, 7).at(20, 0, 0, 0));
        assert_eq!(config.num_ambulances(ShiftType::Night), 22);
    }

    #[test]
    fn test_rejects_non_positive_update_period() {
        let config = SimulationConfig {
            location_update_period: SignedDuration::ZERO,
            ..SimulationConfig::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ParamsError::OutOfRange {
                name: "location_update_period",
                ..
            })
        ));
    }
}
