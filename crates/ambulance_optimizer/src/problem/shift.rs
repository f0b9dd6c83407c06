use jiff::civil::{self, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftType {
    Day,
    Night,
}

impl ShiftType {
    pub const ALL: [ShiftType; 2] = [ShiftType::Day, ShiftType::Night];

    pub const fn index(self) -> usize {
        match self {
            ShiftType::Day => 0,
            ShiftType::Night => 1,
        }
    }
}

/// Time of day boundaries between the day and night shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShiftSchedule {
    pub day_start: civil::Time,
    pub night_start: civil::Time,
}

impl Default for ShiftSchedule {
    fn default() -> Self {
        Self {
            day_start: civil::time(8, 0, 0, 0),
            night_start: civil::time(20, 0, 0, 0),
        }
    }
}

impl ShiftSchedule {
    /// The boundaries themselves belong to the day shift.
    pub fn shift_at(&self, at: DateTime) -> ShiftType {
        let time = at.time();
        if time > self.night_start || time < self.day_start {
            ShiftType::Night
        } else {
            ShiftType::Day
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn test_shift_boundaries() {
        let schedule = ShiftSchedule::default();
        let day = date(2018, 1, 8);

        assert_eq!(schedule.shift_at(day.at(7, 59, 59, 0)), ShiftType::Night);
        assert_eq!(schedule.shift_at(day.at(8, 0, 0, 0)), ShiftType::Day);
        assert_eq!(schedule.shift_at(day.at(13, 30, 0, 0)), ShiftType::Day);
        assert_eq!(schedule.shift_at(day.at(20, 0, 0, 0)), ShiftType::Day);
        assert_eq!(schedule.shift_at(day.at(20, 0, 1, 0)), ShiftType::Night);
        assert_eq!(schedule.shift_at(day.at(0, 0, 0, 0)), ShiftType::Night);
    }
}
