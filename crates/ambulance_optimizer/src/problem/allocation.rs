use std::{fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::AllocationError;

use super::{base_station::BaseStationIdx, shift::ShiftType};

/// Base station of every ambulance, per shift.
///
/// Only the multiset of stations in a shift matters to the simulation. Shift
/// arrays are shared between clones and copied on the first write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Allocation {
    day: Arc<Vec<BaseStationIdx>>,
    night: Arc<Vec<BaseStationIdx>>,
}

impl Allocation {
    pub fn new(day: Vec<BaseStationIdx>, night: Vec<BaseStationIdx>) -> Self {
        Self {
            day: Arc::new(day),
            night: Arc::new(night),
        }
    }

    pub fn shift(&self, shift: ShiftType) -> &[BaseStationIdx] {
        match shift {
            ShiftType::Day => &self.day,
            ShiftType::Night => &self.night,
        }
    }

    fn shift_mut(&mut self, shift: ShiftType) -> &mut Vec<BaseStationIdx> {
        match shift {
            ShiftType::Day => Arc::make_mut(&mut self.day),
            ShiftType::Night => Arc::make_mut(&mut self.night),
        }
    }

    pub fn len(&self, shift: ShiftType) -> usize {
        self.shift(shift).len()
    }

    pub fn total_len(&self) -> usize {
        self.day.len() + self.night.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    pub fn get(&self, shift: ShiftType, index: usize) -> BaseStationIdx {
        self.shift(shift)[index]
    }

    /// Every (shift, position) pair, day shift first.
    pub fn loci(&self) -> impl Iterator<Item = (ShiftType, usize)> + '_ {
        ShiftType::ALL
            .into_iter()
            .flat_map(move |shift| (0..self.len(shift)).map(move |index| (shift, index)))
    }

    pub fn sorted(&self, shift: ShiftType) -> Vec<BaseStationIdx> {
        let mut stations = self.shift(shift).to_vec();
        stations.sort_unstable();
        stations
    }

    /// Canonical form used for reporting, both shifts sorted.
    pub fn to_sorted(&self) -> Allocation {
        Allocation::new(self.sorted(ShiftType::Day), self.sorted(ShiftType::Night))
    }

    /// True when both shifts hold the same stations, regardless of order.
    pub fn same_stations(&self, other: &Allocation) -> bool {
        ShiftType::ALL.into_iter().all(|shift| {
            self.len(shift) == other.len(shift) && self.sorted(shift) == other.sorted(shift)
        })
    }

    pub fn station_counts(&self, shift: ShiftType, num_base_stations: usize) -> Vec<usize> {
        let mut counts = vec![0; num_base_stations];
        for station in self.shift(shift) {
            if let Some(count) = counts.get_mut(station.get()) {
                *count += 1;
            }
        }
        counts
    }

    /// Returns whether the entry changed.
    pub fn set(&mut self, shift: ShiftType, index: usize, station: BaseStationIdx) -> bool {
        if self.shift(shift)[index] == station {
            return false;
        }

        self.shift_mut(shift)[index] = station;
        true
    }

    /// Returns whether the shift changed.
    pub fn replace_shift(&mut self, shift: ShiftType, stations: Vec<BaseStationIdx>) -> bool {
        if self.shift(shift) == stations.as_slice() {
            return false;
        }

        match shift {
            ShiftType::Day => self.day = Arc::new(stations),
            ShiftType::Night => self.night = Arc::new(stations),
        }
        true
    }

    pub fn with_shift(&self, shift: ShiftType, stations: Vec<BaseStationIdx>) -> Allocation {
        let mut allocation = self.clone();
        allocation.replace_shift(shift, stations);
        allocation
    }

    pub fn validate(
        &self,
        num_base_stations: usize,
        expected_day: usize,
        expected_night: usize,
    ) -> Result<(), AllocationError> {
        for (shift, expected) in [
            (ShiftType::Day, expected_day),
            (ShiftType::Night, expected_night),
        ] {
            if self.len(shift) != expected {
                return Err(AllocationError::WrongLength {
                    shift,
                    expected,
                    actual: self.len(shift),
                });
            }

            if let Some(&station) = self
                .shift(shift)
                .iter()
                .find(|station| station.get() >= num_base_stations)
            {
                return Err(AllocationError::UnknownBaseStation {
                    shift,
                    station,
                    num_base_stations,
                });
            }
        }

        Ok(())
    }
}

impl Display for Allocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let format_shift = |shift| {
            self.sorted(shift)
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };

        write!(
            f,
            "day [{}], night [{}]",
            format_shift(ShiftType::Day),
            format_shift(ShiftType::Night)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stations(ids: &[usize]) -> Vec<BaseStationIdx> {
        ids.iter().copied().map(BaseStationIdx::new).collect()
    }

    #[test]
    fn test_copy_on_write() {
        let original = Allocation::new(stations(&[0, 1, 2]), stations(&[1]));
        let mut copy = original.clone();

        assert!(copy.set(ShiftType::Day, 0, BaseStationIdx::new(2)));
        assert!(!copy.set(ShiftType::Day, 0, BaseStationIdx::new(2)));

        assert_eq!(original.shift(ShiftType::Day), stations(&[0, 1, 2]).as_slice());
        assert_eq!(copy.shift(ShiftType::Day), stations(&[2, 1, 2]).as_slice());
        assert_eq!(copy.shift(ShiftType::Night), original.shift(ShiftType::Night));
    }

    #[test]
    fn test_sorted_accessors() {
        let allocation = Allocation::new(stations(&[2, 0, 2, 1]), stations(&[1, 0]));

        assert_eq!(allocation.sorted(ShiftType::Day), stations(&[0, 1, 2, 2]));
        assert_eq!(allocation.station_counts(ShiftType::Day, 4), vec![1, 1, 2, 0]);
        assert!(allocation.same_stations(&Allocation::new(
            stations(&[0, 1, 2, 2]),
            stations(&[0, 1])
        )));
        assert_eq!(allocation.to_string(), "day [0, 1, 2, 2], night [0, 1]");
        assert_eq!(allocation.loci().count(), 6);
    }

    #[test]
    fn test_validate() {
        let allocation = Allocation::new(stations(&[0, 1]), stations(&[3]));

        assert!(allocation.validate(4, 2, 1).is_ok());
        assert_eq!(
            allocation.validate(3, 2, 1),
            Err(AllocationError::UnknownBaseStation {
                shift: ShiftType::Night,
                station: BaseStationIdx::new(3),
                num_base_stations: 3,
            })
        );
        assert!(matches!(
            allocation.validate(4, 3, 1),
            Err(AllocationError::WrongLength { expected: 3, .. })
        ));
    }
}
