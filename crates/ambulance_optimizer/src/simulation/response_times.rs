use jiff::{SignedDuration, civil::DateTime};
use serde::Serialize;

use crate::problem::location::LocationIdx;

/// Response times collected during one simulation run, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseTimes {
    timestamps: Vec<DateTime>,
    locations: Vec<LocationIdx>,
    response_times: Vec<i64>,
}

impl ResponseTimes {
    pub fn add(&mut self, timestamp: DateTime, location: LocationIdx, response_time: SignedDuration) {
        self.timestamps.push(timestamp);
        self.locations.push(location);
        self.response_times.push(response_time.as_secs());
    }

    pub fn len(&self) -> usize {
        self.response_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.response_times.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime] {
        &self.timestamps
    }

    pub fn locations(&self) -> &[LocationIdx] {
        &self.locations
    }

    pub fn response_times(&self) -> &[i64] {
        &self.response_times
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime, LocationIdx, i64)> + '_ {
        self.timestamps
            .iter()
            .zip(&self.locations)
            .zip(&self.response_times)
            .map(|((&timestamp, &location), &response_time)| {
                (timestamp, location, response_time)
            })
    }

    pub fn average(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }

        let total: i64 = self.response_times.iter().sum();
        Some(total as f64 / self.len() as f64)
    }

    pub fn median(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }

        let mut sorted = self.response_times.clone();
        sorted.sort_unstable();

        let middle = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[middle - 1] + sorted[middle]) as f64 / 2.0)
        } else {
            Some(sorted[middle] as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn test_statistics() {
        let mut response_times = ResponseTimes::default();
        assert_eq!(response_times.average(), None);
        assert_eq!(response_times.median(), None);

        let time = date(2018, 1, 8).at(12, 0, 0, 0);
        for seconds in [600, 300, 1200, 500] {
            response_times.add(time, LocationIdx::new(0), SignedDuration::from_secs(seconds));
        }

        assert_eq!(response_times.len(), 4);
        assert_eq!(response_times.average(), Some(650.0));
        assert_eq!(response_times.median(), Some(550.0));
        assert_eq!(response_times.iter().nth(2).map(|(_, _, r)| r), Some(1200));
    }
}
