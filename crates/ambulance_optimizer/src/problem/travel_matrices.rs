use fxhash::FxHashMap;
use jiff::SignedDuration;
use tracing::debug;

use crate::error::RegionError;

use super::{
    location::{Location, LocationIdx},
    routing::{Route, RoutingOracle},
};

/// Travel time in seconds.
pub type Time = f64;

/// This matrix use a flat structure to store travel times between locations.
/// To find the index for a pair of locations, use the formula:
/// `index = from * num_locations + to`.
///
/// Negative or non finite entries are pairs without a route.
pub struct TravelMatrices {
    times: Vec<Time>,
    paths: FxHashMap<(LocationIdx, LocationIdx), Vec<LocationIdx>>,
    num_locations: usize,
}

impl TravelMatrices {
    pub fn new(num_locations: usize, times: Vec<Time>) -> Result<Self, RegionError> {
        let expected = num_locations * num_locations;
        if times.len() != expected {
            return Err(RegionError::MatrixSize {
                expected,
                actual: times.len(),
            });
        }

        Ok(TravelMatrices {
            times,
            paths: FxHashMap::default(),
            num_locations,
        })
    }

    /// Travel times from straight line distances at a constant speed.
    pub fn from_euclidean(locations: &[Location], meters_per_second: f64) -> Self {
        let num_locations = locations.len();
        let mut times: Vec<Time> = vec![0.0; num_locations * num_locations];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                times[i * num_locations + j] =
                    (from.euclidean_distance(to) / meters_per_second).round();
            }
        }

        TravelMatrices {
            times,
            paths: FxHashMap::default(),
            num_locations,
        }
    }

    #[cfg(test)]
    pub fn from_constant(num_locations: usize, time: Time) -> Self {
        TravelMatrices {
            times: vec![time; num_locations * num_locations],
            paths: FxHashMap::default(),
            num_locations,
        }
    }

    pub fn set_path(
        &mut self,
        from: LocationIdx,
        to: LocationIdx,
        path: Vec<LocationIdx>,
    ) -> Result<(), RegionError> {
        if let Some(&location) = path.iter().find(|l| l.get() >= self.num_locations) {
            return Err(RegionError::LocationOutOfBounds {
                location,
                num_locations: self.num_locations,
            });
        }

        self.paths.insert((from, to), path);
        Ok(())
    }

    pub fn remove_route(&mut self, from: LocationIdx, to: LocationIdx) {
        let index = self.index(from, to);
        self.times[index] = Time::NAN;
        self.paths.remove(&(from, to));
    }

    #[inline(always)]
    fn index(&self, from: LocationIdx, to: LocationIdx) -> usize {
        from.get() * self.num_locations + to.get()
    }

    pub fn num_locations(&self) -> usize {
        self.num_locations
    }
}

impl RoutingOracle for TravelMatrices {
    fn route(&self, from: LocationIdx, to: LocationIdx) -> Option<Route<'_>> {
        if from == to {
            return Some(Route {
                travel_time: SignedDuration::ZERO,
                path: None,
            });
        }

        let time = self.times.get(self.index(from, to)).copied()?;
        if !time.is_finite() || time < 0.0 {
            debug!(from = %from, to = %to, "No route between locations");
            return None;
        }

        Some(Route {
            travel_time: SignedDuration::from_secs_f64(time),
            path: self.paths.get(&(from, to)).map(Vec::as_slice),
        })
    }
}
