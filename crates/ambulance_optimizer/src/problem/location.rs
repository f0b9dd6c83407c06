use geo::{Distance, Euclidean};
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

define_index_newtype!(LocationIdx, Location);

/// A cell of the projected grid, coordinates are easting/northing in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    point: geo::Point,
}

impl Location {
    pub fn from_cartesian(x: f64, y: f64) -> Self {
        Self {
            point: geo::Point::new(x, y),
        }
    }

    pub fn x(&self) -> f64 {
        self.point.x()
    }

    pub fn y(&self) -> f64 {
        self.point.y()
    }

    pub fn euclidean_distance(&self, to: &Location) -> f64 {
        Euclidean.distance(&self.point, &to.point)
    }

    pub fn manhattan_distance(&self, to: &Location) -> f64 {
        (self.x() - to.x()).abs() + (self.y() - to.y()).abs()
    }
}

impl From<&Location> for geo::Point<f64> {
    fn from(location: &Location) -> Self {
        location.point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distances() {
        let from = Location::from_cartesian(0.0, 0.0);
        let to = Location::from_cartesian(3000.0, 4000.0);

        assert_eq!(from.euclidean_distance(&to), 5000.0);
        assert_eq!(from.manhattan_distance(&to), 7000.0);
        assert_eq!(to.manhattan_distance(&from), 7000.0);
    }
}
