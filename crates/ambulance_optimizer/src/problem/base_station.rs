use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

use super::location::LocationIdx;

define_index_newtype!(BaseStationIdx, BaseStation);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseStation {
    name: String,
    location: LocationIdx,
    population: u32,
}

impl BaseStation {
    pub fn new(name: impl Into<String>, location: LocationIdx, population: u32) -> Self {
        Self {
            name: name.into(),
            location,
            population,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> LocationIdx {
        self.location
    }

    /// Population covered by the station, weights the fair allocation.
    pub fn population(&self) -> u32 {
        self.population
    }
}
