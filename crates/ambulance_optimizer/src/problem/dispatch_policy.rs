use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;

use super::{location::LocationIdx, service_region::ServiceRegion};

/// Ranking used to pick the nearest available ambulances for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchPolicy {
    Euclidean,
    Manhattan,
    #[default]
    Fastest,
}

impl DispatchPolicy {
    /// Lower is nearer. Unreachable pairs rank last with `f64::INFINITY`.
    pub fn metric(&self, region: &ServiceRegion, from: LocationIdx, to: LocationIdx) -> f64 {
        match self {
            DispatchPolicy::Euclidean => region
                .location(from)
                .euclidean_distance(region.location(to)),
            DispatchPolicy::Manhattan => region
                .location(from)
                .manhattan_distance(region.location(to)),
            DispatchPolicy::Fastest => region
                .routing()
                .travel_time(from, to)
                .map_or(f64::INFINITY, |time| time.as_secs_f64()),
        }
    }
}

impl FromStr for DispatchPolicy {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" => Ok(DispatchPolicy::Euclidean),
            "manhattan" => Ok(DispatchPolicy::Manhattan),
            "fastest" => Ok(DispatchPolicy::Fastest),
            _ => Err(ParamsError::UnknownName {
                kind: "dispatch policy",
                value: s.to_owned(),
            }),
        }
    }
}
