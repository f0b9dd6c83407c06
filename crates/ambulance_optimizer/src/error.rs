use jiff::{SignedDuration, civil::DateTime};
use thiserror::Error;

use crate::{
    problem::{
        allocation::Allocation, base_station::BaseStationIdx, incident::IncidentIdx,
        location::LocationIdx, shift::ShiftType,
    },
    simulation::config::SimulationConfig,
};

#[derive(Error, Debug)]
pub enum RegionError {
    #[error("A region needs at least two base stations, got {0}")]
    NotEnoughBaseStations(usize),
    #[error("A region needs at least one hospital")]
    NoHospitals,
    #[error("Location {location} is out of bounds ({num_locations} locations)")]
    LocationOutOfBounds {
        location: LocationIdx,
        num_locations: usize,
    },
    #[error("City center {0} is not a base station")]
    UnknownCityCenter(BaseStationIdx),
    #[error("Travel time matrix has {actual} entries, expected {expected}")]
    MatrixSize { expected: usize, actual: usize },
    #[error("Missing {0}")]
    Missing(&'static str),
    #[error("Invalid incident: {0}")]
    InvalidIncident(String),
    #[error("Failed to read region input")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse region input")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("Base station {station} of the {shift:?} shift does not exist ({num_base_stations} base stations)")]
    UnknownBaseStation {
        shift: ShiftType,
        station: BaseStationIdx,
        num_base_stations: usize,
    },
    #[error("The {shift:?} shift has {actual} ambulances, expected {expected}")]
    WrongLength {
        shift: ShiftType,
        expected: usize,
        actual: usize,
    },
}

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Event at {next} popped after an event at {previous}")]
    EventOutOfOrder { previous: DateTime, next: DateTime },
    #[error("Negative response time {response_time:?} for incident {incident}")]
    NegativeResponseTime {
        incident: IncidentIdx,
        response_time: SignedDuration,
    },
    #[error(transparent)]
    InvalidAllocation(#[from] AllocationError),
}

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Simulation failed for allocation {allocation} with {config:?}")]
    Simulation {
        allocation: Allocation,
        config: Box<SimulationConfig>,
        source: SimulationError,
    },
    #[error("No scored incidents between {start} and {end}")]
    NoScoredIncidents { start: DateTime, end: DateTime },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    #[error("{name} must be within [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },
    #[error("{name} is out of range: {reason}")]
    OutOfRange { name: &'static str, reason: String },
    #[error("Unknown {kind} '{value}'")]
    UnknownName { kind: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum OptimizerError {
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error("Neighbor at {shift:?}[{index}] is identical to its root")]
    DegenerateNeighbor { shift: ShiftType, index: usize },
    #[error("Failed to build the worker thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub(crate) fn check_probability(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ParamsError::Probability { name, value })
    }
}
