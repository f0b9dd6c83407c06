use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};

use crate::problem::{
    base_station::BaseStation,
    hospital::Hospital,
    incident::Incident,
    location::{Location, LocationIdx},
    urgency_level::UrgencyLevel,
};

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename = "ServiceRegion")]
pub struct JsonServiceRegion {
    pub locations: Vec<JsonLocation>,
    pub base_stations: Vec<JsonBaseStation>,
    pub hospitals: Vec<JsonHospital>,
    #[serde(default)]
    pub incidents: Vec<JsonIncident>,
    /// Base station index, the most populated station when absent.
    pub city_center: Option<usize>,
    /// Row major travel times in seconds, `from * locations + to`.
    pub travel_times: Option<Vec<f64>>,
    #[serde(default)]
    pub paths: Vec<JsonPath>,
    /// Speed in metres per second of the euclidean fallback without travel times.
    pub speed: Option<f64>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename = "Location")]
pub struct JsonLocation {
    pub coordinates: [f64; 2],
}

impl From<&JsonLocation> for Location {
    fn from(value: &JsonLocation) -> Self {
        Location::from_cartesian(value.coordinates[0], value.coordinates[1])
    }
}

impl From<&Location> for JsonLocation {
    fn from(value: &Location) -> Self {
        JsonLocation {
            coordinates: [value.x(), value.y()],
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename = "BaseStation")]
pub struct JsonBaseStation {
    pub name: String,
    pub location_id: usize,
    #[serde(default)]
    pub population: u32,
}

impl From<JsonBaseStation> for BaseStation {
    fn from(value: JsonBaseStation) -> Self {
        BaseStation::new(
            value.name,
            LocationIdx::new(value.location_id),
            value.population,
        )
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename = "Hospital")]
pub struct JsonHospital {
    pub name: String,
    pub location_id: usize,
}

impl From<JsonHospital> for Hospital {
    fn from(value: JsonHospital) -> Self {
        Hospital::new(value.name, LocationIdx::new(value.location_id))
    }
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename = "Incident")]
pub struct JsonIncident {
    pub call_received: DateTime,
    pub location_id: usize,
    pub urgency: UrgencyLevel,
    pub dispatched: DateTime,
    pub arrival_at_scene: Option<DateTime>,
    pub departure_from_scene: Option<DateTime>,
    pub available_non_transport: DateTime,
    pub available_transport: DateTime,
    #[serde(default)]
    pub non_transporting_vehicles: u32,
    #[serde(default)]
    pub transporting_vehicles: u32,
}

impl From<JsonIncident> for Incident {
    fn from(value: JsonIncident) -> Self {
        Incident {
            call_received: value.call_received,
            location: LocationIdx::new(value.location_id),
            urgency: value.urgency,
            dispatched: value.dispatched,
            arrival_at_scene: value.arrival_at_scene,
            departure_from_scene: value.departure_from_scene,
            available_non_transport: value.available_non_transport,
            available_transport: value.available_transport,
            non_transporting_vehicles: value.non_transporting_vehicles,
            transporting_vehicles: value.transporting_vehicles,
        }
    }
}

/// Cells crossed by the route from `from` to `to`.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename = "Path")]
pub struct JsonPath {
    pub from: usize,
    pub to: usize,
    pub path: Vec<usize>,
}
