use std::{fs::File, io::BufReader, io::Read, path::Path};

use tracing::{info, instrument};

use crate::{
    error::RegionError,
    problem::{
        base_station::BaseStationIdx,
        incident::Incident,
        location::{Location, LocationIdx},
        service_region::{ServiceRegion, ServiceRegionBuilder},
        travel_matrices::TravelMatrices,
    },
};

use super::types::{JsonIncident, JsonServiceRegion};

/// Speed of the euclidean travel time fallback, about 60 km/h.
pub const DEFAULT_SPEED: f64 = 16.7;

impl JsonServiceRegion {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RegionError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RegionError> {
        let file = File::open(path)?;
        JsonServiceRegion::from_reader(BufReader::new(file))
    }

    #[instrument(skip_all, level = "debug")]
    pub fn build_region(self) -> Result<ServiceRegion, RegionError> {
        let locations = self.locations.iter().map(Location::from).collect::<Vec<_>>();

        let mut routing = match self.travel_times {
            Some(times) => TravelMatrices::new(locations.len(), times)?,
            None => TravelMatrices::from_euclidean(&locations, self.speed.unwrap_or(DEFAULT_SPEED)),
        };

        for path in self.paths {
            routing.set_path(
                LocationIdx::new(path.from),
                LocationIdx::new(path.to),
                path.path.into_iter().map(LocationIdx::new).collect(),
            )?;
        }

        let incidents = self
            .incidents
            .into_iter()
            .enumerate()
            .map(|(index, incident)| validate_incident(index, incident))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            locations = locations.len(),
            base_stations = self.base_stations.len(),
            hospitals = self.hospitals.len(),
            incidents = incidents.len(),
            "Building service region"
        );

        let mut builder = ServiceRegionBuilder::default();
        builder
            .set_locations(locations)
            .set_base_stations(self.base_stations.into_iter().map(Into::into).collect())
            .set_hospitals(self.hospitals.into_iter().map(Into::into).collect())
            .set_incidents(incidents)
            .set_routing(Box::new(routing));

        if let Some(city_center) = self.city_center {
            builder.set_city_center(BaseStationIdx::new(city_center));
        }

        builder.build()
    }
}

/// Timestamps of an incident must follow the order in which dispatch records them.
fn validate_incident(index: usize, incident: JsonIncident) -> Result<Incident, RegionError> {
    let incident = Incident::from(incident);
    let invalid = |reason: &str| {
        RegionError::InvalidIncident(format!(
            "incident {index} called at {}: {reason}",
            incident.call_received
        ))
    };

    if incident.dispatched < incident.call_received {
        return Err(invalid("dispatched before the call was received"));
    }

    if let Some(arrival) = incident.arrival_at_scene
        && arrival < incident.dispatched
    {
        return Err(invalid("arrived at the scene before being dispatched"));
    }

    if let Some(departure) = incident.departure_from_scene {
        if incident
            .arrival_at_scene
            .is_some_and(|arrival| departure < arrival)
        {
            return Err(invalid("left the scene before arriving"));
        }
        if incident.available_transport < departure {
            return Err(invalid("transport available before leaving the scene"));
        }
    }

    if incident.available_non_transport < incident.call_received {
        return Err(invalid("available before the call was received"));
    }

    Ok(incident)
}
