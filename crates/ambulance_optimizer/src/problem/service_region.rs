use tracing::debug;

use crate::error::RegionError;

use super::{
    base_station::{BaseStation, BaseStationIdx},
    hospital::{Hospital, HospitalIdx},
    incident::{Incident, IncidentIdx},
    location::{Location, LocationIdx},
    routing::RoutingOracle,
};

/// Reference data of the area served by the ambulances, read-only during a run.
pub struct ServiceRegion {
    locations: Vec<Location>,
    base_stations: Vec<BaseStation>,
    hospitals: Vec<Hospital>,
    incidents: Vec<Incident>,
    routing: Box<dyn RoutingOracle>,
    city_center: BaseStationIdx,

    precomputed_nearest_hospitals: Vec<HospitalIdx>,
    precomputed_population_distribution: Vec<f64>,
}

impl ServiceRegion {
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, index: LocationIdx) -> &Location {
        &self.locations[index]
    }

    pub fn base_stations(&self) -> &[BaseStation] {
        &self.base_stations
    }

    pub fn base_station(&self, index: BaseStationIdx) -> &BaseStation {
        &self.base_stations[index]
    }

    pub fn num_base_stations(&self) -> usize {
        self.base_stations.len()
    }

    pub fn hospitals(&self) -> &[Hospital] {
        &self.hospitals
    }

    pub fn hospital(&self, index: HospitalIdx) -> &Hospital {
        &self.hospitals[index]
    }

    /// Incidents sorted by the time the call was received.
    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn incident(&self, index: IncidentIdx) -> &Incident {
        &self.incidents[index]
    }

    pub fn routing(&self) -> &dyn RoutingOracle {
        self.routing.as_ref()
    }

    pub fn city_center(&self) -> BaseStationIdx {
        self.city_center
    }

    /// Hospital with the shortest travel time to the incident.
    pub fn nearest_hospital(&self, incident: IncidentIdx) -> HospitalIdx {
        self.precomputed_nearest_hospitals[incident.get()]
    }

    /// Share of the total population covered by each base station.
    pub fn population_distribution(&self) -> &[f64] {
        &self.precomputed_population_distribution
    }

    fn precompute_nearest_hospitals(
        locations: &[Location],
        hospitals: &[Hospital],
        incidents: &[Incident],
        routing: &dyn RoutingOracle,
    ) -> Vec<HospitalIdx> {
        incidents
            .iter()
            .map(|incident| {
                let routed = HospitalIdx::all(hospitals.len())
                    .filter_map(|hospital| {
                        routing
                            .travel_time(hospitals[hospital].location(), incident.location)
                            .map(|time| (time, hospital))
                    })
                    .min();

                routed.map_or_else(
                    || {
                        debug!(
                            location = %incident.location,
                            "No routed hospital, falling back to euclidean distance"
                        );
                        let scene = &locations[incident.location.get()];
                        HospitalIdx::all(hospitals.len())
                            .min_by(|&a, &b| {
                                let a = locations[hospitals[a].location().get()]
                                    .euclidean_distance(scene);
                                let b = locations[hospitals[b].location().get()]
                                    .euclidean_distance(scene);
                                a.total_cmp(&b)
                            })
                            .unwrap_or_default()
                    },
                    |(_, hospital)| hospital,
                )
            })
            .collect()
    }

    fn precompute_population_distribution(base_stations: &[BaseStation]) -> Vec<f64> {
        let total: f64 = base_stations
            .iter()
            .map(|station| f64::from(station.population()))
            .sum();

        if total <= 0.0 {
            let uniform = 1.0 / base_stations.len() as f64;
            return vec![uniform; base_stations.len()];
        }

        base_stations
            .iter()
            .map(|station| f64::from(station.population()) / total)
            .collect()
    }
}

#[derive(Default)]
pub struct ServiceRegionBuilder {
    locations: Option<Vec<Location>>,
    base_stations: Vec<BaseStation>,
    hospitals: Vec<Hospital>,
    incidents: Vec<Incident>,
    routing: Option<Box<dyn RoutingOracle>>,
    city_center: Option<BaseStationIdx>,
}

impl ServiceRegionBuilder {
    pub fn set_locations(&mut self, locations: Vec<Location>) -> &mut ServiceRegionBuilder {
        self.locations = Some(locations);
        self
    }

    pub fn add_base_station(&mut self, base_station: BaseStation) -> &mut ServiceRegionBuilder {
        self.base_stations.push(base_station);
        self
    }

    pub fn set_base_stations(
        &mut self,
        base_stations: Vec<BaseStation>,
    ) -> &mut ServiceRegionBuilder {
        self.base_stations = base_stations;
        self
    }

    pub fn add_hospital(&mut self, hospital: Hospital) -> &mut ServiceRegionBuilder {
        self.hospitals.push(hospital);
        self
    }

    pub fn set_hospitals(&mut self, hospitals: Vec<Hospital>) -> &mut ServiceRegionBuilder {
        self.hospitals = hospitals;
        self
    }

    pub fn set_incidents(&mut self, incidents: Vec<Incident>) -> &mut ServiceRegionBuilder {
        self.incidents = incidents;
        self
    }

    pub fn set_routing(&mut self, routing: Box<dyn RoutingOracle>) -> &mut ServiceRegionBuilder {
        self.routing = Some(routing);
        self
    }

    pub fn set_city_center(&mut self, city_center: BaseStationIdx) -> &mut ServiceRegionBuilder {
        self.city_center = Some(city_center);
        self
    }

    pub fn build(self) -> Result<ServiceRegion, RegionError> {
        let locations = self.locations.ok_or(RegionError::Missing("locations"))?;
        let routing = self.routing.ok_or(RegionError::Missing("routing"))?;
        let mut incidents = self.incidents;

        if self.base_stations.len() < 2 {
            return Err(RegionError::NotEnoughBaseStations(self.base_stations.len()));
        }

        if self.hospitals.is_empty() {
            return Err(RegionError::NoHospitals);
        }

        let num_locations = locations.len();
        let referenced = self
            .base_stations
            .iter()
            .map(BaseStation::location)
            .chain(self.hospitals.iter().map(Hospital::location))
            .chain(incidents.iter().map(|incident| incident.location));
        for location in referenced {
            if location.get() >= num_locations {
                return Err(RegionError::LocationOutOfBounds {
                    location,
                    num_locations,
                });
            }
        }

        if let Some(city_center) = self.city_center
            && city_center.get() >= self.base_stations.len()
        {
            return Err(RegionError::UnknownCityCenter(city_center));
        }

        if !incidents.is_sorted_by_key(|incident| incident.call_received) {
            incidents.sort_by_key(|incident| incident.call_received);
        }

        let city_center = self.city_center.unwrap_or_else(|| {
            BaseStationIdx::all(self.base_stations.len())
                .max_by_key(|&station| self.base_stations[station].population())
                .unwrap_or_default()
        });

        let precomputed_nearest_hospitals = ServiceRegion::precompute_nearest_hospitals(
            &locations,
            &self.hospitals,
            &incidents,
            routing.as_ref(),
        );
        let precomputed_population_distribution =
            ServiceRegion::precompute_population_distribution(&self.base_stations);

        Ok(ServiceRegion {
            locations,
            base_stations: self.base_stations,
            hospitals: self.hospitals,
            incidents,
            routing,
            city_center,
            precomputed_nearest_hospitals,
            precomputed_population_distribution,
        })
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use crate::{problem::travel_matrices::TravelMatrices, test_utils};

    use super::*;

    #[test]
    fn test_population_distribution_and_city_center() {
        let region = test_utils::create_test_region(vec![]);

        let distribution = region.population_distribution();
        assert!((distribution.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(region.city_center(), BaseStationIdx::new(0));
    }

    #[test]
    fn test_incidents_are_sorted() {
        let day = date(2018, 1, 8);
        let late = test_utils::create_incident(day.at(12, 0, 0, 0), LocationIdx::new(1), 1, 0);
        let early = test_utils::create_incident(day.at(9, 0, 0, 0), LocationIdx::new(2), 1, 0);

        let region = test_utils::create_test_region(vec![late, early]);

        assert_eq!(region.incidents()[0].call_received, day.at(9, 0, 0, 0));
        assert_eq!(region.incidents()[1].call_received, day.at(12, 0, 0, 0));
    }

    #[test]
    fn test_nearest_hospital_uses_travel_time() {
        let region = test_utils::create_test_region(vec![test_utils::create_incident(
            date(2018, 1, 8).at(9, 0, 0, 0),
            LocationIdx::new(4),
            1,
            0,
        )]);

        let hospital = region.nearest_hospital(IncidentIdx::new(0));
        assert_eq!(region.hospital(hospital).location(), LocationIdx::new(4));
    }

    #[test]
    fn test_rejects_invalid_region() {
        let mut builder = ServiceRegionBuilder::default();
        builder
            .set_locations(vec![Location::from_cartesian(0.0, 0.0)])
            .add_base_station(BaseStation::new("A", LocationIdx::new(0), 10))
            .add_hospital(Hospital::new("H", LocationIdx::new(0)))
            .set_routing(Box::new(TravelMatrices::from_constant(1, 60.0)));

        assert!(matches!(
            builder.build(),
            Err(RegionError::NotEnoughBaseStations(1))
        ));

        let mut builder = ServiceRegionBuilder::default();
        builder
            .set_locations(vec![Location::from_cartesian(0.0, 0.0)])
            .add_base_station(BaseStation::new("A", LocationIdx::new(0), 10))
            .add_base_station(BaseStation::new("B", LocationIdx::new(3), 10))
            .add_hospital(Hospital::new("H", LocationIdx::new(0)))
            .set_routing(Box::new(TravelMatrices::from_constant(1, 60.0)));

        assert!(matches!(
            builder.build(),
            Err(RegionError::LocationOutOfBounds { .. })
        ));
    }
}
