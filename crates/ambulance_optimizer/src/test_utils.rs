use std::sync::Arc;

use jiff::{
    SignedDuration,
    civil::{DateTime, date},
};

use crate::{
    problem::{
        allocation::Allocation,
        base_station::{BaseStation, BaseStationIdx},
        dispatch_policy::DispatchPolicy,
        hospital::Hospital,
        incident::Incident,
        location::{Location, LocationIdx},
        service_region::{ServiceRegion, ServiceRegionBuilder},
        shift::ShiftSchedule,
        travel_matrices::TravelMatrices,
        urgency_level::UrgencyLevel,
    },
    simulation::{config::SimulationConfig, simulator::Simulator},
    solver::evaluator::Evaluator,
};

pub fn create_line_locations(num_locations: usize) -> Vec<Location> {
    (0..num_locations)
        .map(|index| Location::from_cartesian(index as f64 * 1000.0, 0.0))
        .collect()
}

/// Cells 1 km apart on a straight line, 100 seconds of travel between neighbours.
pub fn create_line_routing(num_locations: usize) -> TravelMatrices {
    let locations = create_line_locations(num_locations);
    let mut routing = TravelMatrices::from_euclidean(&locations, 10.0);

    for from in 0..num_locations {
        for to in 0..num_locations {
            if from == to {
                continue;
            }

            let path = if from < to {
                (from..=to).map(LocationIdx::new).collect()
            } else {
                (to..=from).rev().map(LocationIdx::new).collect()
            };
            routing
                .set_path(LocationIdx::new(from), LocationIdx::new(to), path)
                .unwrap();
        }
    }

    routing
}

/// An incident with a scene departure, 2 minutes to dispatch and 10 to arrive.
pub fn create_incident(
    call_received: DateTime,
    location: LocationIdx,
    transporting_vehicles: u32,
    non_transporting_vehicles: u32,
) -> Incident {
    Incident {
        call_received,
        location,
        urgency: UrgencyLevel::Acute,
        dispatched: call_received + SignedDuration::from_mins(2),
        arrival_at_scene: Some(call_received + SignedDuration::from_mins(10)),
        departure_from_scene: Some(call_received + SignedDuration::from_mins(30)),
        available_non_transport: call_received + SignedDuration::from_mins(45),
        available_transport: call_received + SignedDuration::from_mins(70),
        non_transporting_vehicles,
        transporting_vehicles,
    }
}

/// Five cells on a line with stations at cells 0, 2, 4 and hospitals at cells 1, 4.
pub fn create_test_region(incidents: Vec<Incident>) -> ServiceRegion {
    let mut builder = ServiceRegionBuilder::default();

    builder
        .set_locations(create_line_locations(5))
        .set_base_stations(vec![
            BaseStation::new("A", LocationIdx::new(0), 300),
            BaseStation::new("B", LocationIdx::new(2), 200),
            BaseStation::new("C", LocationIdx::new(4), 100),
        ])
        .set_hospitals(vec![
            Hospital::new("North", LocationIdx::new(1)),
            Hospital::new("South", LocationIdx::new(4)),
        ])
        .set_incidents(incidents)
        .set_routing(Box::new(create_line_routing(5)));

    builder.build().unwrap()
}

pub fn create_test_config(num_ambulances_day: usize, num_ambulances_night: usize) -> SimulationConfig {
    SimulationConfig {
        start: date(2018, 1, 8).at(0, 0, 0, 0),
        end: date(2018, 1, 9).at(0, 0, 0, 0),
        num_ambulances_day,
        num_ambulances_night,
        dispatch_policy: DispatchPolicy::Fastest,
        buffer: SignedDuration::from_hours(4),
        location_update_period: SignedDuration::from_mins(5),
        shifts: ShiftSchedule::default(),
    }
}

pub fn create_allocation(day: &[usize], night: &[usize]) -> Allocation {
    Allocation::new(
        day.iter().copied().map(BaseStationIdx::new).collect(),
        night.iter().copied().map(BaseStationIdx::new).collect(),
    )
}

/// Calls spread over the scored day, each at one of the five cells.
pub fn create_daily_incidents(count: usize) -> Vec<Incident> {
    let start = date(2018, 1, 8).at(0, 30, 0, 0);
    (0..count)
        .map(|index| {
            let call = start + SignedDuration::from_mins(index as i64 * 47);
            let transporting = u32::from(index % 3 != 0);
            let non_transporting = u32::from(index % 4 == 0);
            create_incident(call, LocationIdx::new(index % 5), transporting, non_transporting)
        })
        .collect()
}

pub fn create_simulator(incidents: Vec<Incident>) -> Arc<Simulator> {
    Arc::new(Simulator::new(Arc::new(create_test_region(incidents))))
}

/// Evaluator over a day of calls with 3 day and 2 night ambulances.
pub fn create_test_evaluator() -> Evaluator {
    let simulator = create_simulator(create_daily_incidents(30));
    Evaluator::new(simulator, create_test_config(3, 2)).unwrap()
}
