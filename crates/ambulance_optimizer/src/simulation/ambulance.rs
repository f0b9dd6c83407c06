use jiff::{SignedDuration, civil::DateTime};

use crate::{
    define_index_newtype,
    problem::{
        base_station::BaseStationIdx, incident::IncidentIdx, location::LocationIdx,
        routing::RoutingOracle,
    },
};

define_index_newtype!(AmbulanceIdx, Ambulance);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmbulanceState {
    OffDuty,
    AvailableAtBase,
    EnRouteToIncident,
    AtScene,
    EnRouteToHospital,
    ReturningToBase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobPhase {
    Responding,
    AtScene,
    Transporting,
}

#[derive(Debug, Clone, Copy)]
struct Job {
    incident: IncidentIdx,
    scene: LocationIdx,
    hospital: Option<LocationIdx>,
    phase: JobPhase,
}

/// State of one ambulance during a simulation run.
///
/// The simulator drives every transition, an ambulance never schedules
/// anything by itself. It is available when it has no job and is on duty.
#[derive(Debug, Clone)]
pub struct Ambulance {
    base_station: BaseStationIdx,
    base_location: LocationIdx,
    current_location: LocationIdx,

    origin: LocationIdx,
    destination: Option<LocationIdx>,
    travel_start: Option<DateTime>,
    time_to_destination: SignedDuration,
    path_index: usize,

    job: Option<Job>,
    off_duty: bool,
    trip: u32,
}

impl Ambulance {
    pub fn new(base_station: BaseStationIdx, base_location: LocationIdx) -> Self {
        Self {
            base_station,
            base_location,
            current_location: base_location,
            origin: base_location,
            destination: None,
            travel_start: None,
            time_to_destination: SignedDuration::ZERO,
            path_index: 0,
            job: None,
            off_duty: true,
            trip: 0,
        }
    }

    pub fn base_station(&self) -> BaseStationIdx {
        self.base_station
    }

    pub fn current_location(&self) -> LocationIdx {
        self.current_location
    }

    pub fn destination(&self) -> Option<LocationIdx> {
        self.destination
    }

    pub fn incident(&self) -> Option<IncidentIdx> {
        self.job.map(|job| job.incident)
    }

    pub fn hospital(&self) -> Option<LocationIdx> {
        self.job.and_then(|job| job.hospital)
    }

    pub fn travel_start(&self) -> Option<DateTime> {
        self.travel_start
    }

    /// Counter of legs started, timers armed for an older leg are stale.
    pub fn trip(&self) -> u32 {
        self.trip
    }

    pub fn is_available(&self) -> bool {
        self.job.is_none() && !self.off_duty
    }

    pub fn is_off_duty(&self) -> bool {
        self.off_duty
    }

    pub fn is_transport(&self) -> bool {
        self.hospital().is_some()
    }

    /// Assigned to the incident and has not left its scene yet.
    pub fn is_responding_to(&self, incident: IncidentIdx) -> bool {
        self.job
            .is_some_and(|job| job.incident == incident && job.phase != JobPhase::Transporting)
    }

    pub fn end_of_journey(&self) -> bool {
        self.destination.is_none()
    }

    pub fn state(&self) -> AmbulanceState {
        match self.job.map(|job| job.phase) {
            Some(JobPhase::Responding) => AmbulanceState::EnRouteToIncident,
            Some(JobPhase::AtScene) => AmbulanceState::AtScene,
            Some(JobPhase::Transporting) => AmbulanceState::EnRouteToHospital,
            None if self.off_duty => AmbulanceState::OffDuty,
            None if self.current_location == self.base_location => {
                AmbulanceState::AvailableAtBase
            }
            None => AmbulanceState::ReturningToBase,
        }
    }

    pub fn start_shift(&mut self) {
        self.off_duty = false;
    }

    pub fn finish_shift(&mut self) {
        self.off_duty = true;
    }

    pub fn dispatch(
        &mut self,
        incident: IncidentIdx,
        scene: LocationIdx,
        now: DateTime,
        routing: &dyn RoutingOracle,
    ) {
        self.assign(incident, scene, None, now, routing);
    }

    pub fn dispatch_transport(
        &mut self,
        incident: IncidentIdx,
        scene: LocationIdx,
        hospital: LocationIdx,
        now: DateTime,
        routing: &dyn RoutingOracle,
    ) {
        self.assign(incident, scene, Some(hospital), now, routing);
    }

    fn assign(
        &mut self,
        incident: IncidentIdx,
        scene: LocationIdx,
        hospital: Option<LocationIdx>,
        now: DateTime,
        routing: &dyn RoutingOracle,
    ) {
        self.job = Some(Job {
            incident,
            scene,
            hospital,
            phase: JobPhase::Responding,
        });
        self.start_leg(scene, now, routing);
    }

    pub fn arrive_at_scene(&mut self) {
        if let Some(job) = self.job.as_mut() {
            job.phase = JobPhase::AtScene;
            self.current_location = job.scene;
            self.stop();
        }
    }

    /// Leaves the scene towards the hospital of the job.
    pub fn transport(&mut self, now: DateTime, routing: &dyn RoutingOracle) {
        let Some(job) = self.job.as_mut() else {
            return;
        };
        let Some(hospital) = job.hospital else {
            return;
        };

        job.phase = JobPhase::Transporting;
        self.start_leg(hospital, now, routing);
    }

    pub fn arrive_at_hospital(&mut self) {
        if let Some(hospital) = self.hospital() {
            self.current_location = hospital;
            self.stop();
        }
    }

    /// Clears the job and heads back to the base station.
    pub fn flag_available(&mut self, now: DateTime, routing: &dyn RoutingOracle) {
        self.job = None;
        self.start_leg(self.base_location, now, routing);
    }

    /// Moves along the path of the current leg by `period` worth of travel.
    pub fn update_location(&mut self, period: SignedDuration, routing: &dyn RoutingOracle) {
        let Some(destination) = self.destination else {
            return;
        };

        self.time_to_destination = self.time_to_destination - period;
        if !self.time_to_destination.is_positive() {
            self.arrive(destination);
            return;
        }

        if routing.route(self.origin, destination).is_none() {
            self.arrive(destination);
            return;
        }
        let Some(path) = LegPath::find(routing, self.origin, destination) else {
            return;
        };

        // Skip every cell that is farther from the destination than the remaining travel
        while let Some(next) = path.cell(self.path_index + 1) {
            match routing.travel_time(next, destination) {
                Some(remaining) if remaining > self.time_to_destination => self.path_index += 1,
                _ => break,
            }
        }

        if let Some(cell) = path.cell(self.path_index) {
            self.current_location = cell;
        }
    }

    /// Where the ambulance would be drawn at `time`, without moving it.
    pub fn position_at(&self, time: DateTime, routing: &dyn RoutingOracle) -> LocationIdx {
        let (Some(destination), Some(travel_start)) = (self.destination, self.travel_start) else {
            return self.current_location;
        };
        let Some(route) = routing.route(self.origin, destination) else {
            return self.current_location;
        };

        let elapsed = time.duration_since(travel_start);
        if elapsed >= route.travel_time {
            return destination;
        }
        if !elapsed.is_positive() {
            return self.origin;
        }

        // Last cell already passed on the way
        let remaining = route.travel_time - elapsed;
        LegPath::find(routing, self.origin, destination)
            .and_then(|path| {
                (0..path.len()).rev().filter_map(|index| path.cell(index)).find(|&cell| {
                    routing
                        .travel_time(cell, destination)
                        .is_some_and(|time| time >= remaining)
                })
            })
            .unwrap_or(self.origin)
    }

    pub fn time_to(
        &self,
        location: LocationIdx,
        routing: &dyn RoutingOracle,
    ) -> Option<SignedDuration> {
        routing.travel_time(self.current_location, location)
    }

    fn start_leg(&mut self, destination: LocationIdx, now: DateTime, routing: &dyn RoutingOracle) {
        self.trip += 1;
        self.origin = self.current_location;
        self.path_index = 0;
        self.travel_start = Some(now);

        if destination == self.current_location {
            self.stop();
            return;
        }

        self.destination = Some(destination);
        self.time_to_destination = routing
            .travel_time(self.current_location, destination)
            .unwrap_or(SignedDuration::ZERO);
    }

    fn arrive(&mut self, destination: LocationIdx) {
        self.current_location = destination;
        self.stop();
    }

    fn stop(&mut self) {
        self.destination = None;
        self.time_to_destination = SignedDuration::ZERO;
        self.path_index = 0;
    }
}

/// Cells of a leg in travel order, read backward when only the return path is known.
struct LegPath<'a> {
    cells: &'a [LocationIdx],
    reversed: bool,
}

impl<'a> LegPath<'a> {
    fn find(
        routing: &'a dyn RoutingOracle,
        origin: LocationIdx,
        destination: LocationIdx,
    ) -> Option<Self> {
        let forward = routing.route(origin, destination).and_then(|route| route.path);
        if let Some(cells) = forward {
            return Some(Self {
                cells,
                reversed: false,
            });
        }

        routing
            .route(destination, origin)
            .and_then(|route| route.path)
            .map(|cells| Self {
                cells,
                reversed: true,
            })
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn cell(&self, index: usize) -> Option<LocationIdx> {
        let index = if self.reversed {
            self.cells.len().checked_sub(index + 1)?
        } else {
            index
        };
        self.cells.get(index).copied()
    }
}
