use std::{collections::VecDeque, sync::Arc};

use jiff::{SignedDuration, civil::DateTime};
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::{
    error::SimulationError,
    problem::{
        allocation::Allocation,
        incident::{Incident, IncidentIdx},
        service_region::ServiceRegion,
        shift::ShiftType,
    },
};

use super::{
    ambulance::{Ambulance, AmbulanceIdx, AmbulanceState},
    call_list::CallListCache,
    config::SimulationConfig,
    event::{Call, Event},
    event_queue::EventQueue,
    response_times::ResponseTimes,
};

/// Discrete event simulation of the ambulance service over historical incidents.
///
/// A simulator is shared between threads, every call to [`Simulator::simulate`]
/// runs on its own state. Call lists are built once per config.
pub struct Simulator {
    region: Arc<ServiceRegion>,
    call_lists: CallListCache,
}

impl Simulator {
    pub fn new(region: Arc<ServiceRegion>) -> Self {
        Self {
            region,
            call_lists: CallListCache::default(),
        }
    }

    pub fn region(&self) -> &ServiceRegion {
        &self.region
    }

    pub fn simulate(
        &self,
        allocation: &Allocation,
        config: &SimulationConfig,
    ) -> Result<ResponseTimes, SimulationError> {
        let mut run = self.start_run(allocation, config)?;
        while run.step()?.is_some() {}
        Ok(run.finish())
    }

    fn start_run<'a>(
        &'a self,
        allocation: &Allocation,
        config: &'a SimulationConfig,
    ) -> Result<SimulationRun<'a>, SimulationError> {
        allocation.validate(
            self.region.num_base_stations(),
            config.num_ambulances_day,
            config.num_ambulances_night,
        )?;

        let calls = self
            .call_lists
            .get_or_build(config, self.region.incidents());

        Ok(SimulationRun::new(&self.region, config, allocation, &calls))
    }
}

struct SimulationRun<'a> {
    region: &'a ServiceRegion,
    config: &'a SimulationConfig,

    ambulances: Vec<Ambulance>,
    station_ambulances: Vec<Vec<AmbulanceIdx>>,
    /// Units each station should have on duty, indexed by shift.
    targets: [Vec<usize>; 2],
    /// Busy units to take off duty when they are released.
    owed_off_duty: Vec<usize>,

    events: EventQueue,
    backlog: VecDeque<Event>,
    shift: ShiftType,
    now: DateTime,

    response_times: ResponseTimes,
}

impl<'a> SimulationRun<'a> {
    fn new(
        region: &'a ServiceRegion,
        config: &'a SimulationConfig,
        allocation: &Allocation,
        calls: &[(DateTime, Call)],
    ) -> Self {
        let num_base_stations = region.num_base_stations();
        let targets = ShiftType::ALL
            .map(|shift| allocation.station_counts(shift, num_base_stations));

        // Off-duty units stay in the fleet, a station keeps its largest shift
        let mut ambulances = Vec::new();
        let mut station_ambulances = vec![Vec::new(); num_base_stations];
        for (station, base_station) in region.base_stations().iter().enumerate() {
            let size = targets[0][station].max(targets[1][station]);
            for _ in 0..size {
                station_ambulances[station].push(AmbulanceIdx::new(ambulances.len()));
                ambulances.push(Ambulance::new(station.into(), base_station.location()));
            }
        }

        let now = config.warm_up_start();
        let shift = config.shifts.shift_at(now);
        for (station, units) in station_ambulances.iter().enumerate() {
            for &ambulance in units.iter().take(targets[shift.index()][station]) {
                ambulances[ambulance].start_shift();
            }
        }

        let mut events = EventQueue::with_capacity(calls.len() * 2);
        for &(time, call) in calls {
            events.push(time, Event::NewCall(call));
        }

        debug!(
            calls = calls.len(),
            ambulances = ambulances.len(),
            ?shift,
            "Starting simulation run"
        );

        Self {
            region,
            config,
            ambulances,
            station_ambulances,
            targets,
            owed_off_duty: vec![0; num_base_stations],
            events,
            backlog: VecDeque::new(),
            shift,
            now,
            response_times: ResponseTimes::default(),
        }
    }

    /// Handles the next event, returns its time or `None` once the queue is empty.
    fn step(&mut self) -> Result<Option<DateTime>, SimulationError> {
        let Some(scheduled) = self.events.pop()? else {
            return Ok(None);
        };

        self.now = scheduled.time;
        self.update_shift();

        match scheduled.event {
            Event::NewCall(call) | Event::PartiallyRespondedCall(call) => {
                self.handle_call(scheduled.event, call)?;
            }
            Event::SceneDeparture { incident } => {
                self.handle_scene_departure(incident);
                self.drain_backlog();
            }
            Event::JobCompletion { ambulance, trip } => {
                if self.handle_job_completion(ambulance, trip) {
                    self.drain_backlog();
                }
            }
            Event::LocationUpdate { ambulance, trip } => {
                self.handle_location_update(ambulance, trip);
            }
        }

        Ok(Some(self.now))
    }

    fn finish(self) -> ResponseTimes {
        if !self.backlog.is_empty() {
            warn!(
                unserved = self.backlog.len(),
                "Calls left in the backlog at the end of the simulation"
            );
        }

        self.response_times
    }

    fn handle_call(&mut self, event: Event, call: Call) -> Result<(), SimulationError> {
        if call.demand() == 0 {
            trace!(incident = %call.incident, "Discarding call without demand");
            return Ok(());
        }

        let region = self.region;
        let routing = region.routing();
        let incident = region.incident(call.incident);
        let scene = incident.location;

        let mut available = AmbulanceIdx::all(self.ambulances.len())
            .filter(|&ambulance| self.ambulances[ambulance].is_available())
            .map(|ambulance| {
                let metric = self.config.dispatch_policy.metric(
                    region,
                    self.ambulances[ambulance].current_location(),
                    scene,
                );
                (metric, ambulance)
            })
            .collect::<Vec<_>>();

        if available.is_empty() {
            self.backlog.push_back(event);
            return Ok(());
        }

        available.sort_by(|(a, _), (b, _)| a.total_cmp(b));
        let first_responder = available[0].1;
        let travel_time = self.ambulances[first_responder].time_to(scene, routing);
        let hospital = region
            .hospital(region.nearest_hospital(call.incident))
            .location();

        let mut units = available.into_iter().map(|(_, ambulance)| ambulance);
        let mut dispatched: SmallVec<[AmbulanceIdx; 4]> = SmallVec::new();

        let mut transport = 0;
        for ambulance in units.by_ref().take(call.transport_demand as usize) {
            self.ambulances[ambulance].dispatch_transport(
                call.incident,
                scene,
                hospital,
                self.now,
                routing,
            );
            dispatched.push(ambulance);
            transport += 1;
        }

        let mut non_transport = 0;
        for ambulance in units.take(call.non_transport_demand as usize) {
            self.ambulances[ambulance].dispatch(call.incident, scene, self.now, routing);
            dispatched.push(ambulance);
            non_transport += 1;
        }

        let remainder = call.remainder(transport, non_transport);
        if remainder.demand() > 0 {
            trace!(
                incident = %call.incident,
                missing = remainder.demand(),
                "Not enough ambulances, call partially responded"
            );
            self.backlog
                .push_back(Event::PartiallyRespondedCall(remainder));
        }

        match incident.scene_duration() {
            Some(scene_duration) => {
                self.events.push(
                    self.now + scene_duration,
                    Event::SceneDeparture {
                        incident: call.incident,
                    },
                );

                if call.provides_response_time {
                    self.record_response_time(call.incident, incident, travel_time)?;
                }
            }
            None => {
                let completion = self.now + incident.total_interval_non_transport();
                for ambulance in dispatched {
                    let trip = self.ambulances[ambulance].trip();
                    self.events
                        .push(completion, Event::JobCompletion { ambulance, trip });
                }
            }
        }

        Ok(())
    }

    fn record_response_time(
        &mut self,
        index: IncidentIdx,
        incident: &Incident,
        travel_time: Option<SignedDuration>,
    ) -> Result<(), SimulationError> {
        if incident.arrival_at_scene.is_none() {
            return Ok(());
        }

        let Some(travel_time) = travel_time else {
            warn!(incident = %index, "No route for the first responder, skipping its response time");
            return Ok(());
        };

        let waited = self.now.duration_since(incident.call_received);
        let response_time = waited.max(incident.dispatch_delay()) + travel_time;
        if response_time.is_negative() {
            return Err(SimulationError::NegativeResponseTime {
                incident: index,
                response_time,
            });
        }

        self.response_times
            .add(incident.call_received, incident.location, response_time);

        Ok(())
    }

    fn handle_scene_departure(&mut self, incident: IncidentIdx) {
        let routing = self.region.routing();
        let to_available = self
            .region
            .incident(incident)
            .departure_to_available_transport()
            .unwrap_or(SignedDuration::ZERO);

        for ambulance in AmbulanceIdx::all(self.ambulances.len()) {
            if !self.ambulances[ambulance].is_responding_to(incident) {
                continue;
            }

            let unit = &mut self.ambulances[ambulance];
            unit.arrive_at_scene();

            if unit.is_transport() {
                unit.transport(self.now, routing);
                let trip = unit.trip();
                self.events.push(
                    self.now + to_available,
                    Event::JobCompletion { ambulance, trip },
                );
            } else {
                self.release(ambulance);
            }
        }
    }

    /// Returns whether the ambulance was released.
    fn handle_job_completion(&mut self, ambulance: AmbulanceIdx, trip: u32) -> bool {
        let unit = &mut self.ambulances[ambulance];
        if unit.trip() != trip || unit.incident().is_none() {
            trace!(ambulance = %ambulance, trip, "Ignoring stale job completion");
            return false;
        }

        match unit.state() {
            AmbulanceState::EnRouteToHospital => unit.arrive_at_hospital(),
            _ => unit.arrive_at_scene(),
        }

        self.release(ambulance);
        true
    }

    fn handle_location_update(&mut self, ambulance: AmbulanceIdx, trip: u32) {
        let period = self.config.location_update_period;
        let unit = &mut self.ambulances[ambulance];
        if unit.trip() != trip {
            return;
        }

        unit.update_location(period, self.region.routing());
        if !unit.end_of_journey() {
            self.events
                .push(self.now + period, Event::LocationUpdate { ambulance, trip });
        }
    }

    /// Frees an ambulance from its job. Owed off-duty transitions only apply here.
    fn release(&mut self, ambulance: AmbulanceIdx) {
        let unit = &mut self.ambulances[ambulance];
        unit.flag_available(self.now, self.region.routing());

        let station = unit.base_station().get();
        if self.owed_off_duty[station] > 0 {
            unit.finish_shift();
            self.owed_off_duty[station] -= 1;
        }

        if !unit.end_of_journey() {
            let trip = unit.trip();
            self.events.push(
                self.now + self.config.location_update_period,
                Event::LocationUpdate { ambulance, trip },
            );
        }
    }

    /// Re-queues backlog calls at the current time while ambulances remain.
    fn drain_backlog(&mut self) {
        let mut supply = self
            .ambulances
            .iter()
            .filter(|ambulance| ambulance.is_available())
            .count();

        while supply > 0
            && let Some(event) = self.backlog.pop_front()
        {
            let demand = event.call().map_or(0, Call::demand) as usize;
            supply = supply.saturating_sub(demand);
            self.events.push(self.now, event);
        }
    }

    /// Reconciles every station with the targets of the shift at the current time.
    fn update_shift(&mut self) {
        let shift = self.config.shifts.shift_at(self.now);
        if shift == self.shift {
            return;
        }

        debug!(?shift, time = %self.now, "Shift changeover");
        self.shift = shift;

        for (station, units) in self.station_ambulances.iter().enumerate() {
            let target = self.targets[shift.index()][station];
            let on_duty = units
                .iter()
                .filter(|&&ambulance| !self.ambulances[ambulance].is_off_duty())
                .count();

            if on_duty > target {
                let mut excess = on_duty - target;
                for &ambulance in units {
                    if excess == 0 {
                        break;
                    }
                    if self.ambulances[ambulance].is_available() {
                        self.ambulances[ambulance].finish_shift();
                        excess -= 1;
                    }
                }
                self.owed_off_duty[station] = excess;
            } else {
                self.owed_off_duty[station] = 0;
                let mut missing = target - on_duty;
                for &ambulance in units {
                    if missing == 0 {
                        break;
                    }
                    if self.ambulances[ambulance].is_off_duty() {
                        self.ambulances[ambulance].start_shift();
                        missing -= 1;
                    }
                }
            }
        }

        self.drain_backlog();
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        for ambulance in &self.ambulances {
            assert_eq!(
                ambulance.is_available(),
                ambulance.incident().is_none() && !ambulance.is_off_duty()
            );
            if ambulance.is_off_duty() {
                assert!(ambulance.incident().is_none());
            }
        }

        for (station, units) in self.station_ambulances.iter().enumerate() {
            let on_duty = units
                .iter()
                .filter(|&&ambulance| !self.ambulances[ambulance].is_off_duty())
                .count();
            assert_eq!(
                on_duty - self.owed_off_duty[station],
                self.targets[self.shift.index()][station],
                "station {station} at {}",
                self.now
            );
        }
    }
}
