use crate::problem::incident::{Incident, IncidentIdx};

use super::ambulance::AmbulanceIdx;

/// Outstanding vehicle demand of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub incident: IncidentIdx,
    /// Only the first response to a call inside the scored window is recorded.
    pub provides_response_time: bool,
    pub transport_demand: u32,
    pub non_transport_demand: u32,
}

impl Call {
    pub fn new(index: IncidentIdx, incident: &Incident, provides_response_time: bool) -> Self {
        Self {
            incident: index,
            provides_response_time,
            transport_demand: incident.transporting_vehicles,
            non_transport_demand: incident.non_transporting_vehicles,
        }
    }

    pub fn demand(&self) -> u32 {
        self.transport_demand + self.non_transport_demand
    }

    /// Demand left after a partial response, never scored again.
    pub fn remainder(&self, transport_dispatched: u32, non_transport_dispatched: u32) -> Call {
        Call {
            incident: self.incident,
            provides_response_time: false,
            transport_demand: self.transport_demand.saturating_sub(transport_dispatched),
            non_transport_demand: self
                .non_transport_demand
                .saturating_sub(non_transport_dispatched),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    NewCall(Call),
    PartiallyRespondedCall(Call),
    SceneDeparture {
        incident: IncidentIdx,
    },
    /// `trip` identifies the leg the timer was armed for, older timers are stale.
    JobCompletion {
        ambulance: AmbulanceIdx,
        trip: u32,
    },
    LocationUpdate {
        ambulance: AmbulanceIdx,
        trip: u32,
    },
}

impl Event {
    pub fn call(&self) -> Option<&Call> {
        match self {
            Event::NewCall(call) | Event::PartiallyRespondedCall(call) => Some(call),
            _ => None,
        }
    }
}
