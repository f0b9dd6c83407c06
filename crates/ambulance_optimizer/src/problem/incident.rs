use jiff::{SignedDuration, civil::DateTime};
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

use super::{location::LocationIdx, urgency_level::UrgencyLevel};

define_index_newtype!(IncidentIdx, Incident);

/// A historical emergency call with the timestamps recorded by dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub call_received: DateTime,
    pub location: LocationIdx,
    pub urgency: UrgencyLevel,
    pub dispatched: DateTime,
    pub arrival_at_scene: Option<DateTime>,
    pub departure_from_scene: Option<DateTime>,
    pub available_non_transport: DateTime,
    pub available_transport: DateTime,
    pub non_transporting_vehicles: u32,
    pub transporting_vehicles: u32,
}

impl Incident {
    pub fn dispatch_delay(&self) -> SignedDuration {
        self.dispatched.duration_since(self.call_received)
    }

    /// From call received to departure from the scene, when the incident had one.
    pub fn scene_duration(&self) -> Option<SignedDuration> {
        self.departure_from_scene
            .map(|departure| departure.duration_since(self.call_received))
    }

    pub fn total_interval_non_transport(&self) -> SignedDuration {
        self.available_non_transport
            .duration_since(self.call_received)
    }

    pub fn departure_to_available_transport(&self) -> Option<SignedDuration> {
        self.departure_from_scene
            .map(|departure| self.available_transport.duration_since(departure))
    }

    pub fn demand(&self) -> u32 {
        self.transporting_vehicles + self.non_transporting_vehicles
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use crate::test_utils;

    use super::*;

    #[test]
    fn test_intervals() {
        let call = date(2018, 1, 8).at(10, 0, 0, 0);
        let incident = test_utils::create_incident(call, LocationIdx::new(0), 1, 0);

        assert_eq!(incident.dispatch_delay(), SignedDuration::from_mins(2));
        assert_eq!(incident.scene_duration(), Some(SignedDuration::from_mins(30)));
        assert_eq!(
            incident.departure_to_available_transport(),
            Some(SignedDuration::from_mins(40))
        );
        assert_eq!(
            incident.total_interval_non_transport(),
            SignedDuration::from_mins(45)
        );
        assert_eq!(incident.demand(), 1);
    }
}
