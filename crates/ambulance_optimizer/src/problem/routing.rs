use jiff::SignedDuration;

use super::location::LocationIdx;

/// Travel between two grid cells as known by a routing oracle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route<'a> {
    pub travel_time: SignedDuration,
    /// Cells visited from origin to destination, both included.
    pub path: Option<&'a [LocationIdx]>,
}

/// Precomputed travel information between grid cells.
///
/// A missing pair means the destination is unreachable from the origin.
/// Callers rank such pairs last or fall back to another estimate, a missing
/// route never aborts a simulation.
pub trait RoutingOracle: Send + Sync {
    fn route(&self, from: LocationIdx, to: LocationIdx) -> Option<Route<'_>>;

    fn travel_time(&self, from: LocationIdx, to: LocationIdx) -> Option<SignedDuration> {
        self.route(from, to).map(|route| route.travel_time)
    }
}
