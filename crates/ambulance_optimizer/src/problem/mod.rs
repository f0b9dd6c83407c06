pub mod allocation;
pub mod base_station;
pub mod dispatch_policy;
pub mod hospital;
pub mod incident;
pub mod location;
pub mod routing;
pub mod service_region;
pub mod shift;
pub mod travel_matrices;
pub mod urgency_level;
