pub mod service_region_input;
pub mod types;
