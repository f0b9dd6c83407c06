pub mod evaluator;
pub mod genetic;
pub mod initializer;
pub mod memetic;
pub mod optimizer;
pub mod params;
pub mod sls;
pub mod solution;
pub mod statistics;
