pub mod evolution_strategy;
pub mod improvement_operator;
pub mod memetic_algorithm;
pub mod memetic_params;
pub mod operator_critic;
