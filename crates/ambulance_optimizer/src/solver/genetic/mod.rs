pub mod genetic_algorithm;
pub mod genetic_operators;
pub mod genetic_params;
pub mod next_generation;
pub mod population;
