pub mod neighborhood;
pub mod sls_params;
pub mod stochastic_local_search;
