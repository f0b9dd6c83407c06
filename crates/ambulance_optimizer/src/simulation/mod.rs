pub mod ambulance;
pub mod call_list;
pub mod config;
pub mod event;
pub mod event_queue;
pub mod response_times;
pub mod simulator;
