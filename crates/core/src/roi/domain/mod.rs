pub mod roi_config;
pub mod roi_gate;
