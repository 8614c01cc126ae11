pub mod api_error;
pub mod config;
pub mod constants;
pub mod frame;
pub mod gender;
pub mod geometry;
pub mod model_resolver;
