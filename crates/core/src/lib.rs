pub mod counting;
pub mod detection;
pub mod pipeline;
pub mod reporting;
pub mod roi;
pub mod settings;
pub mod shared;
pub mod tracking;
pub mod video;
