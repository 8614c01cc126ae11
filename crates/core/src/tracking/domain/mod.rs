pub mod recent_faces;
pub mod track_store;
