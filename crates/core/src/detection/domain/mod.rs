pub mod face_locator;
pub mod gender_attributor;
pub mod gender_classifier;
pub mod person_detector;
