pub mod count_faces_use_case;
pub mod count_people_use_case;
pub mod counting_loop;
pub mod frame_annotator;
pub mod pipeline_logger;
