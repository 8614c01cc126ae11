pub mod image_sequence_reader;
pub mod jpeg_encoder;
