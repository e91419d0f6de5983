pub mod image_decoder;
pub mod image_file_writer;
pub mod jpeg_encoder;
