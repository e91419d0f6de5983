pub mod image_encoder;
pub mod image_io_error;
pub mod image_writer;
