pub mod cascade_loader;
pub mod cascade_reader;
pub mod haar_cascade;
pub mod integral_image;
mod math;
pub mod rect_grouper;
