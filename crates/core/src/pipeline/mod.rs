pub mod annotate_image_use_case;
pub mod annotation_result;
pub mod pipeline_logger;
