pub mod cascade_set;
pub mod classifier_role;
pub mod detection_params;
pub mod object_detector;
