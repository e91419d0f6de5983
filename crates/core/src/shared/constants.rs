pub const FACE_CASCADE_NAME: &str = "haarcascade_frontalface_default.xml";
pub const EYES_CASCADE_NAME: &str = "haarcascade_eye.xml";
pub const SMILE_CASCADE_NAME: &str = "haarcascade_smile.xml";

/// Download name and MIME type of the annotated image.
pub const OUTPUT_FILE_NAME: &str = "image_detectee.jpg";
pub const OUTPUT_MIME: &str = "image/jpeg";

/// Same default quality as OpenCV's `imencode(".jpg", ...)`.
pub const JPEG_QUALITY: u8 = 95;

pub const DEFAULT_FACE_COLOR: &str = "#00FF00";
pub const DEFAULT_FACE_MIN_NEIGHBORS: u32 = 5;
pub const DEFAULT_FACE_SCALE_FACTOR: f64 = 1.3;

pub const FACE_MIN_NEIGHBORS_RANGE: (u32, u32) = (1, 10);
pub const FACE_SCALE_FACTOR_RANGE: (f64, f64) = (1.1, 2.0);
pub const FACE_SCALE_FACTOR_STEP: f64 = 0.1;

pub const EYES_SCALE_FACTOR: f64 = 1.1;
pub const EYES_MIN_NEIGHBORS: u32 = 5;

/// Smile cascades fire on teeth, lips and shadows; a high neighbor count
/// trades recall for precision.
pub const SMILE_SCALE_FACTOR: f64 = 1.7;
pub const SMILE_MIN_NEIGHBORS: u32 = 20;

pub const STROKE_WIDTH: u32 = 2;
