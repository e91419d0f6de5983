use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use serde::Serialize;

use smilecam_core::annotation::domain::annotation_style::{AnnotationStyle, Rgb};
use smilecam_core::annotation::infrastructure::rectangle_outliner::RectangleOutliner;
use smilecam_core::detection::domain::detection_params::DetectionParams;
use smilecam_core::detection::infrastructure::cascade_loader::load_cascades;
use smilecam_core::imaging::domain::image_encoder::ImageEncoder;
use smilecam_core::imaging::domain::image_writer::ImageWriter;
use smilecam_core::imaging::infrastructure::image_decoder::read_image;
use smilecam_core::imaging::infrastructure::image_file_writer::ImageFileWriter;
use smilecam_core::imaging::infrastructure::jpeg_encoder::JpegEncoder;
use smilecam_core::pipeline::annotate_image_use_case::AnnotateImageUseCase;
use smilecam_core::pipeline::annotation_result::AnnotationResult;
use smilecam_core::pipeline::pipeline_logger::SummaryPipelineLogger;
use smilecam_core::shared::constants::{
    DEFAULT_FACE_COLOR, DEFAULT_FACE_MIN_NEIGHBORS, DEFAULT_FACE_SCALE_FACTOR,
    FACE_MIN_NEIGHBORS_RANGE, FACE_SCALE_FACTOR_RANGE, FACE_SCALE_FACTOR_STEP, OUTPUT_FILE_NAME,
};
use smilecam_core::shared::region::Region;

const STDIN_INPUT: &str = "-";

/// Detect faces, eyes and smiles in a photo and save an annotated JPEG.
#[derive(Parser)]
#[command(name = "smilecam")]
struct Cli {
    /// Input image file, or `-` to read encoded image bytes from stdin.
    input: PathBuf,

    /// Annotated JPEG output path.
    #[arg(short, long, default_value = OUTPUT_FILE_NAME)]
    output: PathBuf,

    /// Face rectangle color as #RRGGBB.
    #[arg(long, default_value = DEFAULT_FACE_COLOR)]
    color: String,

    /// Face detector minNeighbors (1-10).
    #[arg(long, default_value_t = DEFAULT_FACE_MIN_NEIGHBORS)]
    min_neighbors: u32,

    /// Face detector scaleFactor (1.1-2.0, step 0.1).
    #[arg(long, default_value_t = DEFAULT_FACE_SCALE_FACTOR)]
    scale_factor: f64,

    /// Directory holding the Haar cascade XML files (default: next to the executable).
    #[arg(long)]
    cascade_dir: Option<PathBuf>,

    /// Also write the annotated display copy here (format from extension).
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Write a JSON report of the detections here.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Serialize)]
struct RegionReport {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl From<&Region> for RegionReport {
    fn from(r: &Region) -> Self {
        Self {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }
}

#[derive(Serialize)]
struct FaceReport {
    region: RegionReport,
    eyes: Vec<RegionReport>,
    smiles: Vec<RegionReport>,
}

#[derive(Serialize)]
struct Report {
    status: String,
    face_count: usize,
    faces: Vec<FaceReport>,
    output_file: String,
    mime_type: &'static str,
}

impl Report {
    fn new(result: &AnnotationResult, output: &Path) -> Self {
        let faces = result
            .faces()
            .iter()
            .map(|f| FaceReport {
                region: RegionReport::from(&f.face),
                eyes: f.eyes.iter().map(RegionReport::from).collect(),
                smiles: f.smiles.iter().map(RegionReport::from).collect(),
            })
            .collect();
        let output_file = output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| OUTPUT_FILE_NAME.to_string());
        Self {
            status: result.status().message(),
            face_count: result.face_count(),
            faces,
            output_file,
            mime_type: JpegEncoder::default().mime_type(),
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let face_params = DetectionParams::new(cli.scale_factor, cli.min_neighbors)?;
    let style = AnnotationStyle::with_face_color(cli.color.parse::<Rgb>()?);

    let cascade_dir = match &cli.cascade_dir {
        Some(dir) => dir.clone(),
        None => executable_dir()?,
    };
    let cascades = load_cascades(&cascade_dir)?;

    let mut use_case = AnnotateImageUseCase::new(
        cascades,
        Box::new(RectangleOutliner::new()),
        Box::new(SummaryPipelineLogger::new()),
    );
    let result = if cli.input.as_os_str() == STDIN_INPUT {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        use_case.execute_bytes(&bytes, &face_params, &style)?
    } else {
        use_case.execute(read_image(&cli.input)?, &face_params, &style)
    };
    println!("{}", result.status());

    let jpeg = use_case.encode_jpeg(&result)?;
    fs::write(&cli.output, &jpeg)
        .map_err(|e| format!("Failed to write {}: {e}", cli.output.display()))?;
    log::info!("Saved {} ({} bytes)", cli.output.display(), jpeg.len());

    if let Some(preview) = &cli.preview {
        let display = result
            .display_image()
            .ok_or("Annotated image is not a 3-channel RGB image")?;
        ImageFileWriter::new().write(preview, &display)?;
    }

    if let Some(report_path) = &cli.report {
        let json = serde_json::to_string_pretty(&Report::new(&result, &cli.output))?;
        fs::write(report_path, json)
            .map_err(|e| format!("Failed to write {}: {e}", report_path.display()))?;
    }

    use_case.logger().summary();
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.input.as_os_str() != STDIN_INPUT && !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    let (min_n, max_n) = FACE_MIN_NEIGHBORS_RANGE;
    if !(min_n..=max_n).contains(&cli.min_neighbors) {
        return Err(format!(
            "Min neighbors must be between {min_n} and {max_n}, got {}",
            cli.min_neighbors
        )
        .into());
    }
    let (min_s, max_s) = FACE_SCALE_FACTOR_RANGE;
    let in_range = (min_s - 1e-9..=max_s + 1e-9).contains(&cli.scale_factor);
    if !in_range || !on_step_grid(cli.scale_factor) {
        return Err(format!(
            "Scale factor must be between {min_s} and {max_s} in steps of {FACE_SCALE_FACTOR_STEP}, got {}",
            cli.scale_factor
        )
        .into());
    }
    cli.color.parse::<Rgb>()?;
    Ok(())
}

fn on_step_grid(value: f64) -> bool {
    let steps = (value / FACE_SCALE_FACTOR_STEP).round();
    (value - steps * FACE_SCALE_FACTOR_STEP).abs() < 1e-9
}

fn executable_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| format!("Cannot resolve directory of {}", exe.display()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smilecam_core::pipeline::annotation_result::FaceAnnotation;
    use smilecam_core::shared::frame::Frame;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("smilecam").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["-"]);
        assert_eq!(cli.output, PathBuf::from("image_detectee.jpg"));
        assert_eq!(cli.color, "#00FF00");
        assert_eq!(cli.min_neighbors, 5);
        assert!((cli.scale_factor - 1.3).abs() < f64::EPSILON);
        assert!(cli.cascade_dir.is_none());
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_missing_input_rejected() {
        let cli = parse(&["/nonexistent/photo.jpg"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_existing_input_accepted() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let cli = parse(&[file.path().to_str().unwrap()]);
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_min_neighbors_range() {
        assert!(validate(&parse(&["-", "--min-neighbors", "0"])).is_err());
        assert!(validate(&parse(&["-", "--min-neighbors", "11"])).is_err());
        assert!(validate(&parse(&["-", "--min-neighbors", "1"])).is_ok());
        assert!(validate(&parse(&["-", "--min-neighbors", "10"])).is_ok());
    }

    #[test]
    fn test_scale_factor_range_and_grid() {
        for ok in ["1.1", "1.5", "2.0", "2"] {
            assert!(validate(&parse(&["-", "--scale-factor", ok])).is_ok(), "{ok}");
        }
        for bad in ["1.0", "1.05", "1.25", "2.1", "NaN"] {
            assert!(validate(&parse(&["-", "--scale-factor", bad])).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_color_validated() {
        assert!(validate(&parse(&["-", "--color", "ff0000"])).is_ok());
        assert!(validate(&parse(&["-", "--color", "red"])).is_err());
    }

    #[test]
    fn test_report_contents() {
        let face = FaceAnnotation {
            face: Region::new(1, 2, 30, 40),
            eyes: vec![Region::new(5, 6, 7, 8)],
            smiles: vec![],
        };
        let result = AnnotationResult::new(Frame::new(vec![0; 48 * 3], 8, 6, 3), vec![face]);
        let report = Report::new(&result, Path::new("out/photo.jpg"));
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();

        assert_eq!(json["status"], "1 face detected.");
        assert_eq!(json["face_count"], 1);
        assert_eq!(json["faces"][0]["region"]["width"], 30);
        assert_eq!(json["faces"][0]["eyes"][0]["x"], 5);
        assert_eq!(json["output_file"], "photo.jpg");
        assert_eq!(json["mime_type"], "image/jpeg");
    }
}
