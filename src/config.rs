use crate::error::RectifyError;
use crate::rectify::steps::color::ChannelOrder;
use clap::Parser;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "snapsheets-server")]
#[command(about = "Page detection and rectification server for SnapSheets")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "SNAPSHEETS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "SNAPSHEETS_PORT", default_value = "9393")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 20MB)
    #[arg(long, env = "SNAPSHEETS_MAX_FILE_SIZE", default_value = "20971520")]
    pub max_file_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Smallest accepted region, as a fraction of the frame area
    #[arg(long, default_value_t = DEFAULT_MIN_AREA_FRACTION)]
    pub min_area_fraction: f64,

    /// Tolerance scalar before the first halving
    #[arg(long, default_value_t = DEFAULT_INITIAL_TOLERANCE)]
    pub initial_tolerance: f64,

    /// Tolerance fraction below which detection gives up
    #[arg(long, default_value_t = DEFAULT_MIN_TOLERANCE)]
    pub min_tolerance: f64,

    /// Width of the rectified page in pixels
    #[arg(long, default_value_t = DEFAULT_TARGET_WIDTH)]
    pub target_width: u32,

    /// Height-to-width ratio of the rectified page (1.41 ~ ISO A-series)
    #[arg(long, default_value_t = DEFAULT_ASPECT_RATIO)]
    pub aspect_ratio: f64,

    /// Stroke width of the page outline on the annotated image
    #[arg(long, default_value_t = DEFAULT_OUTLINE_THICKNESS)]
    pub outline_thickness: u32,
}

pub const DEFAULT_MIN_AREA_FRACTION: f64 = 0.25;
pub const DEFAULT_INITIAL_TOLERANCE: f64 = 2.0;
pub const DEFAULT_MIN_TOLERANCE: f64 = 0.0001;
pub const DEFAULT_TARGET_WIDTH: u32 = 720;
pub const DEFAULT_ASPECT_RATIO: f64 = 1.41;
pub const DEFAULT_OUTLINE_THICKNESS: u32 = 4;
pub const DEFAULT_OUTLINE_COLOR: [u8; 3] = [255, 0, 255];

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub detection: DetectionParams,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            detection: DetectionParams {
                // Uploads always decode to RGB
                channel_order: ChannelOrder::Rgb,
                min_area_fraction: args.min_area_fraction,
                initial_tolerance: args.initial_tolerance,
                min_tolerance: args.min_tolerance,
                target_width: args.target_width,
                aspect_ratio: args.aspect_ratio,
                outline_color: DEFAULT_OUTLINE_COLOR,
                outline_thickness: args.outline_thickness,
            },
        }
    }
}

/// Tunable constants of the detection pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionParams {
    pub channel_order: ChannelOrder,
    pub min_area_fraction: f64,
    pub initial_tolerance: f64,
    pub min_tolerance: f64,
    pub target_width: u32,
    pub aspect_ratio: f64,
    pub outline_color: [u8; 3],
    pub outline_thickness: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            channel_order: ChannelOrder::Rgb,
            min_area_fraction: DEFAULT_MIN_AREA_FRACTION,
            initial_tolerance: DEFAULT_INITIAL_TOLERANCE,
            min_tolerance: DEFAULT_MIN_TOLERANCE,
            target_width: DEFAULT_TARGET_WIDTH,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            outline_color: DEFAULT_OUTLINE_COLOR,
            outline_thickness: DEFAULT_OUTLINE_THICKNESS,
        }
    }
}

impl DetectionParams {
    /// Height of the rectified page, truncated like the width-ratio product
    pub fn target_height(&self) -> u32 {
        (self.aspect_ratio * self.target_width as f64) as u32
    }

    /// Area floor for a candidate region in a `width` x `height` frame
    pub fn min_valid_area(&self, width: u32, height: u32) -> f64 {
        (width as f64 * height as f64 * self.min_area_fraction).floor()
    }

    pub fn validate(&self) -> Result<(), RectifyError> {
        if !(self.min_area_fraction > 0.0 && self.min_area_fraction <= 1.0) {
            return Err(RectifyError::InvalidParameters(format!(
                "min_area_fraction must be in (0, 1], got {}",
                self.min_area_fraction
            )));
        }
        if !(self.min_tolerance > 0.0) {
            return Err(RectifyError::InvalidParameters(format!(
                "min_tolerance must be positive, got {}",
                self.min_tolerance
            )));
        }
        if !(self.initial_tolerance > self.min_tolerance) {
            return Err(RectifyError::InvalidParameters(format!(
                "initial_tolerance ({}) must exceed min_tolerance ({})",
                self.initial_tolerance, self.min_tolerance
            )));
        }
        if !(self.aspect_ratio > 0.0) {
            return Err(RectifyError::InvalidParameters(format!(
                "aspect_ratio must be positive, got {}",
                self.aspect_ratio
            )));
        }
        if self.target_width == 0 || self.target_height() == 0 {
            return Err(RectifyError::InvalidParameters(format!(
                "target page {}x{} has a zero dimension",
                self.target_width,
                self.target_height()
            )));
        }
        if self.outline_thickness == 0 {
            return Err(RectifyError::InvalidParameters(
                "outline_thickness must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
