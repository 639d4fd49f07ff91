use crate::config::DetectionParams;
use crate::error::RectifyError;
use image::{GrayImage, RgbImage};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

use super::steps;
use super::steps::order::PageCorners;

/// Timing information for a single pipeline step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// A page located in the frame, with both derived images
#[derive(Debug, Clone)]
pub struct DetectedPage {
    pub corners: PageCorners,
    /// Tolerance fraction at which the outline reduced to four vertices
    pub tolerance: f64,
    /// Index of the accepted region among those that passed the area filter
    pub region_index: usize,
    pub passes: u32,
    /// Normalized original with the page outline drawn on it
    pub annotated: RgbImage,
    /// Page warped onto the fixed target canvas
    pub rectified: RgbImage,
}

/// Outcome of one pipeline run
///
/// `original` is always present. The annotated and rectified images live in
/// `page`, so they are either both present or both absent.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub original: RgbImage,
    pub page: Option<DetectedPage>,
    /// Otsu threshold used for binarization
    pub threshold: u8,
    /// Regions that survived the area filter
    pub candidates: usize,
    pub total_time_ms: u64,
    pub steps: Vec<StepTiming>,
}

impl PipelineResult {
    pub fn is_found(&self) -> bool {
        self.page.is_some()
    }

    pub fn annotated(&self) -> Option<&RgbImage> {
        self.page.as_ref().map(|page| &page.annotated)
    }

    pub fn rectified(&self) -> Option<&RgbImage> {
        self.page.as_ref().map(|page| &page.rectified)
    }

    pub fn corners(&self) -> Option<&PageCorners> {
        self.page.as_ref().map(|page| &page.corners)
    }
}

/// Page detection and rectification pipeline
///
/// Stateless between calls; one instance can serve any number of frames.
#[derive(Debug, Clone)]
pub struct Pipeline {
    params: DetectionParams,
}

impl Pipeline {
    pub fn new(params: DetectionParams) -> Result<Self, RectifyError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Locate the page in `image` and rectify it
    ///
    /// Not finding a page is a normal outcome (`page == None`); errors are
    /// reserved for invalid input.
    pub fn process(&self, image: &RgbImage) -> Result<PipelineResult, RectifyError> {
        let start = Instant::now();
        let mut timings = Vec::new();
        let params = &self.params;

        let original = run_step("normalize", &mut timings, || {
            steps::color::apply(image, params.channel_order)
        })?;
        let (width, height) = original.dimensions();

        let gray: GrayImage = run_step("grayscale", &mut timings, || {
            Ok(steps::grayscale::apply(&original))
        })?;

        let (binary, threshold) =
            run_step("threshold", &mut timings, || Ok(steps::threshold::apply(&gray)))?;
        debug!(threshold, "Otsu threshold selected");

        let min_area = params.min_valid_area(width, height);
        let regions = run_step("contours", &mut timings, || {
            let contours = steps::contours::external(&binary);
            let found = contours.len();
            let regions = steps::contours::filter_by_area(contours, min_area);
            debug!(found, kept = regions.len(), min_area, "Contours filtered by area");
            Ok(regions)
        })?;
        let candidates = regions.len();

        let quad = run_step("detect", &mut timings, || {
            Ok(steps::detect::find_page_quad(
                &regions,
                params.initial_tolerance,
                params.min_tolerance,
            ))
        })?;

        let page = match quad {
            None => None,
            Some(quad) => {
                let corners = steps::order::apply(quad.vertices);
                let rectified = run_step("warp", &mut timings, || {
                    Ok(steps::warp::apply(
                        &original,
                        &corners,
                        params.target_width,
                        params.target_height(),
                    ))
                })?;

                match rectified {
                    None => None,
                    Some(rectified) => {
                        let annotated = run_step("annotate", &mut timings, || {
                            Ok(steps::annotate::apply(
                                &original,
                                &quad.vertices,
                                params.outline_color,
                                params.outline_thickness,
                            ))
                        })?;
                        Some(DetectedPage {
                            corners,
                            tolerance: quad.tolerance,
                            region_index: quad.region_index,
                            passes: quad.passes,
                            annotated,
                            rectified,
                        })
                    }
                }
            }
        };

        let total_time_ms = start.elapsed().as_millis() as u64;
        match &page {
            Some(page) => info!(
                width,
                height,
                corners = ?page.corners.to_pairs(),
                tolerance = page.tolerance,
                total_time_ms,
                "Page detected"
            ),
            None => info!(width, height, candidates, total_time_ms, "No page found"),
        }

        Ok(PipelineResult {
            original,
            page,
            threshold,
            candidates,
            total_time_ms,
            steps: timings,
        })
    }
}

fn run_step<T, F>(name: &str, timings: &mut Vec<StepTiming>, step_fn: F) -> Result<T, RectifyError>
where
    F: FnOnce() -> Result<T, RectifyError>,
{
    let step_start = Instant::now();
    let result = step_fn()?;
    timings.push(StepTiming {
        name: name.to_string(),
        time_ms: step_start.elapsed().as_millis() as u64,
    });
    Ok(result)
}
