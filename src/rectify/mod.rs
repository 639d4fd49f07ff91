//! Page detection and rectification
//!
//! Turns a photograph into a best-guess page quadrilateral and warps it onto
//! a fixed-size canvas.

pub mod pipeline;
pub mod steps;

pub use pipeline::{DetectedPage, Pipeline, PipelineResult, StepTiming};
pub use steps::order::PageCorners;
