//! SnapSheets: find a document page in a photo and flatten it
//!
//! The core is [`rectify::Pipeline`], a pure function from one RGB frame to a
//! [`rectify::PipelineResult`]. The other modules are thin callers around it:
//! a capture loop, PNG/PDF export and an HTTP server.

pub mod capture;
pub mod config;
pub mod error;
pub mod export;
pub mod rectify;
pub mod server;

pub use config::{Config, DetectionParams};
pub use error::RectifyError;
pub use rectify::{DetectedPage, PageCorners, Pipeline, PipelineResult};
