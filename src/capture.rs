//! Live capture loop
//!
//! A `CaptureSession` is fed frames from a `FrameSource` and remembers the
//! latest frame that contained a page, so a caller can "clip" it once the
//! preview looks right.

use crate::error::RectifyError;
use crate::rectify::{Pipeline, PipelineResult};
use image::RgbImage;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Anything that produces frames: a camera, a video file, a test fixture
pub trait FrameSource {
    /// Next frame, or `None` once the stream has ended
    fn next_frame(&mut self) -> Result<Option<RgbImage>, RectifyError>;
}

/// Frames replayed from memory
#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<RgbImage>,
}

impl FrameQueue {
    pub fn new(frames: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

impl FrameSource for FrameQueue {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, RectifyError> {
        Ok(self.frames.pop_front())
    }
}

/// Counters reported when a capture loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames: u64,
    pub pages: u64,
}

/// State of one capture run
pub struct CaptureSession {
    pipeline: Pipeline,
    latest: Option<PipelineResult>,
    capture: Option<PipelineResult>,
    stats: CaptureStats,
}

impl CaptureSession {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            latest: None,
            capture: None,
            stats: CaptureStats::default(),
        }
    }

    /// Run the pipeline on one frame and update the session
    pub fn process_frame(&mut self, frame: &RgbImage) -> Result<&PipelineResult, RectifyError> {
        let result = self.pipeline.process(frame)?;
        self.stats.frames += 1;

        if result.is_found() {
            self.stats.pages += 1;
            self.capture = Some(result.clone());
        }

        Ok(self.latest.insert(result))
    }

    /// Image to show for the latest frame: the outlined page if one was
    /// found, otherwise the plain frame
    pub fn preview(&self) -> Option<&RgbImage> {
        self.latest
            .as_ref()
            .map(|result| result.annotated().unwrap_or(&result.original))
    }

    pub fn has_capture(&self) -> bool {
        self.capture.is_some()
    }

    /// Take the most recent frame that contained a page
    pub fn clip(&mut self) -> Option<PipelineResult> {
        self.capture.take()
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }
}

/// Pump frames from `source` into `session` until `stop` is set or the
/// source runs dry
pub fn run_capture<S: FrameSource>(
    source: &mut S,
    session: &mut CaptureSession,
    stop: &AtomicBool,
) -> Result<CaptureStats, RectifyError> {
    let start = session.stats();

    while !stop.load(Ordering::Relaxed) {
        let Some(frame) = source.next_frame()? else {
            debug!("Frame source exhausted");
            break;
        };
        let found = session.process_frame(&frame)?.is_found();
        debug!(found, "Frame processed");
    }

    let end = session.stats();
    let stats = CaptureStats {
        frames: end.frames - start.frames,
        pages: end.pages - start.pages,
    };
    info!(frames = stats.frames, pages = stats.pages, "Capture loop stopped");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionParams;
    use image::Rgb;

    fn blank() -> RgbImage {
        RgbImage::from_pixel(120, 160, Rgb([40, 40, 40]))
    }

    fn page() -> RgbImage {
        let mut img = blank();
        for y in 30..130 {
            for x in 20..100 {
                img.put_pixel(x, y, Rgb([230, 230, 230]));
            }
        }
        img
    }

    fn session() -> CaptureSession {
        CaptureSession::new(Pipeline::new(DetectionParams::default()).unwrap())
    }

    struct FailingSource;

    impl FrameSource for FailingSource {
        fn next_frame(&mut self) -> Result<Option<RgbImage>, RectifyError> {
            Err(RectifyError::FrameSource("camera unplugged".to_string()))
        }
    }

    #[test]
    fn test_capture_survives_later_empty_frames() {
        let mut source = FrameQueue::new([blank(), page(), blank()]);
        let mut session = session();
        let stop = AtomicBool::new(false);

        let stats = run_capture(&mut source, &mut session, &stop).unwrap();

        assert_eq!(stats, CaptureStats { frames: 3, pages: 1 });
        assert!(session.has_capture());
        // Latest frame was blank: preview falls back to the plain frame
        assert_eq!(session.preview(), Some(&blank()));

        let clipped = session.clip().unwrap();
        assert!(clipped.rectified().is_some());
        assert!(!session.has_capture());
        assert!(session.clip().is_none());
    }

    #[test]
    fn test_preview_shows_outline_when_page_found() {
        let mut session = session();
        session.process_frame(&page()).unwrap();
        let preview = session.preview().unwrap();
        assert_ne!(preview, &page());
    }

    #[test]
    fn test_stop_flag_prevents_processing() {
        let mut source = FrameQueue::new([page(), page()]);
        let mut session = session();
        let stop = AtomicBool::new(true);

        let stats = run_capture(&mut source, &mut session, &stop).unwrap();
        assert_eq!(stats.frames, 0);
        assert!(session.preview().is_none());
    }

    #[test]
    fn test_source_errors_propagate() {
        let mut session = session();
        let stop = AtomicBool::new(false);
        assert!(matches!(
            run_capture(&mut FailingSource, &mut session, &stop),
            Err(RectifyError::FrameSource(_))
        ));
    }
}
