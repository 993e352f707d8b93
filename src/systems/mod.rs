pub mod detection;
pub mod frames;
pub mod points_output;
pub mod rendering;
pub mod tracker;

use detection::{ColourDetector, DetectionConfigError};
use image::{imageops, DynamicImage, GrayImage, RgbImage};
use log::{info, warn};
use points_output::PointsOutput;
use rendering::{BlobRenderer, RenderConfigError};
use thiserror::Error;
use tracker::{Tracker, TrackerConfigError};

use crate::{backend_config::BackendConfig, geometry_utils::is_finite_point, Point2D};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid tracking settings: {0}")]
    Tracking(#[from] TrackerConfigError),
    #[error("invalid detection settings: {0}")]
    Detection(#[from] DetectionConfigError),
    #[error("invalid render settings: {0}")]
    Render(#[from] RenderConfigError),
}

pub struct FrameResult {
    /// Raw detections, as found in this frame
    pub detections: Vec<Point2D>,
    /// Stabilised positions of all live tracked points
    pub points: Vec<Point2D>,
    pub annotated: RgbImage,
    pub blobs: GrayImage,
}

pub struct Systems {
    pub detector: ColourDetector,
    pub tracker: Tracker,
    pub renderer: BlobRenderer,
    pub points_output: PointsOutput,
}

impl Systems {
    pub fn new(config: &BackendConfig) -> Result<Systems, ConfigError> {
        let detector = ColourDetector::new(
            config.colour_range(),
            config.detection_area_threshold,
            config.detection_dilate_radius,
        )?;

        let tracker = Tracker::new(config.tracker_settings())?;

        let renderer = BlobRenderer::new(
            config.render_canvas_scale,
            config.render_blob_radius,
            config.render_blur_sigma,
        )?;

        info!(
            "Tracking with match radius {}, health {}..{} (start {})",
            config.tracking_match_radius,
            config.tracking_health_min,
            config.tracking_health_max,
            config.tracking_health_start
        );

        Ok(Systems {
            detector,
            tracker,
            renderer,
            points_output: PointsOutput::new(config.points_empty_send_mode),
        })
    }

    /// Detect, track and render a single frame
    pub fn process_frame(&mut self, frame: &RgbImage) -> FrameResult {
        let detection = self.detector.detect(frame);

        let detections = finite_detections(detection.points);
        let points = self.tracker.update(&detections);
        let blobs = self.renderer.render(&points, frame.width(), frame.height());

        FrameResult {
            detections,
            points,
            annotated: detection.annotated,
            blobs,
        }
    }

    /// Forget all tracked points, e.g. when the frame source starts over
    pub fn restart(&mut self) {
        info!("Restarting; dropping {} tracked points", self.tracker.len());
        self.tracker.clear();
    }
}

/// Drop detections the tracker cannot match against
pub fn finite_detections(mut detections: Vec<Point2D>) -> Vec<Point2D> {
    let before = detections.len();
    detections.retain(is_finite_point);
    if detections.len() != before {
        warn!(
            "Dropped {} detections with non-finite coordinates",
            before - detections.len()
        );
    }
    detections
}

/// Original frame, annotated mask and blob image side by side
pub fn composite(frame: &RgbImage, result: &FrameResult) -> RgbImage {
    let (width, height) = frame.dimensions();
    let blobs = DynamicImage::ImageLuma8(result.blobs.clone()).to_rgb8();

    let mut canvas = RgbImage::new(width * 3, height);
    imageops::replace(&mut canvas, frame, 0, 0);
    imageops::replace(&mut canvas, &result.annotated, width as i64, 0);
    imageops::replace(&mut canvas, &blobs, 2 * width as i64, 0);
    canvas
}
