use image::{imageops, imageops::FilterType, GrayImage, Luma};
use imageproc::{drawing::draw_filled_circle_mut, filter::gaussian_blur_f32};
use map_range::MapRange;
use thiserror::Error;

use crate::Point2D;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderConfigError {
    #[error("canvas scale must be at least 1")]
    ZeroCanvasScale,
    #[error("blob radius must be positive, got {0}")]
    InvalidBlobRadius(f32),
    #[error("blur sigma must be positive, got {0}")]
    InvalidBlurSigma(f32),
}

/// Draws soft, glowing blobs at each tracked point.
///
/// Drawing and blurring happen on a canvas `canvas_scale` times smaller than
/// the frame, which is then scaled back up; blur cost drops with the square of
/// the scale.
pub struct BlobRenderer {
    canvas_scale: u32,
    blob_radius: f32,
    blur_sigma: f32,
}

impl BlobRenderer {
    pub fn new(
        canvas_scale: u32,
        blob_radius: f32,
        blur_sigma: f32,
    ) -> Result<Self, RenderConfigError> {
        if canvas_scale == 0 {
            return Err(RenderConfigError::ZeroCanvasScale);
        }
        if !(blob_radius.is_finite() && blob_radius > 0.) {
            return Err(RenderConfigError::InvalidBlobRadius(blob_radius));
        }
        if !(blur_sigma.is_finite() && blur_sigma > 0.) {
            return Err(RenderConfigError::InvalidBlurSigma(blur_sigma));
        }
        Ok(BlobRenderer {
            canvas_scale,
            blob_radius,
            blur_sigma,
        })
    }

    pub fn render(&self, points: &[Point2D], width: u32, height: u32) -> GrayImage {
        if points.is_empty() || width == 0 || height == 0 {
            return GrayImage::new(width, height);
        }

        let canvas_width = (width / self.canvas_scale).max(1);
        let canvas_height = (height / self.canvas_scale).max(1);
        let mut canvas = GrayImage::new(canvas_width, canvas_height);

        let radius = ((self.blob_radius / self.canvas_scale as f32).round() as i32).max(1);
        for &(x, y) in points {
            let cx = x.map_range(0. ..width as f32, 0. ..canvas_width as f32);
            let cy = y.map_range(0. ..height as f32, 0. ..canvas_height as f32);
            draw_filled_circle_mut(
                &mut canvas,
                (cx.round() as i32, cy.round() as i32),
                radius,
                Luma([255]),
            );
        }

        let sigma = self.blur_sigma / self.canvas_scale as f32;
        let blurred = gaussian_blur_f32(&canvas, sigma);

        imageops::resize(&blurred, width, height, FilterType::Triangle)
    }
}
