use colorsys::{Hsl, Rgb};
use image::{GrayImage, Luma, Rgb as RgbPixel, RgbImage};
use imageproc::{
    distance_transform::Norm,
    drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut},
    morphology::dilate,
    rect::Rect,
    region_labelling::{connected_components, Connectivity},
};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{geometry_utils::Bounds2D, Point2D};

const MARKER_COLOUR: RgbPixel<u8> = RgbPixel([255, 0, 0]);
const MARKER_RADIUS: i32 = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionConfigError {
    #[error("hue bounds must lie within [0;360], got {0}..{1}")]
    HueOutOfRange(f64, f64),
    #[error("{name} must lie within [0;100], got {value}")]
    PercentOutOfRange { name: &'static str, value: f64 },
    #[error("lightness range is empty: {0}..{1}")]
    EmptyLightnessRange(f64, f64),
}

/// Which pixels count as the target colour, in HSL terms.
/// Hue is in degrees; when `hue_min > hue_max` the range wraps through 0°.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ColourRange {
    pub hue_min: f64,
    pub hue_max: f64,
    /// Percent
    pub saturation_min: f64,
    /// Percent
    pub lightness_min: f64,
    /// Percent
    pub lightness_max: f64,
}

impl ColourRange {
    pub fn validate(&self) -> Result<(), DetectionConfigError> {
        let in_degrees = |h: f64| (0. ..=360.).contains(&h);
        if !in_degrees(self.hue_min) || !in_degrees(self.hue_max) {
            return Err(DetectionConfigError::HueOutOfRange(
                self.hue_min,
                self.hue_max,
            ));
        }
        for (name, value) in [
            ("saturationMin", self.saturation_min),
            ("lightnessMin", self.lightness_min),
            ("lightnessMax", self.lightness_max),
        ] {
            if !(0. ..=100.).contains(&value) {
                return Err(DetectionConfigError::PercentOutOfRange { name, value });
            }
        }
        if self.lightness_min > self.lightness_max {
            return Err(DetectionConfigError::EmptyLightnessRange(
                self.lightness_min,
                self.lightness_max,
            ));
        }
        Ok(())
    }

    pub fn contains(&self, pixel: &RgbPixel<u8>) -> bool {
        let [r, g, b] = pixel.0;
        let hsl = Hsl::from(&Rgb::new(r as f64, g as f64, b as f64, None));
        let hue = hsl.get_hue();
        let hue_ok = if self.hue_min <= self.hue_max {
            hue >= self.hue_min && hue <= self.hue_max
        } else {
            hue >= self.hue_min || hue <= self.hue_max
        };
        hue_ok
            && hsl.get_saturation() >= self.saturation_min
            && hsl.get_lightness() >= self.lightness_min
            && hsl.get_lightness() <= self.lightness_max
    }
}

impl Default for ColourRange {
    fn default() -> Self {
        // Reds through magentas
        ColourRange {
            hue_min: 272.,
            hue_max: 360.,
            saturation_min: 34.,
            lightness_min: 20.,
            lightness_max: 90.,
        }
    }
}

pub struct Detection {
    /// Bounding-box centres of all accepted regions
    pub points: Vec<Point2D>,
    /// Input frame masked to the target colour, with accepted regions marked
    pub annotated: RgbImage,
}

struct Region {
    area: u32,
    bounds: Bounds2D,
}

pub struct ColourDetector {
    colour_range: ColourRange,
    area_threshold: u32,
    dilate_radius: u8,
}

impl ColourDetector {
    pub fn new(
        colour_range: ColourRange,
        area_threshold: u32,
        dilate_radius: u8,
    ) -> Result<Self, DetectionConfigError> {
        colour_range.validate()?;
        Ok(ColourDetector {
            colour_range,
            area_threshold,
            dilate_radius,
        })
    }

    pub fn mask(&self, frame: &RgbImage) -> GrayImage {
        let mask = GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            if self.colour_range.contains(frame.get_pixel(x, y)) {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        if self.dilate_radius > 0 {
            dilate(&mask, Norm::LInf, self.dilate_radius)
        } else {
            mask
        }
    }

    pub fn detect(&self, frame: &RgbImage) -> Detection {
        let mask = self.mask(frame);
        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));

        // Regions end up in raster order of their first pixel
        let mut regions: IndexMap<u32, Region> = IndexMap::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label.0[0];
            if label == 0 {
                continue;
            }
            regions
                .entry(label)
                .and_modify(|r| {
                    r.area += 1;
                    r.bounds.include(x, y);
                })
                .or_insert(Region {
                    area: 1,
                    bounds: Bounds2D::at(x, y),
                });
        }

        let mut annotated = RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
            if mask.get_pixel(x, y).0[0] > 0 {
                *frame.get_pixel(x, y)
            } else {
                RgbPixel([0, 0, 0])
            }
        });

        let points: Vec<Point2D> = regions
            .values()
            .filter(|r| r.area > self.area_threshold)
            .map(|r| {
                let centre = r.bounds.centre();
                draw_hollow_rect_mut(
                    &mut annotated,
                    Rect::at(r.bounds.x_min as i32, r.bounds.y_min as i32)
                        .of_size(r.bounds.width(), r.bounds.height()),
                    MARKER_COLOUR,
                );
                draw_hollow_circle_mut(
                    &mut annotated,
                    (centre.0 as i32, centre.1 as i32),
                    MARKER_RADIUS,
                    MARKER_COLOUR,
                );
                centre
            })
            .collect();

        debug!(
            "Found {} regions, {} above area threshold {}",
            regions.len(),
            points.len(),
            self.area_threshold
        );

        Detection { points, annotated }
    }
}
