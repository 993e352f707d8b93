use std::{
    fs,
    path::{Path, PathBuf},
    vec,
};

use anyhow::{Context, Result};
use image::RgbImage;
use log::{debug, info};

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Frames read from the image files of a directory, in file-name order
pub struct ImageSequence {
    paths: vec::IntoIter<PathBuf>,
    count: usize,
}

impl ImageSequence {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("failed to read frames directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_frame_file(p))
            .collect();
        paths.sort();

        info!("Found {} frames in \"{}\"", paths.len(), dir.display());

        Ok(ImageSequence {
            count: paths.len(),
            paths: paths.into_iter(),
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Iterator for ImageSequence {
    type Item = Result<RgbImage>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        debug!("Loading frame {}", path.display());
        Some(
            image::open(&path)
                .map(|img| img.to_rgb8())
                .with_context(|| format!("failed to decode frame {}", path.display())),
        )
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            FRAME_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
