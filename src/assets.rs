/*
 *  assets.rs
 *
 *  dayboard - the day at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Icon and background image loading
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use embedded_graphics::pixelcolor::BinaryColor;
use image::imageops::FilterType;
use image::DynamicImage;
use log::{debug, warn};

use crate::display::canvas::{is_ink, Bitmap, Canvas};
use crate::error::AssetError;
use crate::svgimage::SvgImageRenderer;

/// Raster formats tried, in order, before falling back to svg
const RASTER_EXTENSIONS: [&str; 3] = ["png", "gif", "bmp"];

/// How a decoded image is sized before thresholding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// keep native size, shrink (aspect kept) only if larger than the box
    Within(u32),
    /// resample to exactly this size
    Exact(u32, u32),
}

impl Fit {
    fn svg_size(self) -> (u32, u32) {
        match self {
            Fit::Within(s) => (s, s),
            Fit::Exact(w, h) => (w, h),
        }
    }
}

/// Lookup of footer icons by key (file stem, e.g. `Cake_icon_on`).
pub trait IconStore {
    /// `None` when there is no such asset; a miss is never an error
    fn icon(&self, key: &str) -> Option<Bitmap>;
}

/// Icons read from a directory of image files.
#[derive(Debug, Clone)]
pub struct DirIconStore {
    dir: PathBuf,
    fit: Fit,
}

impl DirIconStore {
    pub fn new(dir: impl Into<PathBuf>, fit: Fit) -> Self {
        Self { dir: dir.into(), fit }
    }

    fn find(&self, key: &str) -> Option<PathBuf> {
        RASTER_EXTENSIONS
            .iter()
            .chain(std::iter::once(&"svg"))
            .map(|ext| self.dir.join(format!("{key}.{ext}")))
            .find(|p| p.exists())
    }
}

impl IconStore for DirIconStore {
    fn icon(&self, key: &str) -> Option<Bitmap> {
        let Some(path) = self.find(key) else {
            debug!("No asset for icon {} in {}", key, self.dir.display());
            return None;
        };
        match load_bitmap(&path, self.fit) {
            Ok(bitmap) => Some(bitmap),
            Err(e) => {
                warn!("Skipping icon {}: {}", key, e);
                None
            }
        }
    }
}

/// Fixed set of icons, for tests and for callers that render their own.
#[derive(Debug, Clone, Default)]
pub struct MemoryIconStore {
    icons: HashMap<String, Bitmap>,
}

impl MemoryIconStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, bitmap: Bitmap) -> Self {
        self.icons.insert(key.to_string(), bitmap);
        self
    }
}

impl IconStore for MemoryIconStore {
    fn icon(&self, key: &str) -> Option<Bitmap> {
        self.icons.get(key).cloned()
    }
}

/// Decode any supported image file into a 1-bit bitmap
pub fn load_bitmap(path: &Path, fit: Fit) -> Result<Bitmap, AssetError> {
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("svg")) {
        let data = fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (w, h) = fit.svg_size();
        return SvgImageRenderer::new(&data, w, h)
            .and_then(|r| r.render_bitmap())
            .map_err(|source| AssetError::Svg {
                path: path.to_path_buf(),
                source,
            });
    }

    let img = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(threshold(&resize(img, fit)))
}

fn resize(img: DynamicImage, fit: Fit) -> DynamicImage {
    match fit {
        Fit::Exact(w, h) if (img.width(), img.height()) != (w, h) => {
            img.resize_exact(w, h, FilterType::Triangle)
        }
        Fit::Within(s) if img.width() > s || img.height() > s => {
            img.resize(s, s, FilterType::Triangle)
        }
        _ => img,
    }
}

/// Dark opaque pixels become ink
pub fn threshold(img: &DynamicImage) -> Bitmap {
    let rgba = img.to_rgba8();
    Bitmap::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        if is_ink(r, g, b, a) { BinaryColor::On } else { BinaryColor::Off }
    })
}

/// Load the pre-printed background; it must match the canvas exactly
pub fn load_base_image(path: &Path, width: u32, height: u32) -> Result<Canvas, AssetError> {
    let img = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    if (img.width(), img.height()) != (width, height) {
        return Err(AssetError::BaseImageSize {
            path: path.to_path_buf(),
            expected: (width, height),
            actual: (img.width(), img.height()),
        });
    }
    debug!("Base image {} loaded", path.display());
    Ok(Canvas::from_bitmap(threshold(&img)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dayboard-assets-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(path: &Path, w: u32, h: u32) {
        // left half black, right half white
        let img = RgbaImage::from_fn(w, h, |x, _| {
            if x < w / 2 { Rgba([0, 0, 0, 255]) } else { Rgba([255, 255, 255, 255]) }
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_dir_store_finds_png() {
        let dir = scratch_dir("png");
        write_png(&dir.join("Cake_icon.png"), 8, 4);
        let store = DirIconStore::new(&dir, Fit::Within(100));

        let icon = store.icon("Cake_icon").unwrap();
        assert_eq!((icon.width(), icon.height()), (8, 4));
        assert_eq!(icon.get(0, 0), Some(BinaryColor::On));
        assert_eq!(icon.get(7, 0), Some(BinaryColor::Off));
        assert!(store.icon("Halloween_icon").is_none());
    }

    #[test]
    fn test_within_shrinks_large_icons() {
        let dir = scratch_dir("shrink");
        write_png(&dir.join("big.png"), 200, 100);
        let icon = load_bitmap(&dir.join("big.png"), Fit::Within(50)).unwrap();
        assert_eq!((icon.width(), icon.height()), (50, 25));
    }

    #[test]
    fn test_exact_resizes() {
        let dir = scratch_dir("exact");
        write_png(&dir.join("10.png"), 50, 50);
        let icon = load_bitmap(&dir.join("10.png"), Fit::Exact(100, 100)).unwrap();
        assert_eq!((icon.width(), icon.height()), (100, 100));
    }

    #[test]
    fn test_corrupt_icon_is_skipped() {
        let dir = scratch_dir("corrupt");
        fs::write(dir.join("Broken_icon.png"), b"not a png").unwrap();
        let store = DirIconStore::new(&dir, Fit::Within(100));
        assert!(store.icon("Broken_icon").is_none());
    }

    #[test]
    fn test_base_image_size_must_match() {
        let dir = scratch_dir("base");
        write_png(&dir.join("blank.png"), 10, 20);
        assert!(load_base_image(&dir.join("blank.png"), 10, 20).is_ok());
        assert!(matches!(
            load_base_image(&dir.join("blank.png"), 20, 10),
            Err(AssetError::BaseImageSize { .. })
        ));
        assert!(load_base_image(&dir.join("missing.png"), 10, 20).is_err());
    }
}
