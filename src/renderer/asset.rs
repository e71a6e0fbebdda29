//! Decoded puzzle image handle

use image::RgbaImage;

use crate::error::{PuzzleError, PuzzleResult};

/// The puzzle image as seen by the core: either still loading or decoded
#[derive(Debug, Clone, Default)]
pub enum ImageAsset {
    #[default]
    Pending,
    Ready(RgbaImage),
}

impl ImageAsset {
    /// Pixel dimensions once loaded
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            ImageAsset::Pending => None,
            ImageAsset::Ready(img) => Some(img.dimensions()),
        }
    }

    /// Borrow the decoded pixels, or `AssetNotReady`
    pub fn pixels(&self) -> PuzzleResult<&RgbaImage> {
        match self {
            ImageAsset::Ready(img) => Ok(img),
            ImageAsset::Pending => Err(PuzzleError::AssetNotReady),
        }
    }

    /// Wrap raw RGBA8 pixels (e.g. canvas `ImageData`)
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> PuzzleResult<Self> {
        RgbaImage::from_raw(width, height, data)
            .map(ImageAsset::Ready)
            .ok_or_else(|| {
                PuzzleError::config(format!("pixel buffer does not match {width}x{height} RGBA"))
            })
    }

    /// Decode an image file from disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open(path: impl AsRef<std::path::Path>) -> PuzzleResult<Self> {
        let img = image::open(path.as_ref())?;
        log::info!(
            "Loaded {} ({}x{})",
            path.as_ref().display(),
            img.width(),
            img.height()
        );
        Ok(ImageAsset::Ready(img.to_rgba8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_has_no_pixels() {
        let asset = ImageAsset::Pending;
        assert_eq!(asset.dimensions(), None);
        assert!(matches!(asset.pixels(), Err(PuzzleError::AssetNotReady)));
    }

    #[test]
    fn test_from_rgba() {
        let asset = ImageAsset::from_rgba(2, 3, vec![0; 2 * 3 * 4]).unwrap();
        assert_eq!(asset.dimensions(), Some((2, 3)));
        assert!(ImageAsset::from_rgba(2, 3, vec![0; 5]).is_err());
    }
}
