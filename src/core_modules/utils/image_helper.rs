// Mask I/O through the `image` crate. Any format `image` can decode is
// accepted; color images are reduced to 8-bit luma and every non-zero pixel
// counts as foreground.

use crate::core_modules::mask::OwnedMask;
use crate::error::TrackingError;
use image::{GrayImage, ImageEncoder};
use std::path::Path;

/// Decodes an image file into a mask.
pub fn load_mask(path: impl AsRef<Path>) -> Result<OwnedMask, TrackingError> {
    let image = image::open(path)?.into_luma8();
    from_luma(&image)
}

/// Wraps an 8-bit luma image as a mask.
pub fn from_luma(image: &GrayImage) -> Result<OwnedMask, TrackingError> {
    let (width, height) = image.dimensions();
    Ok(OwnedMask::from_vec(image.as_raw().clone(), width, height)?)
}

/// Writes a mask as an 8-bit grayscale PNG.
pub fn save_mask(path: impl AsRef<Path>, mask: &OwnedMask) -> Result<(), TrackingError> {
    let output = std::fs::File::create(path).map_err(image::ImageError::IoError)?;
    let encoder = image::codecs::png::PngEncoder::new(output);
    let view = mask.as_mask();
    encoder.write_image(
        view.data(),
        view.width(),
        view.height(),
        image::ExtendedColorType::L8,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trip_preserves_foreground() {
        let mut mask = OwnedMask::blank(32, 24);
        mask.fill_rect(4, 5, 6, 7);
        let path = std::env::temp_dir().join(format!("blob_tracker_mask_{}.png", std::process::id()));

        save_mask(&path, &mask).expect("Error saving mask.");
        let loaded = load_mask(&path).expect("Error loading mask.");
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, mask);
    }

    #[test]
    fn luma_pixels_map_one_to_one() {
        let mut image = GrayImage::new(3, 2);
        image.put_pixel(2, 1, image::Luma([200]));
        let mask = from_luma(&image).unwrap();
        let view = mask.as_mask();
        assert!(view.is_foreground(2, 1));
        assert_eq!(view.foreground_count(), 1);
    }

    #[test]
    fn missing_file_is_an_image_error() {
        let err = load_mask("/nonexistent/blob_tracker/mask.png").unwrap_err();
        assert!(matches!(err, TrackingError::Image(_)));
    }
}
