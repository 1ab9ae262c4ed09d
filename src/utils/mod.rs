//! Utility functions for the digitizer.
//!
//! Image loading and encoding helpers, and logging setup.

use crate::core::errors::DigitizerError;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;

/// Initializes the tracing subscriber for logging.
///
/// The log level is controlled through the `RUST_LOG` environment variable.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Loads an image from a file path and converts it to RGB.
pub fn load_image(path: impl AsRef<Path>) -> Result<RgbImage, DigitizerError> {
    let img = image::open(path.as_ref())?;
    Ok(img.to_rgb8())
}

/// Decodes an image from encoded bytes (PNG, JPEG, ...) and converts it to RGB.
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<RgbImage, DigitizerError> {
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgb8())
}

/// Encodes an RGB image as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, DigitizerError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

/// Fails with [`DigitizerError::InvalidImage`] when the image has a zero dimension.
pub fn validate_image_dimensions(image: &RgbImage) -> Result<(), DigitizerError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DigitizerError::InvalidImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_png_round_trip_keeps_pixels() {
        let mut img = RgbImage::from_pixel(4, 3, Rgb([255, 255, 255]));
        img.put_pixel(1, 2, Rgb([10, 20, 30]));

        let bytes = encode_png(&img).unwrap();
        let decoded = load_image_from_bytes(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(1, 2), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = load_image_from_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DigitizerError::ImageLoad(_)));
    }

    #[test]
    fn test_validate_image_dimensions() {
        assert!(validate_image_dimensions(&RgbImage::new(2, 2)).is_ok());
        assert!(matches!(
            validate_image_dimensions(&RgbImage::new(0, 5)),
            Err(DigitizerError::InvalidImage {
                width: 0,
                height: 5
            })
        ));
    }
}
