use crate::error::OcrError;
use image::DynamicImage;

/// Force the image into 3-channel RGB, whatever the decoded color mode was
/// (grayscale, palette, alpha-containing). Dimensions are preserved.
/// This is the foundation the other steps build on.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, LumaA, Rgba, RgbaImage};

    #[test]
    fn test_normalize_grayscale_to_rgb() {
        let img = GrayImage::from_pixel(10, 10, Luma([77]));
        let result = apply(DynamicImage::ImageLuma8(img)).unwrap();

        assert_eq!(result.color().channel_count(), 3);
        let rgb = result.to_rgb8();
        assert_eq!(rgb.get_pixel(5, 5).0, [77, 77, 77]);
    }

    #[test]
    fn test_normalize_drops_alpha() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 200]));
        let result = apply(DynamicImage::ImageRgba8(img)).unwrap();
        assert_eq!(result.color().channel_count(), 3);
    }

    #[test]
    fn test_normalize_preserves_dimensions() {
        let img = image::ImageBuffer::from_pixel(100, 50, LumaA([128u8, 255]));
        let result = apply(DynamicImage::ImageLumaA8(img)).unwrap();
        assert_eq!(result.width(), 100);
        assert_eq!(result.height(), 50);
    }
}
