use crate::error::OcrError;
use image::{DynamicImage, GrayImage, Luma};

/// Global-threshold binarization.
///
/// Converts to single-channel intensity using the `image` crate's luma
/// mapping (ITU-R BT.601 weights via `to_luma8`), then maps every pixel with
/// intensity strictly greater than `threshold` to white (255) and everything
/// else, including intensity exactly equal to the threshold, to black (0).
/// The strict inequality is user-visible through the threshold slider and
/// must not change: at threshold 0 only intensity-0 pixels stay black.
pub fn apply(image: DynamicImage, threshold: u8) -> Result<DynamicImage, OcrError> {
    let gray = image.to_luma8();
    let binarized = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });
    Ok(DynamicImage::ImageLuma8(binarized))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binarize_output_is_two_valued() {
        let img = GrayImage::from_fn(50, 50, |x, _| Luma([(x as u8).wrapping_mul(5)]));

        for threshold in [0u8, 1, 127, 128, 254, 255] {
            let result = apply(DynamicImage::ImageLuma8(img.clone()), threshold).unwrap();
            for pixel in result.to_luma8().pixels() {
                assert!(
                    pixel.0[0] == 0 || pixel.0[0] == 255,
                    "Expected binary pixel at threshold {}, got {}",
                    threshold,
                    pixel.0[0]
                );
            }
        }
    }

    #[test]
    fn test_binarize_boundary_maps_to_black() {
        // A pixel exactly at the threshold goes black, not white
        let img = GrayImage::from_pixel(3, 3, Luma([128]));
        let result = apply(DynamicImage::ImageLuma8(img), 128).unwrap();
        assert_eq!(result.to_luma8().get_pixel(1, 1).0[0], 0);

        let img = GrayImage::from_pixel(3, 3, Luma([129]));
        let result = apply(DynamicImage::ImageLuma8(img), 128).unwrap();
        assert_eq!(result.to_luma8().get_pixel(1, 1).0[0], 255);
    }

    #[test]
    fn test_binarize_threshold_zero_keeps_only_pure_black() {
        let mut img = GrayImage::from_pixel(4, 1, Luma([1]));
        img.put_pixel(0, 0, Luma([0]));

        let result = apply(DynamicImage::ImageLuma8(img), 0).unwrap();
        let gray = result.to_luma8();
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
        assert_eq!(gray.get_pixel(1, 0).0[0], 255);
        assert_eq!(gray.get_pixel(2, 0).0[0], 255);
    }

    #[test]
    fn test_binarize_handles_text_pattern() {
        // Dark text on light background survives thresholding
        let mut img = GrayImage::from_pixel(50, 20, Luma([240]));
        for x in 10..40 {
            img.put_pixel(x, 10, Luma([20]));
        }

        let result = apply(DynamicImage::ImageLuma8(img), 128).unwrap();
        let gray = result.to_luma8();

        assert_eq!(gray.get_pixel(25, 10).0[0], 0);
        assert_eq!(gray.get_pixel(25, 5).0[0], 255);
    }

    #[test]
    fn test_binarize_preserves_dimensions() {
        let img = GrayImage::new(37, 13);
        let result = apply(DynamicImage::ImageLuma8(img), 128).unwrap();
        assert_eq!(result.width(), 37);
        assert_eq!(result.height(), 13);
    }
}
