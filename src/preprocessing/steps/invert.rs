use crate::error::OcrError;
use image::DynamicImage;

/// Photometric negative: every channel value v becomes 255 - v.
/// Used when the source is light text on a dark background, since both the
/// binarizer and the engine assume dark text on light.
pub fn apply(image: DynamicImage) -> Result<DynamicImage, OcrError> {
    let mut img = image;
    img.invert();
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_invert_complements_channels() {
        let img = RgbImage::from_pixel(5, 5, Rgb([10, 100, 250]));
        let result = apply(DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(result.to_rgb8().get_pixel(0, 0).0, [245, 155, 5]);
    }

    #[test]
    fn test_invert_twice_is_identity() {
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([x as u8 * 30, y as u8 * 30, 128]));
        let original = img.clone();

        let once = apply(DynamicImage::ImageRgb8(img)).unwrap();
        let twice = apply(once).unwrap();

        assert_eq!(twice.to_rgb8(), original);
    }
}
