use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::constants::PHOTO_JPEG_QUALITY;
use crate::error::ImageError;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// A photo re-encoded as a self-contained `data:` URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

impl InlineImage {
    /// Raw JPEG bytes carried by the data URI.
    pub fn jpeg_bytes(&self) -> Option<Vec<u8>> {
        let payload = self.data_url.strip_prefix(DATA_URL_PREFIX)?;
        STANDARD.decode(payload).ok()
    }
}

/// Target size for an image whose larger side must not exceed `max`.
///
/// Both axes share one scale factor; the smaller side is rounded and never
/// drops below one pixel.
pub fn scaled_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    let max = max.max(1);
    let larger = width.max(height);
    if larger <= max {
        return (width, height);
    }

    let scale = f64::from(max) / f64::from(larger);
    let shrink = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max);

    if width >= height {
        (max, shrink(height))
    } else {
        (shrink(width), max)
    }
}

/// Decode `bytes`, bound the larger side to `max_dimension` and re-encode as
/// JPEG.
pub fn encode(bytes: &[u8], max_dimension: u32) -> Result<InlineImage, ImageError> {
    let img = image::load_from_memory(bytes).map_err(ImageError::Decode)?;
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(ImageError::Empty);
    }

    let (target_w, target_h) = scaled_dimensions(width, height, max_dimension);
    let img = if (target_w, target_h) != (width, height) {
        img.resize_exact(target_w, target_h, FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, PHOTO_JPEG_QUALITY))
        .map_err(ImageError::Encode)?;

    tracing::debug!(
        source_width = width,
        source_height = height,
        width = target_w,
        height = target_h,
        bytes = jpeg.len(),
        "photo re-encoded"
    );

    Ok(InlineImage {
        data_url: format!("{DATA_URL_PREFIX}{}", STANDARD.encode(&jpeg)),
        width: target_w,
        height: target_h,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        use image::{ImageBuffer, Rgba};
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_fn(width, height, |x, _| Rgba([(x % 255) as u8, 40, 200, 128]));
        let mut buf = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buf);
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        buf
    }

    fn decoded_size(inline: &InlineImage) -> (u32, u32) {
        let bytes = inline.jpeg_bytes().expect("jpeg payload");
        let img = image::load_from_memory(&bytes).unwrap();
        (img.width(), img.height())
    }

    #[test]
    fn test_landscape_scaled_to_bound() {
        let inline = encode(&png(400, 200), 100).unwrap();
        assert_eq!((inline.width, inline.height), (100, 50));
        assert_eq!(decoded_size(&inline), (100, 50));
        assert!(inline.data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_portrait_scaled_to_bound() {
        let inline = encode(&png(90, 301), 150).unwrap();
        assert_eq!(decoded_size(&inline), (45, 150));
    }

    #[test]
    fn test_small_image_keeps_dimensions() {
        let inline = encode(&png(64, 48), 1500).unwrap();
        assert_eq!(decoded_size(&inline), (64, 48));
    }

    #[test]
    fn test_scaled_dimensions_bound_and_aspect() {
        for &(w, h, max) in &[(3000, 1500, 1500), (1000, 3001, 1500), (7, 5000, 100), (1500, 1500, 1500)] {
            let (tw, th) = scaled_dimensions(w, h, max);
            assert_eq!(tw.max(th), w.max(h).min(max));
            let expected = f64::from(w) / f64::from(h) * f64::from(th);
            assert!((f64::from(tw) - expected).abs() <= 1.0 || tw == 1);
        }
    }

    #[test]
    fn test_corrupt_bytes_fail_decode() {
        let res = encode(b"definitely not an image", 1500);
        assert!(matches!(res, Err(ImageError::Decode(_))));
    }
}
