//! Inline image codec: decode, downscale, re-encode one photo.
//!
//! Photos travel as `data:image/...;base64,` URLs. Anything that does not
//! look like one passes through untouched; a payload that looks right but
//! fails to decode is a [`CodecError`] the export coordinator recovers
//! from by keeping the original.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView as _;

use crate::error::CodecError;

/// Recompress one inline photo.
///
/// If the decoded image is wider than `max_width`, both dimensions scale
/// down with the aspect ratio preserved (height recomputed from the width
/// ratio and rounded). The result is always re-encoded as JPEG at
/// `quality` in (0, 1], so output bytes are not guaranteed identical
/// across codec versions; only dimensions and content are.
pub fn recompress(photo: &str, max_width: u32, quality: f32) -> Result<String, CodecError> {
    let Some(payload) = inline_image_payload(photo) else {
        // Not recognizable inline image data: contract says no-op.
        return Ok(photo.to_string());
    };

    let bytes = BASE64.decode(payload)?;
    let decoded = image::load_from_memory(&bytes)?;

    let (width, height) = (decoded.width(), decoded.height());
    let resized = if width > max_width {
        let ratio = f64::from(max_width) / f64::from(width);
        let new_height = (f64::from(height) * ratio).round().max(1.0) as u32;
        decoded.resize_exact(max_width, new_height, FilterType::Lanczos3)
    } else {
        decoded
    };

    // JPEG has no alpha channel; flatten before encoding.
    let rgb = resized.to_rgb8();
    let jpeg_quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, jpeg_quality).encode_image(&rgb)?;

    Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&encoded)))
}

/// Extract the base64 payload of an inline image, if the value is one.
fn inline_image_payload(value: &str) -> Option<&str> {
    let rest = value.strip_prefix("data:image/")?;
    let (_, payload) = rest.split_once(";base64,")?;
    Some(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView as _, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_data_url(width: u32, height: u32) -> String {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", BASE64.encode(&bytes))
    }

    fn decode_data_url(url: &str) -> DynamicImage {
        let payload = inline_image_payload(url).unwrap();
        image::load_from_memory(&BASE64.decode(payload).unwrap()).unwrap()
    }

    #[test]
    fn downscales_wide_images_preserving_aspect() {
        let output = recompress(&png_data_url(400, 200), 100, 0.7).unwrap();
        assert!(output.starts_with("data:image/jpeg;base64,"));

        let decoded = decode_data_url(&output);
        assert_eq!(decoded.width(), 100);
        assert_eq!(decoded.height(), 50);
    }

    #[test]
    fn narrow_images_keep_their_dimensions() {
        let output = recompress(&png_data_url(80, 60), 1920, 0.7).unwrap();
        let decoded = decode_data_url(&output);
        assert_eq!((decoded.width(), decoded.height()), (80, 60));
    }

    #[test]
    fn odd_ratios_round_the_height() {
        // 301 wide scaled to 100 makes the height 199 * (100/301) = 66.1...
        let output = recompress(&png_data_url(301, 199), 100, 0.7).unwrap();
        let decoded = decode_data_url(&output);
        assert_eq!(decoded.width(), 100);
        assert_eq!(decoded.height(), 66);
    }

    #[test]
    fn non_image_values_pass_through_unchanged() {
        assert_eq!(recompress("just a caption", 100, 0.7).unwrap(), "just a caption");
        assert_eq!(
            recompress("data:text/plain;base64,aGk=", 100, 0.7).unwrap(),
            "data:text/plain;base64,aGk="
        );
        assert_eq!(recompress("", 100, 0.7).unwrap(), "");
    }

    #[test]
    fn corrupt_payloads_are_codec_errors() {
        assert!(matches!(
            recompress("data:image/png;base64,!!!not-base64!!!", 100, 0.7),
            Err(CodecError::Base64(_))
        ));
        // Valid base64, but not an image.
        let bogus = format!("data:image/png;base64,{}", BASE64.encode(b"hello"));
        assert!(matches!(
            recompress(&bogus, 100, 0.7),
            Err(CodecError::Image(_))
        ));
    }
}
