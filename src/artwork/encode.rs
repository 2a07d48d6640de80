use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ColorType, DynamicImage, RgbImage};

/// Spotify rejects cover uploads whose base64 body exceeds 256 KB.
pub const MAX_UPLOAD_BASE64_LEN: usize = 256 * 1024;

const QUALITY_STEPS: [u8; 5] = [90, 80, 70, 60, 50];
const MIN_DIMENSION: u32 = 64;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("jpeg encoding failed: {0}")]
    Jpeg(#[from] image::ImageError),
    #[error("artwork does not fit in {limit} base64 bytes, gave up at {width}x{height}")]
    TooLarge { limit: usize, width: u32, height: u32 },
}

/// Re-encodes `image` as an opaque RGB JPEG whose base64 form fits in
/// `max_base64_len`, lowering quality first and then halving the dimensions.
pub fn encode_jpeg(image: &DynamicImage, max_base64_len: usize) -> Result<Vec<u8>, EncodeError> {
    let mut rgb = image.to_rgb8();

    loop {
        for quality in QUALITY_STEPS {
            let bytes = encode_rgb(&rgb, quality)?;
            if base64_len(bytes.len()) <= max_base64_len {
                log::debug!(
                    "encoded artwork {}x{} at quality {} ({} bytes)",
                    rgb.width(),
                    rgb.height(),
                    quality,
                    bytes.len()
                );
                return Ok(bytes);
            }
        }

        let (width, height) = rgb.dimensions();
        if width.max(height) / 2 < MIN_DIMENSION {
            return Err(EncodeError::TooLarge {
                limit: max_base64_len,
                width,
                height,
            });
        }
        rgb = image::imageops::resize(
            &rgb,
            (width / 2).max(1),
            (height / 2).max(1),
            FilterType::Lanczos3,
        );
    }
}

fn encode_rgb(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;
    Ok(bytes)
}

fn base64_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn textured(size: u32) -> DynamicImage {
        let img = RgbaImage::from_fn(size, size, |x, y| {
            Rgba([
                ((x * 7 + y * 13) % 256) as u8,
                ((x * y) % 256) as u8,
                ((x ^ y) % 256) as u8,
                128,
            ])
        });
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn drops_alpha_and_writes_jpeg() {
        let bytes = encode_jpeg(&textured(64), MAX_UPLOAD_BASE64_LEN).unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }

    #[test]
    fn shrinks_until_it_fits() {
        let image = textured(512);
        let full_size = encode_rgb(&image.to_rgb8(), 50).unwrap();
        let limit = base64_len(full_size.len()) - 1;

        let bytes = encode_jpeg(&image, limit).unwrap();

        assert!(base64_len(bytes.len()) <= limit);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(decoded.width() < 512);
    }

    #[test]
    fn gives_up_on_impossible_limit() {
        let err = encode_jpeg(&textured(256), 16).unwrap_err();

        match err {
            EncodeError::TooLarge { width, height, .. } => {
                assert_eq!((width, height), (64, 64));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn base64_length_rounds_up() {
        assert_eq!(base64_len(0), 0);
        assert_eq!(base64_len(1), 4);
        assert_eq!(base64_len(3), 4);
        assert_eq!(base64_len(4), 8);
    }
}
