//! PNG signature payload decoding.
//!
//! The capture side hands over a PNG (drawn, typed-then-rasterized or
//! uploaded); this module normalizes it to 8-bit samples with the alpha
//! plane split off, ready for XObject embedding. Palette images are
//! expanded and 16-bit channels are stripped to 8 bits during decoding.

use crate::error::{PdfError, Result};

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Color model of the decoded samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    /// One byte per pixel
    Gray,
    /// Three bytes per pixel
    Rgb,
}

impl ColorModel {
    /// Matching PDF color space name.
    pub const fn pdf_color_space(self) -> &'static str {
        match self {
            Self::Gray => "DeviceGray",
            Self::Rgb => "DeviceRGB",
        }
    }

    const fn components(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
        }
    }
}

/// A decoded raster image: 8-bit color samples plus an optional alpha
/// plane, one byte per pixel.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub color: ColorModel,
    pub samples: Vec<u8>,
    pub alpha: Option<Vec<u8>>,
}

/// Decode a PNG payload.
///
/// Fails with `UnsupportedImageFormat` when the payload is not PNG at all,
/// and `InvalidImageData` when it claims to be PNG but cannot be decoded.
pub fn decode_png(data: &[u8]) -> Result<RasterImage> {
    if data.is_empty() {
        return Err(PdfError::InvalidImageData("empty image payload".into()));
    }
    if data.len() < PNG_MAGIC.len() || data[..PNG_MAGIC.len()] != PNG_MAGIC {
        return Err(PdfError::UnsupportedImageFormat(
            "payload is not a PNG image".into(),
        ));
    }

    let mut decoder = png::Decoder::new(std::io::Cursor::new(data));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);

    let mut reader = decoder
        .read_info()
        .map_err(|e| PdfError::InvalidImageData(format!("png header: {}", e)))?;
    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| PdfError::InvalidImageData("png output size overflow".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| PdfError::InvalidImageData(format!("png frame: {}", e)))?;
    buf.truncate(info.buffer_size());

    let width = info.width;
    let height = info.height;
    if width == 0 || height == 0 {
        return Err(PdfError::InvalidImageData("zero-sized image".into()));
    }

    let (color, samples, alpha) = match info.color_type {
        png::ColorType::Grayscale => (ColorModel::Gray, buf, None),
        png::ColorType::Rgb => (ColorModel::Rgb, buf, None),
        png::ColorType::GrayscaleAlpha => {
            let (samples, alpha) = split_alpha(&buf, 1);
            (ColorModel::Gray, samples, Some(alpha))
        }
        png::ColorType::Rgba => {
            let (samples, alpha) = split_alpha(&buf, 3);
            (ColorModel::Rgb, samples, Some(alpha))
        }
        // EXPAND converts indexed images before we get here
        png::ColorType::Indexed => {
            return Err(PdfError::InvalidImageData(
                "indexed PNG was not expanded".into(),
            ));
        }
    };

    let expected = width as usize * height as usize * color.components();
    if samples.len() != expected {
        return Err(PdfError::InvalidImageData(format!(
            "sample count mismatch: got {}, expected {}",
            samples.len(),
            expected
        )));
    }

    // A fully opaque alpha plane adds nothing; drop it so the embedder
    // skips the soft mask.
    let alpha = alpha.filter(|plane| plane.iter().any(|&a| a != 0xFF));

    Ok(RasterImage {
        width,
        height,
        color,
        samples,
        alpha,
    })
}

/// Split interleaved color+alpha samples into separate planes.
fn split_alpha(data: &[u8], color_components: usize) -> (Vec<u8>, Vec<u8>) {
    let stride = color_components + 1;
    let pixels = data.len() / stride;
    let mut samples = Vec::with_capacity(pixels * color_components);
    let mut alpha = Vec::with_capacity(pixels);

    for chunk in data.chunks_exact(stride) {
        samples.extend_from_slice(&chunk[..color_components]);
        alpha.push(chunk[color_components]);
    }

    (samples, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(width: u32, height: u32, color: png::ColorType, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, width, height);
            encoder.set_color(color);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(data).unwrap();
        }
        out
    }

    #[test]
    fn test_empty_payload_is_invalid_data() {
        let err = decode_png(&[]).unwrap_err();
        assert!(matches!(err, PdfError::InvalidImageData(_)));
    }

    #[test]
    fn test_non_png_is_unsupported_format() {
        let err = decode_png(b"GIF89a not a png").unwrap_err();
        assert!(matches!(err, PdfError::UnsupportedImageFormat(_)));
    }

    #[test]
    fn test_truncated_png_is_invalid_data() {
        let full = encode_png(2, 2, png::ColorType::Rgb, &[0u8; 12]);
        let err = decode_png(&full[..20]).unwrap_err();
        assert!(matches!(err, PdfError::InvalidImageData(_)));
    }

    #[test]
    fn test_rgb_decodes_without_alpha() {
        let data = encode_png(2, 1, png::ColorType::Rgb, &[255, 0, 0, 0, 255, 0]);
        let img = decode_png(&data).unwrap();
        assert_eq!((img.width, img.height), (2, 1));
        assert_eq!(img.color, ColorModel::Rgb);
        assert_eq!(img.samples, vec![255, 0, 0, 0, 255, 0]);
        assert!(img.alpha.is_none());
    }

    #[test]
    fn test_rgba_splits_alpha_plane() {
        let data = encode_png(
            2,
            1,
            png::ColorType::Rgba,
            &[10, 20, 30, 128, 40, 50, 60, 255],
        );
        let img = decode_png(&data).unwrap();
        assert_eq!(img.color, ColorModel::Rgb);
        assert_eq!(img.samples, vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(img.alpha, Some(vec![128, 255]));
    }

    #[test]
    fn test_fully_opaque_alpha_is_dropped() {
        let data = encode_png(1, 1, png::ColorType::Rgba, &[1, 2, 3, 255]);
        let img = decode_png(&data).unwrap();
        assert!(img.alpha.is_none());
    }

    #[test]
    fn test_grayscale_alpha() {
        let data = encode_png(2, 1, png::ColorType::GrayscaleAlpha, &[7, 0, 9, 200]);
        let img = decode_png(&data).unwrap();
        assert_eq!(img.color, ColorModel::Gray);
        assert_eq!(img.samples, vec![7, 9]);
        assert_eq!(img.alpha, Some(vec![0, 200]));
    }
}
