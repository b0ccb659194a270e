//! Translation of an inbound request into the upstream content sequence.
//!
//! The sequence always starts with the prompt text, followed by one element
//! per image in input order.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use thiserror::Error;

/// Errors raised while decoding caller-supplied images.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Image {index} is not valid base64: {source}")]
    Base64 {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("Image {index} could not be decoded: {source}")]
    Image {
        index: usize,
        #[source]
        source: image::ImageError,
    },
}

/// Formats the generative API accepts as inline data.
const FORWARDED_FORMATS: [ImageFormat; 3] = [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP];

/// An image that decoded successfully, in a format the upstream accepts.
///
/// PNG, JPEG and WebP keep the caller's bytes. Anything else is re-encoded
/// to PNG from the decoded pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    /// Decode raw image bytes, detecting the format from the content.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, image::ImageError> {
        let format = image::guess_format(&bytes)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        let (width, height) = (decoded.width(), decoded.height());

        if FORWARDED_FORMATS.contains(&format) {
            return Ok(Self {
                format,
                width,
                height,
                bytes,
            });
        }

        let mut png = Cursor::new(Vec::new());
        decoded.write_to(&mut png, ImageFormat::Png)?;
        Ok(Self {
            format: ImageFormat::Png,
            width,
            height,
            bytes: png.into_inner(),
        })
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Base64 form of the bytes sent upstream.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One element of the content sequence sent upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Image(DecodedImage),
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

/// Decode one base64 image entry. ASCII whitespace anywhere in the input is
/// ignored, so line-wrapped encodings are accepted.
pub fn decode_image(index: usize, encoded: &str) -> Result<DecodedImage, ContentError> {
    let compact: Vec<u8> = encoded
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|source| ContentError::Base64 { index, source })?;
    DecodedImage::from_bytes(bytes).map_err(|source| ContentError::Image { index, source })
}

/// Build the ordered content sequence: prompt first, then every image.
///
/// Fails on the first image that does not decode; no partial sequence is
/// returned.
pub fn build_contents(prompt: &str, images: &[String]) -> Result<Vec<Content>, ContentError> {
    let mut contents = Vec::with_capacity(images.len() + 1);
    contents.push(Content::Text(prompt.to_string()));
    for (index, encoded) in images.iter().enumerate() {
        contents.push(Content::Image(decode_image(index, encoded)?));
    }
    Ok(contents)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    /// Encode a solid-color image of the given size and format as base64.
    pub(crate) fn encoded_image(width: u32, height: u32, format: ImageFormat) -> String {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb([200u8, 40, 90]));
        let mut bytes = Cursor::new(Vec::new());
        buffer.write_to(&mut bytes, format).unwrap();
        STANDARD.encode(bytes.into_inner())
    }

    #[test]
    fn test_prompt_only() {
        let contents = build_contents("hello", &[]).unwrap();
        assert_eq!(contents, vec![Content::from("hello")]);
    }

    #[test]
    fn test_images_follow_prompt_in_order() {
        let first = encoded_image(2, 3, ImageFormat::Png);
        let second = encoded_image(5, 1, ImageFormat::Jpeg);

        let contents = build_contents("describe", &[first.clone(), second.clone()]).unwrap();

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0], Content::from("describe"));
        match (&contents[1], &contents[2]) {
            (Content::Image(a), Content::Image(b)) => {
                assert_eq!((a.format, a.width, a.height), (ImageFormat::Png, 2, 3));
                assert_eq!((b.format, b.width, b.height), (ImageFormat::Jpeg, 5, 1));
                assert_eq!(a.to_base64(), first);
                assert_eq!(b.mime_type(), "image/jpeg");
            }
            other => panic!("expected two images, got {other:?}"),
        }
    }

    #[test]
    fn test_line_wrapped_base64() {
        let encoded = encoded_image(12, 12, ImageFormat::Png);
        let wrapped = encoded
            .as_bytes()
            .chunks(16)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(wrapped.contains('\n'));

        let image = decode_image(0, &format!("{wrapped}\n")).unwrap();
        assert_eq!((image.format, image.width, image.height), (ImageFormat::Png, 12, 12));
        assert_eq!(image.to_base64(), encoded);
    }

    #[test]
    fn test_unsupported_format_reencoded_as_png() {
        let image = decode_image(0, &encoded_image(7, 5, ImageFormat::Bmp)).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.mime_type(), "image/png");
        assert_eq!((image.width, image.height), (7, 5));
        assert_eq!(image::guess_format(&image.bytes).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_invalid_base64() {
        let err = build_contents("x", &["not base64!!".to_string()]).unwrap_err();
        assert!(matches!(err, ContentError::Base64 { index: 0, .. }));
        assert!(err.to_string().starts_with("Image 0 is not valid base64"));
    }

    #[test]
    fn test_valid_base64_but_not_an_image() {
        let good = encoded_image(1, 1, ImageFormat::Png);
        let junk = STANDARD.encode(b"definitely not pixels");
        let err = build_contents("x", &[good, junk]).unwrap_err();
        assert!(matches!(err, ContentError::Image { index: 1, .. }));
    }

    #[test]
    fn test_truncated_image() {
        let full = STANDARD
            .decode(encoded_image(16, 16, ImageFormat::Png))
            .unwrap();
        let truncated = STANDARD.encode(&full[..full.len() / 2]);
        assert!(decode_image(0, &truncated).is_err());
    }
}
