//! Image Attachments
//!
//! Prepares a local image file for the gateway: bound to a 1024-unit box,
//! normalized to RGB, JPEG-encoded, base64. Keeps payloads small and the
//! encoding within what the gateway accepts.

use std::io::Cursor;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;

use tinker_core::error::{CoreError, Result};
use tinker_core::message::ContentBlock;

/// Longest edge of an encoded attachment
const MAX_EDGE: u32 = 1024;

/// Encode an image file as a base64 JPEG content block
pub fn encode_image(path: &Path) -> Result<ContentBlock> {
    let img = image::open(path)
        .map_err(|e| CoreError::Other(format!("Error encoding image: {}", e)))?;

    let bytes = encode_jpeg(img)?;

    Ok(ContentBlock::Image {
        media_type: "image/jpeg".into(),
        data: STANDARD.encode(bytes),
    })
}

fn encode_jpeg(img: DynamicImage) -> Result<Vec<u8>> {
    // Downscale only; small images keep their native size.
    let img = if img.width() > MAX_EDGE || img.height() > MAX_EDGE {
        img.thumbnail(MAX_EDGE, MAX_EDGE)
    } else {
        img
    };

    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buffer = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Jpeg)
        .map_err(|e| CoreError::Other(format!("Error encoding image: {}", e)))?;

    Ok(buffer)
}
