use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Webp => "image/webp",
        }
    }
}

/// A format plus the quality it is encoded at (0..=1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExportPreset {
    pub label: &'static str,
    pub format: ExportFormat,
    pub quality: f32,
}

pub const EXPORT_PRESETS: [ExportPreset; 4] = [
    ExportPreset {
        label: "PNG",
        format: ExportFormat::Png,
        quality: 1.0,
    },
    ExportPreset {
        label: "JPEG (High)",
        format: ExportFormat::Jpeg,
        quality: 0.9,
    },
    ExportPreset {
        label: "JPEG (Medium)",
        format: ExportFormat::Jpeg,
        quality: 0.8,
    },
    // Encoded lossless; the quality is kept for display
    ExportPreset {
        label: "WEBP",
        format: ExportFormat::Webp,
        quality: 0.9,
    },
];

impl ExportPreset {
    pub fn find(label: &str) -> Option<ExportPreset> {
        EXPORT_PRESETS
            .iter()
            .find(|p| p.label.eq_ignore_ascii_case(label))
            .copied()
    }

    pub fn for_format(format: ExportFormat) -> ExportPreset {
        EXPORT_PRESETS
            .iter()
            .find(|p| p.format == format)
            .copied()
            .unwrap_or(EXPORT_PRESETS[0])
    }
}

/// An encoded export ready to hand to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImage {
    pub file_name: String,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

/// JPEG has no alpha, so transparent areas are flattened onto white
fn flatten_on_white(image: &RgbaImage) -> RgbaImage {
    let mut flat = RgbaImage::from_pixel(image.width(), image.height(), Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut flat, image, 0, 0);
    flat
}

pub fn encode(image: &RgbaImage, preset: &ExportPreset) -> EditorResult<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    let (width, height) = image.dimensions();
    let result = match preset.format {
        ExportFormat::Png => PngEncoder::new(&mut bytes).write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8),
        ExportFormat::Jpeg => {
            let quality = (preset.quality.clamp(0.01, 1.0) * 100.0).round() as u8;
            let rgb = DynamicImage::ImageRgba8(flatten_on_white(image)).to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, quality).write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
        ExportFormat::Webp => {
            WebPEncoder::new_lossless(&mut bytes).write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
        }
    };
    result.map_err(|e| EditorError::Encode(e.to_string()))?;
    Ok(bytes.into_inner())
}
