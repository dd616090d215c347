use egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

use super::Element;
use super::common::{self, ElementCommon, Transform};
use super::filter::FilterDescriptor;
use crate::id_generator::ObjectId;

/// Raster image object.
///
/// The pixel source is referenced by `src` and never modified; cropping and
/// filters are applied when rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    #[serde(flatten)]
    pub(crate) common: ElementCommon,
    pub src: String,
    pub natural_width: u32,
    pub natural_height: u32,
    /// Offset of the visible window into the source, in source pixels
    pub crop_x: f32,
    pub crop_y: f32,
    /// Extent of the visible window, in source pixels
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub filters: Vec<FilterDescriptor>,
}

impl ImageElement {
    pub fn new(id: ObjectId, src: impl Into<String>, natural_width: u32, natural_height: u32, transform: Transform) -> Self {
        Self {
            common: ElementCommon::new(id, transform),
            src: src.into(),
            natural_width,
            natural_height,
            crop_x: 0.0,
            crop_y: 0.0,
            width: natural_width as f32,
            height: natural_height as f32,
            filters: Vec::new(),
        }
    }

    /// Set the visible window; rejects windows outside the source or below the minimum size
    pub fn set_crop(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<(), String> {
        common::validate_size(vec2(width, height))?;
        let eps = 1e-3;
        if x < -eps
            || y < -eps
            || x + width > self.natural_width as f32 + eps
            || y + height > self.natural_height as f32 + eps
        {
            return Err(format!(
                "Crop window {}x{} at ({}, {}) exceeds source {}x{}",
                width, height, x, y, self.natural_width, self.natural_height
            ));
        }
        self.crop_x = x.max(0.0);
        self.crop_y = y.max(0.0);
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn is_cropped(&self) -> bool {
        self.crop_x != 0.0
            || self.crop_y != 0.0
            || self.width != self.natural_width as f32
            || self.height != self.natural_height as f32
    }

    /// A new object at the same placement with the same filters, showing the whole of `src`
    pub fn with_source(&self, id: ObjectId, src: impl Into<String>, natural_width: u32, natural_height: u32) -> Self {
        let mut next = Self::new(id, src, natural_width, natural_height, self.common.transform);
        next.filters = self.filters.clone();
        next
    }
}

impl Element for ImageElement {
    fn element_type(&self) -> &'static str {
        "image"
    }

    fn common(&self) -> &ElementCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut ElementCommon {
        &mut self.common
    }

    fn size(&self) -> Vec2 {
        vec2(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_window_must_stay_inside_source() {
        let mut image = ImageElement::new(ObjectId(1), "a.png", 800, 600, Transform::default());
        assert!(image.set_crop(0.0, 0.0, 400.0, 600.0).is_ok());
        assert!(image.is_cropped());
        assert!(image.set_crop(500.0, 0.0, 400.0, 600.0).is_err());
        assert!(image.set_crop(0.0, 0.0, 1.0, 600.0).is_err());
    }
}
