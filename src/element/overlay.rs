use egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

use super::Element;
use super::common::{self, ElementCommon, Transform};
use crate::id_generator::ObjectId;

/// Rectangle primitive, also used for tool overlays such as the crop frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayRect {
    #[serde(flatten)]
    pub(crate) common: ElementCommon,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub stroke: Option<String>,
    #[serde(default)]
    pub stroke_width: f32,
    #[serde(default)]
    pub dashed: bool,
}

impl OverlayRect {
    pub fn new(id: ObjectId, width: f32, height: f32, transform: Transform) -> Self {
        Self {
            common: ElementCommon::new(id, transform),
            width,
            height,
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            dashed: false,
        }
    }

    pub fn set_size(&mut self, width: f32, height: f32) -> Result<(), String> {
        common::validate_size(vec2(width, height))?;
        self.width = width;
        self.height = height;
        Ok(())
    }
}

impl Element for OverlayRect {
    fn element_type(&self) -> &'static str {
        "overlay"
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
