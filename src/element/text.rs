use egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

use super::Element;
use super::common::{ElementCommon, Transform};
use crate::id_generator::ObjectId;

/// Line height multiplier used to size text boxes
pub const LINE_HEIGHT: f32 = 1.16;
/// Average glyph advance relative to font size, for sizing without font metrics
const AVERAGE_ADVANCE: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Editable text object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    #[serde(flatten)]
    pub(crate) common: ElementCommon,
    pub content: String,
    pub font_family: String,
    pub font_size: f32,
    pub fill: String,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    /// Widest painted line as laid out with a registered font
    #[serde(skip)]
    pub(crate) measured_width: Option<f32>,
}

impl TextElement {
    pub fn new(id: ObjectId, content: impl Into<String>, font_family: impl Into<String>, font_size: f32, fill: impl Into<String>, transform: Transform) -> Self {
        Self {
            common: ElementCommon::new(id, transform),
            content: content.into(),
            font_family: font_family.into(),
            font_size,
            fill: fill.into(),
            align: TextAlign::Left,
            bold: false,
            italic: false,
            underline: false,
            measured_width: None,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }
}

impl Element for TextElement {
    fn element_type(&self) -> &'static str {
        "text"
    }

    fn common(&self) -> &ElementCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut ElementCommon {
        &mut self.common
    }

    fn size(&self) -> Vec2 {
        let width = self.measured_width.unwrap_or_else(|| {
            let longest = self.lines().map(|l| l.chars().count()).max().unwrap_or(0).max(1);
            longest as f32 * self.font_size * AVERAGE_ADVANCE
        });
        let line_count = self.lines().count().max(1);
        vec2(width, line_count as f32 * self.font_size * LINE_HEIGHT)
    }
}
