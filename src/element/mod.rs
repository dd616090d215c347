use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

mod common;
pub mod filter;
pub(crate) mod image;
pub(crate) mod overlay;
pub(crate) mod text;

pub use common::{
    ElementCommon, Interactivity, MIN_ELEMENT_SIZE, ObjectRole, OriginX, OriginY, Transform, parse_hex_color,
};
pub use filter::{FilterDescriptor, FilterKind};
pub use image::ImageElement;
pub use overlay::OverlayRect;
pub use text::{TextAlign, TextElement};

use crate::id_generator::ObjectId;

/// Common trait that all scene objects implement
pub trait Element {
    /// Get the element type as a string
    fn element_type(&self) -> &'static str;

    fn common(&self) -> &ElementCommon;

    fn common_mut(&mut self) -> &mut ElementCommon;

    /// Unscaled size of the object's local box
    fn size(&self) -> Vec2;

    /// Get the unique identifier for this element
    fn id(&self) -> ObjectId {
        self.common().id
    }

    fn transform(&self) -> &Transform {
        &self.common().transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.common_mut().transform
    }

    fn interactivity(&self) -> Interactivity {
        self.common().interactivity
    }

    fn role(&self) -> ObjectRole {
        self.common().role
    }

    /// Bounding rectangle in document space
    fn rect(&self) -> Rect {
        self.transform().bounding_rect(self.size())
    }

    /// Test if the element contains the given document position
    fn hit_test(&self, pos: Pos2) -> bool {
        self.transform().contains(self.size(), pos)
    }

    /// Translate the element by the given delta
    fn translate(&mut self, delta: Vec2) {
        let transform = self.transform_mut();
        transform.left += delta.x;
        transform.top += delta.y;
    }
}

/// Enumeration of all object variants a scene can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementType {
    Image(ImageElement),
    Text(TextElement),
    Overlay(OverlayRect),
}

impl Element for ElementType {
    fn element_type(&self) -> &'static str {
        match self {
            ElementType::Image(i) => i.element_type(),
            ElementType::Text(t) => t.element_type(),
            ElementType::Overlay(o) => o.element_type(),
        }
    }

    fn common(&self) -> &ElementCommon {
        match self {
            ElementType::Image(i) => i.common(),
            ElementType::Text(t) => t.common(),
            ElementType::Overlay(o) => o.common(),
        }
    }

    fn common_mut(&mut self) -> &mut ElementCommon {
        match self {
            ElementType::Image(i) => i.common_mut(),
            ElementType::Text(t) => t.common_mut(),
            ElementType::Overlay(o) => o.common_mut(),
        }
    }

    fn size(&self) -> Vec2 {
        match self {
            ElementType::Image(i) => i.size(),
            ElementType::Text(t) => t.size(),
            ElementType::Overlay(o) => o.size(),
        }
    }
}

impl ElementType {
    pub fn as_image(&self) -> Option<&ImageElement> {
        match self {
            ElementType::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageElement> {
        match self {
            ElementType::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextElement> {
        match self {
            ElementType::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextElement> {
        match self {
            ElementType::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_overlay(&self) -> Option<&OverlayRect> {
        match self {
            ElementType::Overlay(rect) => Some(rect),
            _ => None,
        }
    }

    pub fn as_overlay_mut(&mut self) -> Option<&mut OverlayRect> {
        match self {
            ElementType::Overlay(rect) => Some(rect),
            _ => None,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.role().is_transient()
    }
}

/// Which variant an object is, for queries that don't need the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Image,
    Text,
    Overlay,
    /// Any object carrying the given role, regardless of variant
    Role(ObjectRole),
}

impl ObjectKind {
    pub fn matches(self, element: &ElementType) -> bool {
        match (self, element) {
            (ObjectKind::Image, ElementType::Image(_)) => true,
            (ObjectKind::Text, ElementType::Text(_)) => true,
            (ObjectKind::Overlay, ElementType::Overlay(_)) => true,
            (ObjectKind::Role(role), element) => element.role() == role,
            _ => false,
        }
    }
}

/// Factory functions for creating elements
pub mod factory {
    use super::*;
    use crate::id_generator::generate_id;

    /// Create a new image element showing the whole source
    pub fn create_image(src: impl Into<String>, natural_width: u32, natural_height: u32, transform: Transform) -> ElementType {
        ElementType::Image(ImageElement::new(generate_id(), src, natural_width, natural_height, transform))
    }

    /// Create an image centered on a `doc_width` x `doc_height` document and
    /// scaled to fit it. The relatively wider side decides the scale.
    pub fn create_fitted_image(src: impl Into<String>, natural_width: u32, natural_height: u32, doc_width: u32, doc_height: u32) -> ElementType {
        let (w, h) = (natural_width.max(1) as f32, natural_height.max(1) as f32);
        let (dw, dh) = (doc_width as f32, doc_height as f32);
        let scale = if w / h > dw / dh { dw / w } else { dh / h };
        let center = egui::pos2(dw / 2.0, dh / 2.0);
        create_image(src, natural_width, natural_height, Transform::centered(center, scale))
    }

    /// Create a new text element
    pub fn create_text(content: impl Into<String>, font_family: impl Into<String>, font_size: f32, fill: impl Into<String>, transform: Transform) -> ElementType {
        ElementType::Text(TextElement::new(generate_id(), content, font_family, font_size, fill, transform))
    }

    /// Create a plain rectangle
    pub fn create_rect(width: f32, height: f32, transform: Transform) -> ElementType {
        ElementType::Overlay(OverlayRect::new(generate_id(), width, height, transform))
    }

    /// Create the dashed frame the crop tool drags around
    pub fn create_crop_frame(rect: Rect) -> ElementType {
        let mut frame = OverlayRect::new(generate_id(), rect.width(), rect.height(), Transform::at(rect.min.x, rect.min.y));
        frame.stroke = Some("#00bcd4".to_owned());
        frame.stroke_width = 2.0;
        frame.dashed = true;
        frame.common.role = ObjectRole::CropOverlay;
        ElementType::Overlay(frame)
    }
}
