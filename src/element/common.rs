use egui::{Pos2, Rect, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

use crate::id_generator::ObjectId;

// Common constants for all element types
pub const MIN_ELEMENT_SIZE: f32 = 2.0;

/// Horizontal anchor of an object's position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchor of an object's position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

impl OriginX {
    pub fn factor(self) -> f32 {
        match self {
            OriginX::Left => 0.0,
            OriginX::Center => 0.5,
            OriginX::Right => 1.0,
        }
    }
}

impl OriginY {
    pub fn factor(self) -> f32 {
        match self {
            OriginY::Top => 0.0,
            OriginY::Center => 0.5,
            OriginY::Bottom => 1.0,
        }
    }
}

/// Placement of an object in document space.
///
/// `left`/`top` is where the origin point lands; scaling and rotation
/// (degrees, clockwise) happen around that point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub left: f32,
    pub top: f32,
    #[serde(default)]
    pub origin_x: OriginX,
    #[serde(default)]
    pub origin_y: OriginY,
    pub scale_x: f32,
    pub scale_y: f32,
    #[serde(default)]
    pub angle: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
        }
    }
}

impl Transform {
    pub fn at(left: f32, top: f32) -> Self {
        Self {
            left,
            top,
            ..Self::default()
        }
    }

    pub fn centered(center: Pos2, scale: f32) -> Self {
        Self {
            left: center.x,
            top: center.y,
            origin_x: OriginX::Center,
            origin_y: OriginY::Center,
            scale_x: scale,
            scale_y: scale,
            angle: 0.0,
        }
    }

    pub fn anchor(&self) -> Pos2 {
        pos2(self.left, self.top)
    }

    fn origin_offset(&self, size: Vec2) -> Vec2 {
        vec2(self.origin_x.factor() * size.x, self.origin_y.factor() * size.y)
    }

    fn rotate(v: Vec2, degrees: f32) -> Vec2 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        vec2(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
    }

    /// Map a point in the object's unscaled local box `[0, w] x [0, h]` to document space
    pub fn local_to_document(&self, size: Vec2, local: Pos2) -> Pos2 {
        let centered = local.to_vec2() - self.origin_offset(size);
        let scaled = vec2(centered.x * self.scale_x, centered.y * self.scale_y);
        self.anchor() + Self::rotate(scaled, self.angle)
    }

    /// Inverse of [`Transform::local_to_document`]
    pub fn document_to_local(&self, size: Vec2, point: Pos2) -> Pos2 {
        let unrotated = Self::rotate(point - self.anchor(), -self.angle);
        let sx = if self.scale_x == 0.0 { 1.0 } else { self.scale_x };
        let sy = if self.scale_y == 0.0 { 1.0 } else { self.scale_y };
        (vec2(unrotated.x / sx, unrotated.y / sy) + self.origin_offset(size)).to_pos2()
    }

    /// Axis-aligned bounding box of the transformed local box
    pub fn bounding_rect(&self, size: Vec2) -> Rect {
        let corners = [
            pos2(0.0, 0.0),
            pos2(size.x, 0.0),
            pos2(0.0, size.y),
            pos2(size.x, size.y),
        ];
        let mut rect = Rect::NOTHING;
        for corner in corners {
            rect.extend_with(self.local_to_document(size, corner));
        }
        rect
    }

    pub fn contains(&self, size: Vec2, point: Pos2) -> bool {
        let local = self.document_to_local(size, point);
        local.x >= 0.0 && local.y >= 0.0 && local.x <= size.x && local.y <= size.y
    }
}

/// Whether an object reacts to the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactivity {
    pub selectable: bool,
    pub evented: bool,
}

impl Default for Interactivity {
    fn default() -> Self {
        Self {
            selectable: true,
            evented: true,
        }
    }
}

impl Interactivity {
    pub const DISABLED: Self = Self {
        selectable: false,
        evented: false,
    };
}

/// Marks objects owned by a tool rather than by the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectRole {
    #[default]
    Content,
    CropOverlay,
}

impl ObjectRole {
    /// Transient objects are never serialized, autosaved, or exported
    pub fn is_transient(self) -> bool {
        !matches!(self, ObjectRole::Content)
    }
}

/// Attributes shared by every scene object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementCommon {
    pub id: ObjectId,
    #[serde(flatten)]
    pub transform: Transform,
    #[serde(flatten)]
    pub interactivity: Interactivity,
    #[serde(skip)]
    pub role: ObjectRole,
}

impl ElementCommon {
    pub fn new(id: ObjectId, transform: Transform) -> Self {
        Self {
            id,
            transform,
            interactivity: Interactivity::default(),
            role: ObjectRole::Content,
        }
    }
}

/// Validates that a size has minimum dimensions
pub(crate) fn validate_size(size: Vec2) -> Result<(), String> {
    if size.x < MIN_ELEMENT_SIZE || size.y < MIN_ELEMENT_SIZE {
        Err(format!(
            "Element dimensions too small (min: {}). Width: {}, Height: {}",
            MIN_ELEMENT_SIZE, size.x, size.y
        ))
    } else {
        Ok(())
    }
}

/// Parse `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`
pub fn parse_hex_color(hex: &str) -> Option<egui::Color32> {
    let hex = hex.trim();
    let digits = hex.strip_prefix('#')?;
    // from_hex goes through from_str_radix, which would also take a sign
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    egui::Color32::from_hex(hex).ok()
}
