use egui::{Pos2, Vec2};

/// On-screen zoom and pan. Presentation only, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: f32,
    pub pan: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Viewport {
    pub const IDENTITY: Self = Self {
        zoom: 1.0,
        pan: Vec2::ZERO,
    };

    pub fn with_zoom(zoom: f32) -> Self {
        Self {
            zoom,
            pan: Vec2::ZERO,
        }
    }

    pub fn screen_to_document(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.pan) / self.zoom).to_pos2()
    }

    pub fn document_to_screen(&self, document: Pos2) -> Pos2 {
        (document.to_vec2() * self.zoom + self.pan).to_pos2()
    }
}
