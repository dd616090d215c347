use egui::{Pos2, Rect, pos2};

use crate::element::MIN_ELEMENT_SIZE;

/// Grab radius around a frame corner, in document pixels
pub const HANDLE_RADIUS: f32 = 12.0;

/// A corner of a rectangular frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [Corner::TopLeft, Corner::TopRight, Corner::BottomLeft, Corner::BottomRight];

    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::TopLeft => "top_left",
            Corner::TopRight => "top_right",
            Corner::BottomLeft => "bottom_left",
            Corner::BottomRight => "bottom_right",
        }
    }

    pub fn position(self, rect: Rect) -> Pos2 {
        match self {
            Corner::TopLeft => rect.left_top(),
            Corner::TopRight => rect.right_top(),
            Corner::BottomLeft => rect.left_bottom(),
            Corner::BottomRight => rect.right_bottom(),
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// The corner of `rect` within `radius` of `pos`, closest first
pub fn corner_at(rect: Rect, pos: Pos2, radius: f32) -> Option<Corner> {
    Corner::ALL
        .into_iter()
        .map(|corner| (corner, pos.distance(corner.position(rect))))
        .filter(|(_, distance)| *distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(corner, _)| corner)
}

/// Rectangle spanned by dragging `corner` of `rect` to `pos` while the
/// opposite corner stays put. With an aspect ratio (width / height) the
/// height follows the width. Never smaller than the minimum element size.
pub fn resize_from_corner(rect: Rect, corner: Corner, pos: Pos2, aspect: Option<f32>) -> Rect {
    let anchor = corner.opposite().position(rect);
    let sign_x = if pos.x >= anchor.x { 1.0 } else { -1.0 };
    let sign_y = if pos.y >= anchor.y { 1.0 } else { -1.0 };
    let width = (pos.x - anchor.x).abs().max(MIN_ELEMENT_SIZE);
    let height = match aspect {
        Some(ratio) if ratio > 0.0 => (width / ratio).max(MIN_ELEMENT_SIZE),
        _ => (pos.y - anchor.y).abs().max(MIN_ELEMENT_SIZE),
    };
    Rect::from_two_pos(anchor, pos2(anchor.x + sign_x * width, anchor.y + sign_y * height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::vec2;

    fn frame() -> Rect {
        Rect::from_min_size(pos2(100.0, 100.0), vec2(200.0, 100.0))
    }

    #[test]
    fn corners_within_radius() {
        assert_eq!(corner_at(frame(), pos2(105.0, 95.0), HANDLE_RADIUS), Some(Corner::TopLeft));
        assert_eq!(corner_at(frame(), pos2(300.0, 200.0), HANDLE_RADIUS), Some(Corner::BottomRight));
        assert_eq!(corner_at(frame(), pos2(200.0, 150.0), HANDLE_RADIUS), None);
    }

    #[test]
    fn drag_keeps_opposite_corner() {
        let rect = resize_from_corner(frame(), Corner::BottomRight, pos2(350.0, 260.0), None);
        assert_eq!(rect, Rect::from_min_max(pos2(100.0, 100.0), pos2(350.0, 260.0)));
    }

    #[test]
    fn aspect_drives_height() {
        let rect = resize_from_corner(frame(), Corner::BottomRight, pos2(260.0, 900.0), Some(16.0 / 9.0));
        assert!((rect.width() - 160.0).abs() < 1e-3);
        assert!((rect.height() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn dragging_past_the_anchor_flips() {
        let rect = resize_from_corner(frame(), Corner::BottomRight, pos2(50.0, 50.0), None);
        assert_eq!(rect.max, pos2(100.0, 100.0));
        assert_eq!(rect.min, pos2(50.0, 50.0));
    }
}
