use egui::{Pos2, Rect, Vec2, vec2};

use super::{Tool, ToolContext, ToolId};
use crate::element::{Element, ElementType, ImageElement, Interactivity, MIN_ELEMENT_SIZE, OriginX, OriginY, Transform, factory};
use crate::error::{EditorError, EditorResult};
use crate::geometry::{Corner, HANDLE_RADIUS, corner_at, resize_from_corner};
use crate::id_generator::{ObjectId, generate_id};

/// Share of the image's bounds the crop frame starts at
const INITIAL_FRAME_FRACTION: f32 = 0.8;

/// A selectable crop aspect ratio; `ratio` is width / height
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectPreset {
    pub label: &'static str,
    pub ratio: Option<f32>,
}

pub const ASPECT_RATIOS: [AspectPreset; 5] = [
    AspectPreset {
        label: "Freeform",
        ratio: None,
    },
    AspectPreset {
        label: "Square (1:1)",
        ratio: Some(1.0),
    },
    AspectPreset {
        label: "Landscape (16:9)",
        ratio: Some(16.0 / 9.0),
    },
    AspectPreset {
        label: "Portrait (4:5)",
        ratio: Some(4.0 / 5.0),
    },
    AspectPreset {
        label: "Story (9:16)",
        ratio: Some(9.0 / 16.0),
    },
];

/// Everything cancel needs to put the image back exactly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OriginalObjectState {
    pub transform: Transform,
    pub interactivity: Interactivity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropState {
    Inactive,
    Active {
        target: ObjectId,
        frame: ObjectId,
        original: OriginalObjectState,
    },
}

#[derive(Debug, Clone, Copy)]
enum FrameDrag {
    Move { last: Pos2 },
    Resize { corner: Corner, start: Rect },
}

#[derive(Debug)]
pub struct CropTool {
    state: CropState,
    ratio: Option<f32>,
    drag: Option<FrameDrag>,
}

impl Default for CropTool {
    fn default() -> Self {
        Self::new()
    }
}

impl CropTool {
    pub fn new() -> Self {
        Self {
            state: CropState::Inactive,
            ratio: None,
            drag: None,
        }
    }

    pub fn state(&self) -> CropState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CropState::Active { .. })
    }

    pub fn aspect_ratio(&self) -> Option<f32> {
        self.ratio
    }

    /// Start cropping the main image. Returns false when there is nothing to crop
    /// or a crop is already running.
    pub fn begin(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<bool> {
        if self.is_active() {
            return Ok(false);
        }
        let Some(target) = cx.scene.main_image() else {
            log::debug!("crop: no image to crop");
            return Ok(false);
        };
        let object = cx
            .scene
            .get(target)
            .ok_or_else(|| EditorError::NotFound(format!("object {}", target)))?;
        let original = OriginalObjectState {
            transform: *object.transform(),
            interactivity: object.interactivity(),
        };
        let bounds = object.rect();
        let inset = bounds.size() * (1.0 - INITIAL_FRAME_FRACTION) / 2.0;
        let mut frame_rect = Rect::from_min_size(bounds.min + inset, bounds.size() * INITIAL_FRAME_FRACTION);
        if let Some(ratio) = self.ratio {
            frame_rect = with_ratio(frame_rect, ratio);
        }

        cx.scene.suspend_interactivity(target)?;
        let frame = match cx.scene.add_object(factory::create_crop_frame(frame_rect)) {
            Ok(frame) => frame,
            Err(e) => {
                cx.scene.restore_interactivity(target);
                return Err(e);
            }
        };
        self.state = CropState::Active { target, frame, original };
        log::debug!("crop started on {}", target);
        Ok(true)
    }

    /// Current frame in document coordinates
    pub fn frame_rect(&self, cx: &ToolContext<'_>) -> Option<Rect> {
        match self.state {
            CropState::Active { frame, .. } => cx.scene.get(frame).map(|f| f.rect()),
            CropState::Inactive => None,
        }
    }

    /// Lock the frame to `ratio` (width / height), or unlock with `None`.
    /// A running crop has its frame height recomputed from its width.
    pub fn set_aspect_ratio(&mut self, ratio: Option<f32>, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        self.ratio = ratio.filter(|r| r.is_finite() && *r > 0.0);
        if let (Some(ratio), Some(rect)) = (self.ratio, self.frame_rect(cx)) {
            self.write_frame(with_ratio(rect, ratio), cx)?;
        }
        Ok(())
    }

    /// Move and size the frame. With a ratio lock the height follows the width.
    pub fn set_frame_rect(&mut self, rect: Rect, cx: &mut ToolContext<'_>) -> EditorResult<Rect> {
        let rect = match self.ratio {
            Some(ratio) => with_ratio(rect, ratio),
            None => rect,
        };
        self.write_frame(rect, cx)?;
        Ok(rect)
    }

    pub fn move_frame(&mut self, delta: Vec2, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        let CropState::Active { frame, .. } = self.state else {
            return Err(EditorError::InvalidState("crop is not active".to_owned()));
        };
        cx.scene.modify(frame, |f| f.translate(delta))
    }

    fn write_frame(&mut self, rect: Rect, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        let CropState::Active { frame, .. } = self.state else {
            return Err(EditorError::InvalidState("crop is not active".to_owned()));
        };
        let width = rect.width().max(MIN_ELEMENT_SIZE);
        let height = rect.height().max(MIN_ELEMENT_SIZE);
        cx.scene
            .modify(frame, |object| {
                *object.transform_mut() = Transform::at(rect.min.x, rect.min.y);
                match object.as_overlay_mut() {
                    Some(overlay) => overlay.set_size(width, height),
                    None => Err("crop frame is not a rectangle".to_owned()),
                }
            })?
            .map_err(EditorError::InvalidState)
    }

    /// Apply the crop. Any failure cancels instead, so the scene never ends up
    /// half cropped. Returns the id of the replacement image.
    pub fn commit(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<ObjectId> {
        let CropState::Active { target, frame, .. } = self.state else {
            return Err(EditorError::InvalidState("crop is not active".to_owned()));
        };
        match Self::apply(target, frame, cx) {
            Ok(id) => {
                self.state = CropState::Inactive;
                self.drag = None;
                log::info!("crop committed, {} replaced by {}", target, id);
                Ok(id)
            }
            Err(e) => {
                log::warn!("crop commit failed, cancelling: {}", e);
                self.cancel(cx);
                Err(e)
            }
        }
    }

    fn apply(target: ObjectId, frame: ObjectId, cx: &mut ToolContext<'_>) -> EditorResult<ObjectId> {
        let frame_rect = cx
            .scene
            .get(frame)
            .map(|f| f.rect())
            .ok_or_else(|| EditorError::NotFound("crop frame".to_owned()))?;
        let image = cx
            .scene
            .get(target)
            .and_then(ElementType::as_image)
            .ok_or_else(|| EditorError::NotFound(format!("image {}", target)))?
            .clone();

        let cropped = crop_image(&image, frame_rect)?;
        cx.scene.remove_object(frame)?;
        let id = cropped.id();
        cx.scene.replace_object(target, ElementType::Image(cropped))?;
        cx.scene.set_active(Some(id))?;
        Ok(id)
    }

    /// Discard the frame and put the image back exactly as it was
    pub fn cancel(&mut self, cx: &mut ToolContext<'_>) {
        self.drag = None;
        let CropState::Active { target, frame, original } = std::mem::replace(&mut self.state, CropState::Inactive) else {
            return;
        };
        if cx.scene.contains(frame) {
            if let Err(e) = cx.scene.remove_object(frame) {
                log::warn!("crop: could not remove frame: {}", e);
            }
        }
        if !cx.scene.contains(target) {
            return;
        }
        let moved = cx
            .scene
            .modify_live(target, |o| {
                let changed = *o.transform() != original.transform;
                *o.transform_mut() = original.transform;
                changed
            })
            .unwrap_or(false);
        if moved {
            if let Err(e) = cx.scene.commit(target) {
                log::warn!("crop: could not commit restored {}: {}", target, e);
            }
        }
        if let Err(e) = cx.scene.set_interactivity(target, original.interactivity) {
            log::warn!("crop: could not restore {}: {}", target, e);
        }
        if original.interactivity.selectable {
            if let Err(e) = cx.scene.set_active(Some(target)) {
                log::warn!("crop: could not reselect {}: {}", target, e);
            }
        }
        log::debug!("crop cancelled");
    }
}

/// Keep the rect's top-left and width, deriving the height from `ratio`
fn with_ratio(rect: Rect, ratio: f32) -> Rect {
    let width = rect.width().max(MIN_ELEMENT_SIZE);
    Rect::from_min_size(rect.min, vec2(width, (width / ratio).max(MIN_ELEMENT_SIZE)))
}

/// Build the cropped replacement for `image` given a frame in document space
fn crop_image(image: &ImageElement, frame: Rect) -> EditorResult<ImageElement> {
    let transform = *image.transform();
    let size = image.size();
    let mut local = Rect::NOTHING;
    for corner in Corner::ALL {
        local.extend_with(transform.document_to_local(size, corner.position(frame)));
    }
    let visible = local.intersect(Rect::from_min_size(Pos2::ZERO, size));
    if !visible.is_positive() || visible.width() < MIN_ELEMENT_SIZE || visible.height() < MIN_ELEMENT_SIZE {
        return Err(EditorError::InvalidState("crop area does not overlap the image".to_owned()));
    }

    let center = transform.local_to_document(size, visible.center());
    let mut cropped = ImageElement::new(
        generate_id(),
        image.src.clone(),
        image.natural_width,
        image.natural_height,
        Transform {
            left: center.x,
            top: center.y,
            origin_x: OriginX::Center,
            origin_y: OriginY::Center,
            scale_x: transform.scale_x,
            scale_y: transform.scale_y,
            angle: transform.angle,
        },
    );
    cropped
        .set_crop(
            image.crop_x + visible.min.x,
            image.crop_y + visible.min.y,
            visible.width(),
            visible.height(),
        )
        .map_err(EditorError::InvalidState)?;
    cropped.filters = image.filters.clone();
    Ok(cropped)
}

impl Tool for CropTool {
    fn id(&self) -> ToolId {
        ToolId::Crop
    }

    fn activate(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        self.begin(cx).map(|_| ())
    }

    fn deactivate(&mut self, cx: &mut ToolContext<'_>) {
        self.cancel(cx);
    }

    fn on_pointer_down(&mut self, pos: Pos2, cx: &mut ToolContext<'_>) -> bool {
        let Some(rect) = self.frame_rect(cx) else {
            return false;
        };
        let radius = HANDLE_RADIUS / cx.scene.viewport().zoom.max(f32::EPSILON);
        self.drag = match corner_at(rect, pos, radius) {
            Some(corner) => Some(FrameDrag::Resize { corner, start: rect }),
            None if rect.contains(pos) => Some(FrameDrag::Move { last: pos }),
            None => None,
        };
        // The frame owns the pointer while cropping
        true
    }

    fn on_pointer_move(&mut self, pos: Pos2, cx: &mut ToolContext<'_>) -> bool {
        let result = match self.drag {
            Some(FrameDrag::Move { last }) => {
                self.drag = Some(FrameDrag::Move { last: pos });
                self.move_frame(pos - last, cx)
            }
            Some(FrameDrag::Resize { corner, start }) => {
                let rect = resize_from_corner(start, corner, pos, self.ratio);
                self.write_frame(rect, cx)
            }
            None => return self.is_active(),
        };
        if let Err(e) = result {
            log::warn!("crop frame drag failed: {}", e);
        }
        true
    }

    fn on_pointer_up(&mut self, _pos: Pos2, _cx: &mut ToolContext<'_>) -> bool {
        self.drag = None;
        self.is_active()
    }

    fn current_state_name(&self) -> &'static str {
        match self.state {
            CropState::Inactive => "Inactive",
            CropState::Active { .. } => "Active",
        }
    }
}
