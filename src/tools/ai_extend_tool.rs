use egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};

use super::{Tool, ToolContext, ToolId};
use crate::element::{ElementType, Transform};
use crate::error::{EditorError, EditorResult};
use crate::id_generator::{ObjectId, generate_id};
use crate::services::ImageHost;

pub const DEFAULT_EXTEND_AMOUNT: u32 = 200;
pub const MAX_EXTEND_AMOUNT: u32 = 2000;

/// Side of the canvas that grows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtendDirection {
    Top,
    Bottom,
    Left,
    #[default]
    Right,
}

impl ExtendDirection {
    /// How far existing content moves when the canvas grows by `amount`
    fn content_offset(self, amount: u32) -> Vec2 {
        match self {
            ExtendDirection::Top => vec2(0.0, amount as f32),
            ExtendDirection::Left => vec2(amount as f32, 0.0),
            ExtendDirection::Bottom | ExtendDirection::Right => Vec2::ZERO,
        }
    }
}

/// Grows the canvas and fills the new area with a generative extension of the main image.
#[derive(Debug)]
pub struct AiExtendTool {
    direction: ExtendDirection,
    amount: u32,
    pending: Option<ObjectId>,
}

impl Default for AiExtendTool {
    fn default() -> Self {
        Self::new()
    }
}

impl AiExtendTool {
    pub fn new() -> Self {
        Self {
            direction: ExtendDirection::default(),
            amount: DEFAULT_EXTEND_AMOUNT,
            pending: None,
        }
    }

    pub fn direction(&self) -> ExtendDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: ExtendDirection) {
        self.direction = direction;
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    /// Returns the amount after clamping
    pub fn set_amount(&mut self, amount: u32) -> u32 {
        self.amount = amount.clamp(1, MAX_EXTEND_AMOUNT);
        self.amount
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Document size after extending a `width` x `height` canvas
    pub fn target_size(&self, width: u32, height: u32) -> (u32, u32) {
        match self.direction {
            ExtendDirection::Top | ExtendDirection::Bottom => (width, height + self.amount),
            ExtendDirection::Left | ExtendDirection::Right => (width + self.amount, height),
        }
    }

    /// Extend the canvas and replace the main image with the extended one.
    /// Returns `None` when the image went away before the result arrived.
    pub async fn extend(&mut self, cx: &mut ToolContext<'_>, host: &dyn ImageHost) -> EditorResult<Option<ObjectId>> {
        let target = cx
            .scene
            .main_image()
            .ok_or_else(|| EditorError::NotFound("no image to extend".to_owned()))?;
        let source = cx
            .scene
            .get(target)
            .and_then(ElementType::as_image)
            .map(|image| image.src.clone())
            .ok_or_else(|| EditorError::NotFound(format!("object {}", target)))?;
        let (width, height) = self.target_size(cx.scene.width(), cx.scene.height());
        let url = host.extended_url(&source, width, height)?;

        self.pending = Some(target);
        let loaded = cx.surface.load_image(&url).await;
        self.pending = None;
        let (natural_width, natural_height) = loaded?;

        let Some(image) = cx.scene.get(target).and_then(ElementType::as_image) else {
            log::warn!("object {} is gone, discarding extension", target);
            return Ok(None);
        };
        let mut replacement = image.with_source(generate_id(), url, natural_width, natural_height);
        let id = replacement.common.id;

        cx.scene
            .extend_document(width, height, self.direction.content_offset(self.amount))?;
        let scale = (width as f32 / natural_width.max(1) as f32).min(height as f32 / natural_height.max(1) as f32);
        replacement.common.transform = Transform::centered(cx.scene.center(), scale);
        cx.scene.replace_object(target, ElementType::Image(replacement))?;
        cx.surface.refit(cx.scene);
        cx.surface.request_redraw();
        log::info!("extended {} by {} px to the {:?}", target, self.amount, self.direction);
        Ok(Some(id))
    }
}

impl Tool for AiExtendTool {
    fn id(&self) -> ToolId {
        ToolId::AiExtender
    }

    fn deactivate(&mut self, _cx: &mut ToolContext<'_>) {
        self.pending = None;
    }

    fn current_state_name(&self) -> &'static str {
        if self.pending.is_some() { "Extending" } else { "Idle" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_size_grows_one_axis() {
        let mut tool = AiExtendTool::new();
        tool.set_direction(ExtendDirection::Top);
        assert_eq!(tool.target_size(800, 600), (800, 800));
        tool.set_direction(ExtendDirection::Left);
        tool.set_amount(100);
        assert_eq!(tool.target_size(800, 600), (900, 600));
    }

    #[test]
    fn amount_is_clamped() {
        let mut tool = AiExtendTool::new();
        assert_eq!(tool.set_amount(0), 1);
        assert_eq!(tool.set_amount(50_000), MAX_EXTEND_AMOUNT);
    }
}
