use super::{Tool, ToolContext, ToolId};
use crate::element::ElementType;
use crate::error::{EditorError, EditorResult};
use crate::id_generator::{ObjectId, generate_id};
use crate::services::{AiEdit, ImageHost};

/// Retouch, upscale, or prompt-edit the main image through the hosting service
#[derive(Debug, Default)]
pub struct AiEditTool {
    prompt: String,
    pending: Option<ObjectId>,
}

impl AiEditTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Edit from the current prompt text
    pub fn prompt_edit(&self) -> AiEdit {
        AiEdit::Prompt(self.prompt.trim().to_owned())
    }

    /// Apply `edit` to the main image, keeping its size on the canvas.
    /// Returns `None` when the image went away before the result arrived.
    pub async fn apply(&mut self, cx: &mut ToolContext<'_>, host: &dyn ImageHost, edit: AiEdit) -> EditorResult<Option<ObjectId>> {
        let target = cx
            .scene
            .main_image()
            .ok_or_else(|| EditorError::NotFound("no image to edit".to_owned()))?;
        let source = cx
            .scene
            .get(target)
            .and_then(ElementType::as_image)
            .map(|image| image.src.clone())
            .ok_or_else(|| EditorError::NotFound(format!("object {}", target)))?;
        let url = host.edited_url(&source, &edit)?;

        self.pending = Some(target);
        let loaded = cx.surface.load_image(&url).await;
        self.pending = None;
        let (natural_width, natural_height) = loaded?;

        let Some(image) = cx.scene.get(target).and_then(ElementType::as_image) else {
            log::warn!("object {} is gone, discarding {:?}", target, edit);
            return Ok(None);
        };
        let displayed = (image.width * image.common.transform.scale_x, image.height * image.common.transform.scale_y);
        let mut replacement = image.with_source(generate_id(), url, natural_width, natural_height);
        let t = &mut replacement.common.transform;
        t.scale_x = displayed.0 / natural_width.max(1) as f32;
        t.scale_y = displayed.1 / natural_height.max(1) as f32;
        let id = replacement.common.id;
        cx.scene.replace_object(target, ElementType::Image(replacement))?;
        cx.surface.request_redraw();
        log::info!("{:?} applied to {} as {}", edit, target, id);
        Ok(Some(id))
    }
}

impl Tool for AiEditTool {
    fn id(&self) -> ToolId {
        ToolId::AiEdit
    }

    fn deactivate(&mut self, _cx: &mut ToolContext<'_>) {
        self.pending = None;
    }

    fn current_state_name(&self) -> &'static str {
        if self.pending.is_some() { "Editing" } else { "Idle" }
    }
}
