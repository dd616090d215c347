use egui::Pos2;

use super::{Tool, ToolContext, ToolId};
use crate::element::{Element, ElementType, TextAlign, TextElement, Transform, parse_hex_color};
use crate::error::{EditorError, EditorResult};
use crate::id_generator::{ObjectId, generate_id};

pub const FONT_FAMILIES: [&str; 9] = [
    "Arial",
    "Arial Black",
    "Helvetica",
    "Times New Roman",
    "Courier New",
    "Georgia",
    "Verdana",
    "Comic Sans MS",
    "Impact",
];

pub const FONT_SIZE_MIN: f32 = 8.0;
pub const FONT_SIZE_MAX: f32 = 120.0;
pub const FONT_SIZE_DEFAULT: f32 = 20.0;
pub const DEFAULT_TEXT: &str = "Edit this text";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextState {
    Idle,
    Editing { target: ObjectId },
}

/// Adds text objects and edits the selected one.
///
/// Family, color and alignment picked here also apply to the next text added.
#[derive(Debug)]
pub struct TextTool {
    state: TextState,
    font_family: String,
    fill: String,
    align: TextAlign,
}

impl Default for TextTool {
    fn default() -> Self {
        Self::new()
    }
}

impl TextTool {
    pub fn new() -> Self {
        Self {
            state: TextState::Idle,
            font_family: FONT_FAMILIES[0].to_owned(),
            fill: "#000000".to_owned(),
            align: TextAlign::Left,
        }
    }

    pub fn state(&self) -> TextState {
        self.state
    }

    /// Add a new text object in the middle of the document and select it
    pub fn add_text(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<ObjectId> {
        let mut text = TextElement::new(
            generate_id(),
            DEFAULT_TEXT,
            self.font_family.clone(),
            FONT_SIZE_DEFAULT,
            self.fill.clone(),
            Transform::centered(cx.scene.center(), 1.0),
        );
        text.align = self.align;
        let id = cx.scene.add_object(ElementType::Text(text))?;
        cx.scene.set_active(Some(id))?;
        self.state = TextState::Editing { target: id };
        log::debug!("text {} added", id);
        Ok(id)
    }

    /// The selected text object, if the selection is text
    pub fn selected_text(&self, cx: &ToolContext<'_>) -> Option<ObjectId> {
        cx.scene
            .active_object()
            .filter(|o| o.as_text().is_some())
            .map(|o| o.id())
    }

    /// Pick up the current selection, beginning to edit it when it is text
    pub fn sync_selection(&mut self, cx: &ToolContext<'_>) {
        self.state = match self.selected_text(cx) {
            Some(target) => {
                if let Some(text) = cx.scene.get(target).and_then(ElementType::as_text) {
                    self.font_family = text.font_family.clone();
                    self.fill = text.fill.clone();
                    self.align = text.align;
                }
                TextState::Editing { target }
            }
            None => TextState::Idle,
        };
    }

    fn edit<R>(&mut self, cx: &mut ToolContext<'_>, f: impl FnOnce(&mut TextElement) -> R) -> EditorResult<R> {
        let target = self
            .selected_text(cx)
            .ok_or_else(|| EditorError::InvalidState("no text selected".to_owned()))?;
        self.state = TextState::Editing { target };
        cx.scene
            .modify(target, |object| object.as_text_mut().map(f))?
            .ok_or_else(|| EditorError::InvalidState(format!("object {} is not text", target)))
    }

    pub fn set_font_family(&mut self, family: &str, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        self.font_family = family.to_owned();
        self.edit(cx, |t| t.font_family = family.to_owned())
    }

    /// Returns the size applied after clamping
    pub fn set_font_size(&mut self, size: f32, cx: &mut ToolContext<'_>) -> EditorResult<f32> {
        let size = if size.is_finite() { size.clamp(FONT_SIZE_MIN, FONT_SIZE_MAX) } else { FONT_SIZE_DEFAULT };
        self.edit(cx, |t| t.font_size = size)?;
        Ok(size)
    }

    pub fn set_fill(&mut self, color: &str, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        if parse_hex_color(color).is_none() {
            return Err(EditorError::InvalidState(format!("{} is not a hex color", color)));
        }
        self.fill = color.to_owned();
        self.edit(cx, |t| t.fill = color.to_owned())
    }

    pub fn set_align(&mut self, align: TextAlign, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        self.align = align;
        self.edit(cx, |t| t.align = align)
    }

    pub fn set_content(&mut self, content: &str, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        self.edit(cx, |t| t.content = content.to_owned())
    }

    /// Returns the new bold state
    pub fn toggle_bold(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<bool> {
        self.edit(cx, |t| {
            t.bold = !t.bold;
            t.bold
        })
    }

    pub fn toggle_italic(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<bool> {
        self.edit(cx, |t| {
            t.italic = !t.italic;
            t.italic
        })
    }

    pub fn toggle_underline(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<bool> {
        self.edit(cx, |t| {
            t.underline = !t.underline;
            t.underline
        })
    }

    pub fn delete_selected(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<ObjectId> {
        let target = self
            .selected_text(cx)
            .ok_or_else(|| EditorError::InvalidState("no text selected".to_owned()))?;
        cx.scene.remove_object(target)?;
        self.state = TextState::Idle;
        Ok(target)
    }
}

impl Tool for TextTool {
    fn id(&self) -> ToolId {
        ToolId::Text
    }

    fn activate(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        self.sync_selection(cx);
        Ok(())
    }

    fn deactivate(&mut self, _cx: &mut ToolContext<'_>) {
        self.state = TextState::Idle;
    }

    fn on_pointer_up(&mut self, _pos: Pos2, cx: &mut ToolContext<'_>) -> bool {
        // Selection is handled generically; follow it
        self.sync_selection(cx);
        false
    }

    fn current_state_name(&self) -> &'static str {
        match self.state {
            TextState::Idle => "Idle",
            TextState::Editing { .. } => "Editing",
        }
    }
}
