use egui::Pos2;
use serde::{Deserialize, Serialize};

use crate::error::EditorResult;
use crate::renderer::RenderSurface;
use crate::scene::SceneStore;

mod adjust_tool;
mod ai_edit_tool;
mod ai_extend_tool;
mod background_tool;
mod coordinator;
mod crop_tool;
mod resize_tool;
mod text_tool;
mod transform_gesture;

pub use adjust_tool::{ADJUST_PARAMS, AdjustParam, AdjustTool, FilterValues};
pub use ai_edit_tool::AiEditTool;
pub use ai_extend_tool::{AiExtendTool, DEFAULT_EXTEND_AMOUNT, ExtendDirection, MAX_EXTEND_AMOUNT};
pub use background_tool::BackgroundTool;
pub use coordinator::{SwitchOutcome, ToolCoordinator};
pub use crop_tool::{ASPECT_RATIOS, AspectPreset, CropState, CropTool, OriginalObjectState};
pub use resize_tool::{ResizeTool, SIZE_PRESETS, SizePreset};
pub use text_tool::{DEFAULT_TEXT, FONT_FAMILIES, FONT_SIZE_DEFAULT, FONT_SIZE_MAX, FONT_SIZE_MIN, TextState, TextTool};
pub use transform_gesture::DragGesture;

/// Every tool the editor offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    Resize,
    Crop,
    Adjust,
    Text,
    Background,
    AiExtender,
    AiEdit,
}

impl ToolId {
    pub const ALL: [ToolId; 7] = [
        ToolId::Resize,
        ToolId::Crop,
        ToolId::Adjust,
        ToolId::Text,
        ToolId::Background,
        ToolId::AiExtender,
        ToolId::AiEdit,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolId::Resize => "resize",
            ToolId::Crop => "crop",
            ToolId::Adjust => "adjust",
            ToolId::Text => "text",
            ToolId::Background => "background",
            ToolId::AiExtender => "ai_extender",
            ToolId::AiEdit => "ai_edit",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ToolId::Resize => "Resize",
            ToolId::Crop => "Crop",
            ToolId::Adjust => "Adjust",
            ToolId::Text => "Text",
            ToolId::Background => "Background",
            ToolId::AiExtender => "AI Extender",
            ToolId::AiEdit => "AI Edit",
        }
    }

    /// Tools only paid plans may open
    pub fn pro_only(self) -> bool {
        matches!(self, ToolId::Background | ToolId::AiExtender | ToolId::AiEdit)
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolId::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown tool {}", s))
    }
}

/// What a tool may touch while it runs
pub struct ToolContext<'a> {
    pub scene: &'a mut SceneStore,
    pub surface: &'a mut RenderSurface,
}

impl<'a> ToolContext<'a> {
    pub fn new(scene: &'a mut SceneStore, surface: &'a mut RenderSurface) -> Self {
        Self { scene, surface }
    }
}

/// Tool trait defines the interface for all editing tools
pub trait Tool {
    fn id(&self) -> ToolId;

    /// Called when the tool becomes current
    fn activate(&mut self, _cx: &mut ToolContext<'_>) -> EditorResult<()> {
        Ok(())
    }

    /// Called when the tool stops being current. Must remove every overlay
    /// the tool added and restore every object it made non-interactive.
    fn deactivate(&mut self, cx: &mut ToolContext<'_>);

    /// Pointer press in document coordinates. Returns true when the tool consumed it.
    fn on_pointer_down(&mut self, _pos: Pos2, _cx: &mut ToolContext<'_>) -> bool {
        false
    }

    fn on_pointer_move(&mut self, _pos: Pos2, _cx: &mut ToolContext<'_>) -> bool {
        false
    }

    fn on_pointer_up(&mut self, _pos: Pos2, _cx: &mut ToolContext<'_>) -> bool {
        false
    }

    fn current_state_name(&self) -> &'static str {
        "Idle"
    }
}

/// Enum representing all available tool types
/// This allows us to avoid using Box<dyn Tool> and simplifies memory management
#[derive(Debug)]
pub enum ToolType {
    Resize(ResizeTool),
    Crop(CropTool),
    Adjust(AdjustTool),
    Text(TextTool),
    Background(BackgroundTool),
    AiExtender(AiExtendTool),
    AiEdit(AiEditTool),
}

impl ToolType {
    pub fn new(id: ToolId) -> Self {
        match id {
            ToolId::Resize => Self::Resize(ResizeTool::new()),
            ToolId::Crop => Self::Crop(CropTool::new()),
            ToolId::Adjust => Self::Adjust(AdjustTool::new()),
            ToolId::Text => Self::Text(TextTool::new()),
            ToolId::Background => Self::Background(BackgroundTool::new()),
            ToolId::AiExtender => Self::AiExtender(AiExtendTool::new()),
            ToolId::AiEdit => Self::AiEdit(AiEditTool::new()),
        }
    }

    fn as_tool(&self) -> &dyn Tool {
        match self {
            Self::Resize(tool) => tool,
            Self::Crop(tool) => tool,
            Self::Adjust(tool) => tool,
            Self::Text(tool) => tool,
            Self::Background(tool) => tool,
            Self::AiExtender(tool) => tool,
            Self::AiEdit(tool) => tool,
        }
    }

    fn as_tool_mut(&mut self) -> &mut dyn Tool {
        match self {
            Self::Resize(tool) => tool,
            Self::Crop(tool) => tool,
            Self::Adjust(tool) => tool,
            Self::Text(tool) => tool,
            Self::Background(tool) => tool,
            Self::AiExtender(tool) => tool,
            Self::AiEdit(tool) => tool,
        }
    }
}

impl Tool for ToolType {
    fn id(&self) -> ToolId {
        self.as_tool().id()
    }

    fn activate(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        self.as_tool_mut().activate(cx)
    }

    fn deactivate(&mut self, cx: &mut ToolContext<'_>) {
        self.as_tool_mut().deactivate(cx)
    }

    fn on_pointer_down(&mut self, pos: Pos2, cx: &mut ToolContext<'_>) -> bool {
        self.as_tool_mut().on_pointer_down(pos, cx)
    }

    fn on_pointer_move(&mut self, pos: Pos2, cx: &mut ToolContext<'_>) -> bool {
        self.as_tool_mut().on_pointer_move(pos, cx)
    }

    fn on_pointer_up(&mut self, pos: Pos2, cx: &mut ToolContext<'_>) -> bool {
        self.as_tool_mut().on_pointer_up(pos, cx)
    }

    fn current_state_name(&self) -> &'static str {
        self.as_tool().current_state_name()
    }
}

/// A concrete tool that can be borrowed out of a [`ToolType`]
pub trait ToolKind: Tool + Sized {
    const ID: ToolId;

    fn from_tool_mut(tool: &mut ToolType) -> Option<&mut Self>;
}

macro_rules! tool_kind {
    ($tool:ty, $variant:ident) => {
        impl ToolKind for $tool {
            const ID: ToolId = ToolId::$variant;

            fn from_tool_mut(tool: &mut ToolType) -> Option<&mut Self> {
                match tool {
                    ToolType::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

tool_kind!(ResizeTool, Resize);
tool_kind!(CropTool, Crop);
tool_kind!(AdjustTool, Adjust);
tool_kind!(TextTool, Text);
tool_kind!(BackgroundTool, Background);
tool_kind!(AiExtendTool, AiExtender);
tool_kind!(AiEditTool, AiEdit);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_ids_round_trip_through_names() {
        for id in ToolId::ALL {
            assert_eq!(id.as_str().parse::<ToolId>().unwrap(), id);
            assert_eq!(ToolType::new(id).id(), id);
        }
        assert!("brush".parse::<ToolId>().is_err());
    }

    #[test]
    fn serde_names_match() {
        assert_eq!(serde_json::to_string(&ToolId::AiExtender).unwrap(), "\"ai_extender\"");
    }
}
