use super::{Tool, ToolContext, ToolId};
use crate::error::{EditorError, EditorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizePreset {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
}

pub const SIZE_PRESETS: [SizePreset; 5] = [
    SizePreset {
        name: "Instagram Post",
        width: 1080,
        height: 1080,
    },
    SizePreset {
        name: "Instagram Story",
        width: 1080,
        height: 1920,
    },
    SizePreset {
        name: "YouTube Thumbnail",
        width: 1280,
        height: 720,
    },
    SizePreset {
        name: "Facebook Cover",
        width: 820,
        height: 312,
    },
    SizePreset {
        name: "Twitter Header",
        width: 1500,
        height: 500,
    },
];

/// Largest document side accepted by the resize inputs
const MAX_DIMENSION: u32 = 10_000;

/// Pending document size, applied on demand
#[derive(Debug)]
pub struct ResizeTool {
    width: u32,
    height: u32,
    lock_aspect: bool,
    /// width / height when the lock was engaged
    aspect: f32,
}

impl Default for ResizeTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ResizeTool {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            lock_aspect: true,
            aspect: 1.0,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_aspect_locked(&self) -> bool {
        self.lock_aspect
    }

    pub fn set_aspect_locked(&mut self, locked: bool) {
        self.lock_aspect = locked;
        if locked && self.height > 0 {
            self.aspect = self.width as f32 / self.height as f32;
        }
    }

    fn clamp(value: u32) -> u32 {
        value.clamp(1, MAX_DIMENSION)
    }

    pub fn set_width(&mut self, width: u32) {
        self.width = Self::clamp(width);
        if self.lock_aspect {
            self.height = Self::clamp((self.width as f32 / self.aspect).round() as u32);
        }
    }

    pub fn set_height(&mut self, height: u32) {
        self.height = Self::clamp(height);
        if self.lock_aspect {
            self.width = Self::clamp((self.height as f32 * self.aspect).round() as u32);
        }
    }

    /// Take a preset size as is; the aspect lock follows the preset
    pub fn apply_preset(&mut self, name: &str) -> EditorResult<SizePreset> {
        let preset = SIZE_PRESETS
            .into_iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| EditorError::NotFound(format!("size preset {}", name)))?;
        self.width = preset.width;
        self.height = preset.height;
        self.aspect = preset.width as f32 / preset.height as f32;
        Ok(preset)
    }

    pub fn has_changes(&self, cx: &ToolContext<'_>) -> bool {
        (self.width, self.height) != (cx.scene.width(), cx.scene.height())
    }

    /// Resize the document to the pending size and fit it to the view again.
    /// Returns false when the size is unchanged.
    pub fn apply(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<bool> {
        if !self.has_changes(cx) {
            return Ok(false);
        }
        cx.scene.resize_document(self.width, self.height)?;
        cx.surface.refit(cx.scene);
        cx.surface.request_redraw();
        Ok(true)
    }

    fn sync(&mut self, cx: &ToolContext<'_>) {
        self.width = cx.scene.width();
        self.height = cx.scene.height();
        if self.height > 0 {
            self.aspect = self.width as f32 / self.height as f32;
        }
    }
}

impl Tool for ResizeTool {
    fn id(&self) -> ToolId {
        ToolId::Resize
    }

    fn activate(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        self.sync(cx);
        Ok(())
    }

    fn deactivate(&mut self, _cx: &mut ToolContext<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(width: u32, height: u32) -> ResizeTool {
        let mut tool = ResizeTool::new();
        tool.width = width;
        tool.height = height;
        tool.aspect = width as f32 / height as f32;
        tool
    }

    #[test]
    fn locked_aspect_follows_width() {
        let mut tool = tool(800, 600);
        tool.set_width(400);
        assert_eq!(tool.size(), (400, 300));
        tool.set_height(900);
        assert_eq!(tool.size(), (1200, 900));
    }

    #[test]
    fn unlocked_sides_are_independent() {
        let mut tool = tool(800, 600);
        tool.set_aspect_locked(false);
        tool.set_width(100);
        assert_eq!(tool.size(), (100, 600));
    }

    #[test]
    fn presets_by_name() {
        let mut tool = tool(800, 600);
        let preset = tool.apply_preset("youtube thumbnail").unwrap();
        assert_eq!((preset.width, preset.height), (1280, 720));
        assert_eq!(tool.size(), (1280, 720));
        assert!(tool.apply_preset("Poster").is_err());
    }
}
