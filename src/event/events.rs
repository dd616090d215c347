use egui::Vec2;

use crate::id_generator::ObjectId;
use crate::tools::ToolId;

/// A structural mutation of the scene. Every variant counts as "scene changed".
#[derive(Debug, Clone, PartialEq)]
pub enum SceneChange {
    Added(ObjectId),
    Removed(ObjectId),
    Modified(ObjectId),
    Replaced { old: ObjectId, new: ObjectId },
    BackgroundChanged,
    Resized { width: u32, height: u32 },
    /// The whole scene was replaced from a snapshot
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A message meant for the user (rendered as a toast by the host page)
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    SceneChanged(SceneChange),
    SelectionChanged(Option<ObjectId>),
    ToolChanged {
        old: Option<ToolId>,
        new: Option<ToolId>,
    },
    /// The user hit a plan limit; the host should show an upgrade prompt
    UpgradeRequired {
        tool: Option<ToolId>,
        reason: String,
    },
    HistoryChanged {
        can_undo: bool,
        can_redo: bool,
    },
    Saved {
        autosave: bool,
    },
    ViewChanged {
        scale: f32,
        translation: Vec2,
    },
    Notification(Notification),
}

impl EditorEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self::notice(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::notice(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::notice(NoticeLevel::Error, message)
    }

    fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        EditorEvent::Notification(Notification {
            level,
            message: message.into(),
        })
    }
}
