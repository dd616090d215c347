use egui::Pos2;

use super::{Tool, ToolContext, ToolId, ToolKind, ToolType};
use crate::error::EditorResult;
use crate::services::Identity;

/// Result of asking for a tool switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched { old: Option<ToolId>, new: Option<ToolId> },
    /// The requested tool was already current
    Unchanged,
    /// The plan does not include the tool; nothing changed
    UpgradeRequired(ToolId),
}

/// Owns the current tool and guarantees at most one is active.
///
/// Leaving a tool always runs its exit actions to completion before the next
/// tool is entered, and any overlay or suspended object left behind is
/// cleaned up here.
#[derive(Debug, Default)]
pub struct ToolCoordinator {
    current: Option<ToolType>,
    /// Tool taken down by [`ToolCoordinator::suspend`], to bring back on resume
    suspended: Option<ToolId>,
}

impl ToolCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current tool, including one that is temporarily suspended
    pub fn current_id(&self) -> Option<ToolId> {
        self.current.as_ref().map(|t| t.id()).or(self.suspended)
    }

    pub fn current(&self) -> Option<&ToolType> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut ToolType> {
        self.current.as_mut()
    }

    /// Borrow the current tool as a concrete type
    pub fn get_mut<T: ToolKind>(&mut self) -> Option<&mut T> {
        self.current.as_mut().and_then(T::from_tool_mut)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    /// Switch to `next`, or to no tool at all with `None`
    pub fn switch_to(&mut self, next: Option<ToolId>, identity: &dyn Identity, cx: &mut ToolContext<'_>) -> EditorResult<SwitchOutcome> {
        if let Some(id) = next {
            if !identity.has_tool_access(id) {
                log::info!("tool {} requires an upgrade", id);
                return Ok(SwitchOutcome::UpgradeRequired(id));
            }
        }
        let old = self.current_id();
        if old == next && !self.is_suspended() {
            return Ok(SwitchOutcome::Unchanged);
        }

        self.exit_current(cx);
        self.suspended = None;

        if let Some(id) = next {
            self.enter(id, cx)?;
        }
        log::debug!("tool switched from {:?} to {:?}", old, next);
        Ok(SwitchOutcome::Switched { old, new: next })
    }

    fn enter(&mut self, id: ToolId, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        let mut tool = ToolType::new(id);
        match tool.activate(cx) {
            Ok(()) => {
                self.current = Some(tool);
                Ok(())
            }
            Err(e) => {
                log::warn!("tool {} failed to activate: {}", id, e);
                tool.deactivate(cx);
                Self::sweep(cx);
                Err(e)
            }
        }
    }

    fn exit_current(&mut self, cx: &mut ToolContext<'_>) {
        if let Some(mut tool) = self.current.take() {
            tool.deactivate(cx);
            Self::sweep(cx);
        }
    }

    /// Remove whatever a tool left behind
    fn sweep(cx: &mut ToolContext<'_>) {
        let overlays = cx.scene.clear_transient();
        let restored = cx.scene.restore_all_interactivity();
        if overlays > 0 || restored > 0 {
            log::warn!(
                "tool exit left {} overlays and {} suspended objects behind",
                overlays, restored
            );
        }
    }

    /// Run the current tool's exit actions ahead of a whole-scene operation
    /// such as undo. [`ToolCoordinator::resume`] brings the tool back.
    pub fn suspend(&mut self, cx: &mut ToolContext<'_>) {
        if let Some(id) = self.current.as_ref().map(|t| t.id()) {
            self.exit_current(cx);
            self.suspended = Some(id);
        }
    }

    pub fn resume(&mut self, cx: &mut ToolContext<'_>) -> EditorResult<()> {
        match self.suspended.take() {
            Some(id) => self.enter(id, cx),
            None => Ok(()),
        }
    }

    /// Exit the current tool for good, leaving no tool selected
    pub fn teardown(&mut self, cx: &mut ToolContext<'_>) {
        self.exit_current(cx);
        self.suspended = None;
    }

    pub fn pointer_down(&mut self, pos: Pos2, cx: &mut ToolContext<'_>) -> bool {
        self.current.as_mut().is_some_and(|tool| tool.on_pointer_down(pos, cx))
    }

    pub fn pointer_move(&mut self, pos: Pos2, cx: &mut ToolContext<'_>) -> bool {
        self.current.as_mut().is_some_and(|tool| tool.on_pointer_move(pos, cx))
    }

    pub fn pointer_up(&mut self, pos: Pos2, cx: &mut ToolContext<'_>) -> bool {
        self.current.as_mut().is_some_and(|tool| tool.on_pointer_up(pos, cx))
    }
}
