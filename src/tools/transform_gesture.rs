use egui::Pos2;

use crate::element::Element;
use crate::id_generator::ObjectId;
use crate::scene::SceneStore;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    target: ObjectId,
    last: Pos2,
    moved: bool,
}

/// Select-and-move for pointer input no tool consumed.
///
/// The object moves live during the drag and the move is committed as a
/// single change on release.
#[derive(Debug, Default)]
pub struct DragGesture {
    drag: Option<Drag>,
}

impl DragGesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Select what is under `pos` and start dragging it if it is selectable.
    /// Pressing on empty canvas clears the selection.
    pub fn pointer_down(&mut self, pos: Pos2, scene: &mut SceneStore) {
        self.drag = None;
        let hit = scene
            .hit_test(pos)
            .filter(|id| scene.get(*id).is_some_and(|o| o.interactivity().selectable));
        if scene.set_active(hit).is_err() {
            return;
        }
        self.drag = hit.map(|target| Drag {
            target,
            last: pos,
            moved: false,
        });
    }

    pub fn pointer_move(&mut self, pos: Pos2, scene: &mut SceneStore) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        let delta = pos - drag.last;
        if delta == egui::Vec2::ZERO {
            return true;
        }
        match scene.modify_live(drag.target, |o| o.translate(delta)) {
            Ok(()) => {
                drag.last = pos;
                drag.moved = true;
                true
            }
            Err(_) => {
                self.drag = None;
                false
            }
        }
    }

    /// Finish the drag. Returns the moved object, if anything moved.
    pub fn pointer_up(&mut self, _pos: Pos2, scene: &mut SceneStore) -> Option<ObjectId> {
        let drag = self.drag.take()?;
        if !drag.moved {
            return None;
        }
        match scene.commit(drag.target) {
            Ok(()) => Some(drag.target),
            Err(e) => {
                log::warn!("drag target vanished: {}", e);
                None
            }
        }
    }

    pub fn cancel(&mut self) {
        self.drag = None;
    }
}
