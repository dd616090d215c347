use std::collections::VecDeque;

use crate::error::{EditorError, EditorResult};
use crate::scene::{SceneSnapshot, SceneStore};
use crate::util::Debouncer;

/// What the history manager is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryState {
    Idle,
    /// A capture is scheduled and waiting out the debounce
    Recording,
    /// A snapshot is being loaded back; scene changes are ignored
    Restoring,
}

/// One recorded scene state
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub snapshot: SceneSnapshot,
    pub sequence: u64,
}

/// Snapshot-based undo/redo with debounced capture.
///
/// The bottom of the undo stack is the baseline: it is the state undo
/// returns to last, and it is never popped by undo.
#[derive(Debug)]
pub struct HistoryManager {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    capacity: usize,
    capture: Debouncer,
    state: HistoryState,
    next_sequence: u64,
}

impl HistoryManager {
    pub fn new(capacity: usize, debounce_ms: u64) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(capacity),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
            capture: Debouncer::new(debounce_ms),
            state: HistoryState::Idle,
            next_sequence: 0,
        }
    }

    /// Forget everything and start over from `baseline`
    pub fn reset(&mut self, baseline: SceneSnapshot) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.capture.cancel();
        self.state = HistoryState::Idle;
        let entry = self.entry(baseline);
        self.undo_stack.push_back(entry);
    }

    pub fn state(&self) -> HistoryState {
        self.state
    }

    pub fn is_restoring(&self) -> bool {
        self.state == HistoryState::Restoring
    }

    pub fn can_undo(&self) -> bool {
        !self.is_restoring() && self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.is_restoring() && !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn baseline(&self) -> Option<&HistoryEntry> {
        self.undo_stack.front()
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.undo_stack.back()
    }

    fn entry(&mut self, snapshot: SceneSnapshot) -> HistoryEntry {
        self.next_sequence += 1;
        HistoryEntry {
            snapshot,
            sequence: self.next_sequence,
        }
    }

    /// Note that the scene changed. Schedules a capture unless a restore is running.
    pub fn observe_change(&mut self, now_ms: u64) {
        if self.is_restoring() {
            return;
        }
        self.capture.restart(now_ms);
        self.state = HistoryState::Recording;
    }

    /// Capture the scene if the debounce has elapsed. Returns true when an entry was pushed.
    pub fn poll(&mut self, now_ms: u64, scene: &SceneStore) -> EditorResult<bool> {
        if self.state == HistoryState::Recording && self.capture.poll(now_ms) {
            return self.record(scene);
        }
        Ok(false)
    }

    /// Capture a scheduled entry right away instead of waiting for the debounce
    pub fn flush(&mut self, scene: &SceneStore) -> EditorResult<bool> {
        if self.state != HistoryState::Recording {
            return Ok(false);
        }
        self.capture.cancel();
        self.record(scene)
    }

    /// Checkpoint the scene now, flushing any scheduled capture first
    pub fn push_now(&mut self, scene: &SceneStore) -> EditorResult<bool> {
        if self.is_restoring() {
            return Err(EditorError::InvalidState("history is restoring".to_owned()));
        }
        self.capture.cancel();
        self.record(scene)
    }

    fn record(&mut self, scene: &SceneStore) -> EditorResult<bool> {
        self.state = HistoryState::Idle;
        let snapshot = scene.serialize()?;
        Ok(self.push(snapshot))
    }

    fn push(&mut self, snapshot: SceneSnapshot) -> bool {
        if self.current().is_some_and(|top| top.snapshot == snapshot) {
            return false;
        }
        let entry = self.entry(snapshot);
        self.undo_stack.push_back(entry);
        self.redo_stack.clear();
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
        log::debug!("history entry recorded, depth {}", self.undo_stack.len());
        true
    }

    /// Load the previous entry into `scene`.
    ///
    /// Leaves the manager in [`HistoryState::Restoring`] on success; call
    /// [`HistoryManager::finish_restore`] once the resulting scene changes
    /// have been dispatched. Returns false when there is nothing to undo.
    pub fn undo(&mut self, scene: &mut SceneStore) -> EditorResult<bool> {
        if !self.can_undo() {
            return Ok(false);
        }
        let Some(current) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        let Some(target) = self.undo_stack.back() else {
            self.undo_stack.push_back(current);
            return Ok(false);
        };
        self.state = HistoryState::Restoring;
        match scene.load_snapshot(&target.snapshot) {
            Ok(()) => {
                self.redo_stack.push(current);
                Ok(true)
            }
            Err(e) => {
                self.undo_stack.push_back(current);
                self.state = HistoryState::Idle;
                Err(e)
            }
        }
    }

    /// Load the most recently undone entry into `scene`. Same protocol as undo.
    pub fn redo(&mut self, scene: &mut SceneStore) -> EditorResult<bool> {
        if !self.can_redo() {
            return Ok(false);
        }
        let Some(entry) = self.redo_stack.pop() else {
            return Ok(false);
        };
        self.state = HistoryState::Restoring;
        match scene.load_snapshot(&entry.snapshot) {
            Ok(()) => {
                self.undo_stack.push_back(entry);
                while self.undo_stack.len() > self.capacity {
                    self.undo_stack.pop_front();
                }
                Ok(true)
            }
            Err(e) => {
                self.redo_stack.push(entry);
                self.state = HistoryState::Idle;
                Err(e)
            }
        }
    }

    /// End a restore started by undo or redo
    pub fn finish_restore(&mut self) {
        if self.is_restoring() {
            self.capture.cancel();
            self.state = HistoryState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, Transform, factory};
    use crate::scene::Background;
    use egui::vec2;

    fn scene() -> (SceneStore, crate::id_generator::ObjectId) {
        let mut scene = SceneStore::new();
        scene.initialize(400, 300, Background::color("#ffffff")).unwrap();
        let id = scene
            .add_object(factory::create_rect(50.0, 50.0, Transform::at(0.0, 0.0)))
            .unwrap();
        scene.drain_changes();
        (scene, id)
    }

    fn history(scene: &SceneStore) -> HistoryManager {
        let mut history = HistoryManager::new(20, 500);
        history.reset(scene.serialize().unwrap());
        history
    }

    fn left(scene: &SceneStore, id: crate::id_generator::ObjectId) -> f32 {
        scene.get(id).unwrap().transform().left
    }

    #[test]
    fn burst_becomes_one_entry() {
        let (mut scene, id) = scene();
        let mut history = history(&scene);
        for t in [0, 100, 200, 300, 400] {
            scene.modify(id, |o| o.translate(vec2(1.0, 0.0))).unwrap();
            history.observe_change(t);
        }
        assert!(!history.poll(899, &scene).unwrap());
        assert!(history.poll(900, &scene).unwrap());
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn undo_never_pops_baseline() {
        let (mut scene, id) = scene();
        let mut history = history(&scene);
        scene.modify(id, |o| o.translate(vec2(10.0, 0.0))).unwrap();
        history.observe_change(0);
        history.flush(&scene).unwrap();

        assert!(history.undo(&mut scene).unwrap());
        history.finish_restore();
        assert_eq!(left(&scene, id), 0.0);
        assert!(!history.can_undo());
        assert!(!history.undo(&mut scene).unwrap());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn redo_restores_undone_state() {
        let (mut scene, id) = scene();
        let mut history = history(&scene);
        scene.modify(id, |o| o.translate(vec2(10.0, 0.0))).unwrap();
        history.observe_change(0);
        history.flush(&scene).unwrap();
        let edited = scene.serialize().unwrap();

        history.undo(&mut scene).unwrap();
        history.finish_restore();
        assert!(history.redo(&mut scene).unwrap());
        history.finish_restore();
        assert_eq!(scene.serialize().unwrap(), edited);
        assert!(!history.can_redo());
    }

    #[test]
    fn changes_during_restore_are_ignored() {
        let (mut scene, id) = scene();
        let mut history = history(&scene);
        scene.modify(id, |o| o.translate(vec2(10.0, 0.0))).unwrap();
        history.observe_change(0);
        history.flush(&scene).unwrap();

        history.undo(&mut scene).unwrap();
        history.observe_change(1000);
        assert!(!history.undo(&mut scene).unwrap());
        assert!(!history.redo(&mut scene).unwrap());
        history.finish_restore();
        assert!(!history.poll(5000, &scene).unwrap());
        assert_eq!(history.redo_depth(), 1);
    }

    #[test]
    fn new_edit_clears_redo() {
        let (mut scene, id) = scene();
        let mut history = history(&scene);
        scene.modify(id, |o| o.translate(vec2(10.0, 0.0))).unwrap();
        history.observe_change(0);
        history.flush(&scene).unwrap();
        history.undo(&mut scene).unwrap();
        history.finish_restore();

        scene.modify(id, |o| o.translate(vec2(0.0, 5.0))).unwrap();
        history.observe_change(10);
        history.poll(510, &scene).unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn capacity_is_bounded() {
        let (mut scene, id) = scene();
        let mut history = history(&scene);
        for i in 0..30 {
            scene.modify(id, |o| o.translate(vec2(1.0, 0.0))).unwrap();
            history.observe_change(i * 1000);
            history.poll(i * 1000 + 500, &scene).unwrap();
        }
        assert_eq!(history.undo_depth(), 20);
    }

    #[test]
    fn identical_snapshots_are_not_pushed() {
        let (scene, _) = scene();
        let mut history = history(&scene);
        history.observe_change(0);
        assert!(!history.flush(&scene).unwrap());
        assert_eq!(history.undo_depth(), 1);
    }
}
