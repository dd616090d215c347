use std::collections::HashMap;

use egui::{Pos2, Vec2, pos2, vec2};
use serde::{Deserialize, Serialize};

use super::snapshot::{SNAPSHOT_VERSION, SceneSnapshot, SnapshotDocument};
use super::viewport::Viewport;
use crate::element::{Element, ElementType, Interactivity, ObjectKind, TextElement, Transform};
use crate::error::{EditorError, EditorResult};
use crate::event::SceneChange;
use crate::id_generator::{self, ObjectId};

/// An image stretched behind every object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub src: String,
    pub natural_width: u32,
    pub natural_height: u32,
    pub transform: Transform,
}

impl BackgroundImage {
    /// Cover the whole document, centered, keeping the image's aspect ratio
    pub fn cover(src: impl Into<String>, natural_width: u32, natural_height: u32, doc_width: u32, doc_height: u32) -> Self {
        let scale = (doc_width as f32 / natural_width.max(1) as f32).max(doc_height as f32 / natural_height.max(1) as f32);
        Self {
            src: src.into(),
            natural_width,
            natural_height,
            transform: Transform::centered(pos2(doc_width as f32 / 2.0, doc_height as f32 / 2.0), scale),
        }
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.natural_width as f32, self.natural_height as f32)
    }
}

/// Document background: nothing, a plain color, or an image
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Background {
    #[default]
    None,
    Color {
        color: String,
    },
    Image(BackgroundImage),
}

impl Background {
    pub fn color(color: impl Into<String>) -> Self {
        Background::Color { color: color.into() }
    }
}

/// Owns the editable object graph of a session.
///
/// Everything else mutates the scene through these methods. Structural
/// mutations of content objects queue a [`SceneChange`]; the session drains
/// them and forwards them to history and autosave. Transient tool overlays
/// and interactivity flags never produce a change.
#[derive(Debug, Default)]
pub struct SceneStore {
    ready: bool,
    width: u32,
    height: u32,
    background: Background,
    /// Paint order, bottom first
    objects: Vec<ElementType>,
    active: Option<ObjectId>,
    /// Flags objects had before a tool switched their interactivity off
    suspended: HashMap<ObjectId, Interactivity>,
    viewport: Viewport,
    pending: Vec<SceneChange>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to an empty document of the given size
    pub fn initialize(&mut self, width: u32, height: u32, background: Background) -> EditorResult<()> {
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidState(format!("invalid document size {}x{}", width, height)));
        }
        self.width = width;
        self.height = height;
        self.background = background;
        self.objects.clear();
        self.active = None;
        self.suspended.clear();
        self.pending.clear();
        self.ready = true;
        log::debug!("scene initialized at {}x{}", width, height);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.width as f32, self.height as f32)
    }

    pub fn center(&self) -> Pos2 {
        pos2(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn ensure_ready(&self) -> EditorResult<()> {
        if self.ready {
            Ok(())
        } else {
            Err(EditorError::InvalidState("scene is not initialized".to_owned()))
        }
    }

    fn index_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    fn index_or_missing(&self, id: ObjectId) -> EditorResult<usize> {
        self.index_of(id)
            .ok_or_else(|| EditorError::NotFound(format!("object {}", id)))
    }

    fn record(&mut self, transient: bool, change: SceneChange) {
        if !transient {
            self.pending.push(change);
        }
    }

    // ---- objects -------------------------------------------------------

    pub fn objects(&self) -> &[ElementType] {
        &self.objects
    }

    /// Text objects for layout bookkeeping. Nothing done through this is queued as a change.
    pub(crate) fn texts_mut(&mut self) -> impl Iterator<Item = &mut TextElement> {
        self.objects.iter_mut().filter_map(ElementType::as_text_mut)
    }

    pub fn get(&self, id: ObjectId) -> Option<&ElementType> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn z_index(&self, id: ObjectId) -> Option<usize> {
        self.index_of(id)
    }

    pub fn objects_of_kind(&self, kind: ObjectKind) -> Vec<&ElementType> {
        self.objects.iter().filter(|o| kind.matches(o)).collect()
    }

    /// Add an object on top of the paint order
    pub fn add_object(&mut self, object: ElementType) -> EditorResult<ObjectId> {
        let index = self.objects.len();
        self.insert_object(index, object)
    }

    pub fn insert_object(&mut self, index: usize, object: ElementType) -> EditorResult<ObjectId> {
        self.ensure_ready()?;
        let id = object.id();
        if self.contains(id) {
            return Err(EditorError::InvalidState(format!("object {} is already in the scene", id)));
        }
        let transient = object.is_transient();
        self.objects.insert(index.min(self.objects.len()), object);
        self.record(transient, SceneChange::Added(id));
        Ok(id)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> EditorResult<ElementType> {
        let index = self.index_or_missing(id)?;
        let removed = self.objects.remove(index);
        if self.active == Some(id) {
            self.active = None;
        }
        self.suspended.remove(&id);
        self.record(removed.is_transient(), SceneChange::Removed(id));
        Ok(removed)
    }

    /// Swap an object for another in the same paint position
    pub fn replace_object(&mut self, id: ObjectId, replacement: ElementType) -> EditorResult<ElementType> {
        let index = self.index_or_missing(id)?;
        let new_id = replacement.id();
        if new_id != id && self.contains(new_id) {
            return Err(EditorError::InvalidState(format!("object {} is already in the scene", new_id)));
        }
        let transient = replacement.is_transient();
        let old = std::mem::replace(&mut self.objects[index], replacement);
        self.suspended.remove(&id);
        if self.active == Some(id) {
            self.active = Some(new_id);
        }
        self.record(transient, SceneChange::Replaced { old: id, new: new_id });
        Ok(old)
    }

    /// Mutate an object and commit the result as one change
    pub fn modify<R>(&mut self, id: ObjectId, f: impl FnOnce(&mut ElementType) -> R) -> EditorResult<R> {
        let index = self.index_or_missing(id)?;
        let result = f(&mut self.objects[index]);
        let transient = self.objects[index].is_transient();
        self.record(transient, SceneChange::Modified(id));
        Ok(result)
    }

    /// Mutate an object without committing, for in-progress drags.
    /// Call [`SceneStore::commit`] when the gesture ends.
    pub fn modify_live<R>(&mut self, id: ObjectId, f: impl FnOnce(&mut ElementType) -> R) -> EditorResult<R> {
        let index = self.index_or_missing(id)?;
        Ok(f(&mut self.objects[index]))
    }

    pub fn commit(&mut self, id: ObjectId) -> EditorResult<()> {
        let index = self.index_or_missing(id)?;
        let transient = self.objects[index].is_transient();
        self.record(transient, SceneChange::Modified(id));
        Ok(())
    }

    pub fn bring_forward(&mut self, id: ObjectId) -> EditorResult<()> {
        let index = self.index_or_missing(id)?;
        if index + 1 < self.objects.len() {
            self.objects.swap(index, index + 1);
            self.record(false, SceneChange::Modified(id));
        }
        Ok(())
    }

    pub fn send_backward(&mut self, id: ObjectId) -> EditorResult<()> {
        let index = self.index_or_missing(id)?;
        if index > 0 {
            self.objects.swap(index, index - 1);
            self.record(false, SceneChange::Modified(id));
        }
        Ok(())
    }

    /// Topmost evented object under a document point
    pub fn hit_test(&self, point: Pos2) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .find(|o| o.interactivity().evented && o.hit_test(point))
            .map(|o| o.id())
    }

    // ---- selection -----------------------------------------------------

    pub fn get_active(&self) -> Option<ObjectId> {
        self.active
    }

    pub fn active_object(&self) -> Option<&ElementType> {
        self.active.and_then(|id| self.get(id))
    }

    /// Select an object, or clear the selection with `None`
    pub fn set_active(&mut self, id: Option<ObjectId>) -> EditorResult<()> {
        if let Some(id) = id {
            let object = self
                .get(id)
                .ok_or_else(|| EditorError::NotFound(format!("object {}", id)))?;
            if !object.interactivity().selectable {
                return Err(EditorError::InvalidState(format!("object {} is not selectable", id)));
            }
        }
        self.active = id;
        Ok(())
    }

    /// The active image, or the bottom-most image when the selection is not an image
    pub fn main_image(&self) -> Option<ObjectId> {
        match self.active_object() {
            Some(ElementType::Image(image)) => Some(image.id()),
            _ => self.objects.iter().find(|o| o.as_image().is_some()).map(|o| o.id()),
        }
    }

    // ---- interactivity -------------------------------------------------

    /// Disable pointer interaction, remembering the previous flags
    pub fn suspend_interactivity(&mut self, id: ObjectId) -> EditorResult<Interactivity> {
        let index = self.index_or_missing(id)?;
        let common = self.objects[index].common_mut();
        let previous = common.interactivity;
        self.suspended.entry(id).or_insert(previous);
        common.interactivity = Interactivity::DISABLED;
        if self.active == Some(id) {
            self.active = None;
        }
        Ok(previous)
    }

    /// Bring back the flags saved by [`SceneStore::suspend_interactivity`]
    pub fn restore_interactivity(&mut self, id: ObjectId) -> Option<Interactivity> {
        let flags = self.suspended.remove(&id)?;
        let index = self.index_of(id)?;
        self.objects[index].common_mut().interactivity = flags;
        Some(flags)
    }

    pub fn is_suspended(&self, id: ObjectId) -> bool {
        self.suspended.contains_key(&id)
    }

    /// Restore every suspended object, returning how many were touched
    pub fn restore_all_interactivity(&mut self) -> usize {
        let ids: Vec<ObjectId> = self.suspended.keys().copied().collect();
        ids.into_iter()
            .filter(|id| self.restore_interactivity(*id).is_some())
            .count()
    }

    /// Drop every tool overlay, returning how many were removed
    pub fn clear_transient(&mut self) -> usize {
        let before = self.objects.len();
        self.objects.retain(|o| !o.is_transient());
        if let Some(active) = self.active {
            if !self.contains(active) {
                self.active = None;
            }
        }
        before - self.objects.len()
    }

    pub fn set_interactivity(&mut self, id: ObjectId, flags: Interactivity) -> EditorResult<()> {
        let index = self.index_or_missing(id)?;
        self.suspended.remove(&id);
        self.objects[index].common_mut().interactivity = flags;
        Ok(())
    }

    // ---- document ------------------------------------------------------

    pub fn set_background(&mut self, background: Background) -> EditorResult<()> {
        self.ensure_ready()?;
        self.background = background;
        self.record(false, SceneChange::BackgroundChanged);
        Ok(())
    }

    /// Change the document size, moving and rescaling every object so the
    /// composition keeps its proportions
    pub fn resize_document(&mut self, width: u32, height: u32) -> EditorResult<()> {
        self.ensure_ready()?;
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidState(format!("invalid document size {}x{}", width, height)));
        }
        let sx = width as f32 / self.width as f32;
        let sy = height as f32 / self.height as f32;
        let uniform = sx.min(sy);
        for object in &mut self.objects {
            let t = object.transform_mut();
            t.left *= sx;
            t.top *= sy;
            t.scale_x *= uniform;
            t.scale_y *= uniform;
        }
        if let Background::Image(image) = &self.background {
            self.background = Background::Image(BackgroundImage::cover(
                image.src.clone(),
                image.natural_width,
                image.natural_height,
                width,
                height,
            ));
        }
        self.width = width;
        self.height = height;
        self.record(false, SceneChange::Resized { width, height });
        log::info!("document resized to {}x{}", width, height);
        Ok(())
    }

    /// Grow or shrink the canvas without rescaling anything. Every object
    /// moves by `offset`, so content keeps its place when the canvas grows
    /// at the top or left.
    pub fn extend_document(&mut self, width: u32, height: u32, offset: Vec2) -> EditorResult<()> {
        self.ensure_ready()?;
        if width == 0 || height == 0 {
            return Err(EditorError::InvalidState(format!("invalid document size {}x{}", width, height)));
        }
        for object in &mut self.objects {
            object.translate(offset);
        }
        if let Background::Image(image) = &self.background {
            self.background = Background::Image(BackgroundImage::cover(
                image.src.clone(),
                image.natural_width,
                image.natural_height,
                width,
                height,
            ));
        }
        self.width = width;
        self.height = height;
        self.record(false, SceneChange::Resized { width, height });
        log::info!("document extended to {}x{}", width, height);
        Ok(())
    }

    // ---- snapshots -----------------------------------------------------

    /// Serialize every content object. Transient overlays are left out and
    /// suspended objects are written with their remembered flags.
    pub fn serialize(&self) -> EditorResult<SceneSnapshot> {
        self.ensure_ready()?;
        let objects = self
            .objects
            .iter()
            .filter(|o| !o.is_transient())
            .map(|o| {
                let mut copy = o.clone();
                if let Some(flags) = self.suspended.get(&o.id()) {
                    copy.common_mut().interactivity = *flags;
                }
                copy
            })
            .collect();
        SnapshotDocument {
            version: SNAPSHOT_VERSION,
            width: self.width,
            height: self.height,
            background: self.background.clone(),
            objects,
        }
        .encode()
    }

    /// Replace the whole scene with a snapshot. Either the snapshot loads
    /// completely or the current scene is left untouched.
    pub fn load_snapshot(&mut self, snapshot: &SceneSnapshot) -> EditorResult<()> {
        let doc = snapshot.decode()?;
        if let Some(max) = doc.objects.iter().map(|o| o.id()).max() {
            id_generator::reserve_past(max);
        }
        self.width = doc.width;
        self.height = doc.height;
        self.background = doc.background;
        self.objects = doc.objects;
        self.active = None;
        self.suspended.clear();
        self.ready = true;
        self.pending.push(SceneChange::Loaded);
        Ok(())
    }

    /// Swap in a new background and object list in one step, keeping the
    /// document size
    pub fn replace_contents(&mut self, background: Background, objects: Vec<ElementType>) -> EditorResult<()> {
        self.ensure_ready()?;
        if let Some(max) = objects.iter().map(|o| o.id()).max() {
            id_generator::reserve_past(max);
        }
        self.background = background;
        self.objects = objects;
        self.active = None;
        self.suspended.clear();
        self.pending.push(SceneChange::Loaded);
        Ok(())
    }

    // ---- change queue --------------------------------------------------

    pub fn has_pending_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn drain_changes(&mut self) -> Vec<SceneChange> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::factory;

    fn store() -> SceneStore {
        let mut store = SceneStore::new();
        store.initialize(800, 600, Background::color("#ffffff")).unwrap();
        store
    }

    #[test]
    fn transient_objects_do_not_queue_changes() {
        let mut store = store();
        let frame = factory::create_crop_frame(egui::Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 10.0)));
        let id = store.add_object(frame).unwrap();
        store.modify(id, |o| o.translate(vec2(1.0, 1.0))).unwrap();
        store.remove_object(id).unwrap();
        assert!(!store.has_pending_changes());
    }

    #[test]
    fn serialize_skips_overlays_and_keeps_remembered_flags() {
        let mut store = store();
        let image = store
            .add_object(factory::create_image("a.png", 800, 600, Transform::default()))
            .unwrap();
        let before = store.serialize().unwrap();
        store.suspend_interactivity(image).unwrap();
        store
            .add_object(factory::create_crop_frame(egui::Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 10.0))))
            .unwrap();
        assert_eq!(store.serialize().unwrap(), before);
    }

    #[test]
    fn failed_load_leaves_scene_untouched() {
        let mut store = store();
        store
            .add_object(factory::create_image("a.png", 800, 600, Transform::default()))
            .unwrap();
        let before = store.serialize().unwrap();
        assert!(store.load_snapshot(&SceneSnapshot::from_string("{broken")).is_err());
        assert_eq!(store.serialize().unwrap(), before);
        assert_eq!(store.objects().len(), 1);
    }

    #[test]
    fn removing_active_clears_selection() {
        let mut store = store();
        let id = store
            .add_object(factory::create_text("hi", "Arial", 20.0, "#000", Transform::default()))
            .unwrap();
        store.set_active(Some(id)).unwrap();
        store.remove_object(id).unwrap();
        assert_eq!(store.get_active(), None);
    }

    #[test]
    fn resize_scales_positions_per_axis() {
        let mut store = store();
        let id = store
            .add_object(factory::create_image("a.png", 100, 100, Transform::centered(pos2(400.0, 300.0), 1.0)))
            .unwrap();
        store.resize_document(400, 600).unwrap();
        let t = *store.get(id).unwrap().transform();
        assert_eq!((t.left, t.top), (200.0, 300.0));
        assert_eq!((t.scale_x, t.scale_y), (0.5, 0.5));
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let mut store = store();
        let bottom = store
            .add_object(factory::create_rect(100.0, 100.0, Transform::at(0.0, 0.0)))
            .unwrap();
        let top = store
            .add_object(factory::create_rect(50.0, 50.0, Transform::at(0.0, 0.0)))
            .unwrap();
        assert_eq!(store.hit_test(pos2(10.0, 10.0)), Some(top));
        assert_eq!(store.hit_test(pos2(80.0, 80.0)), Some(bottom));
        assert_eq!(store.hit_test(pos2(200.0, 200.0)), None);
    }

    #[test]
    fn clear_transient_drops_only_overlays() {
        let mut store = store();
        let image = store
            .add_object(factory::create_image("a.png", 800, 600, Transform::default()))
            .unwrap();
        store.suspend_interactivity(image).unwrap();
        store
            .add_object(factory::create_crop_frame(egui::Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 10.0))))
            .unwrap();
        assert_eq!(store.clear_transient(), 1);
        assert_eq!(store.restore_all_interactivity(), 1);
        assert_eq!(store.objects().len(), 1);
        assert!(store.get(image).unwrap().interactivity().selectable);
    }

    #[test]
    fn extend_moves_without_scaling() {
        let mut store = store();
        let id = store
            .add_object(factory::create_rect(10.0, 10.0, Transform::at(5.0, 5.0)))
            .unwrap();
        store.extend_document(1000, 600, vec2(200.0, 0.0)).unwrap();
        let t = *store.get(id).unwrap().transform();
        assert_eq!((t.left, t.top, t.scale_x), (205.0, 5.0, 1.0));
        assert_eq!(store.size(), vec2(1000.0, 600.0));
    }
}
