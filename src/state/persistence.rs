use crate::document::{Document, ImageFlags};
use crate::error::EditorResult;
use crate::scene::SceneStore;
use crate::services::{ProjectPatch, ProjectStore, UserId};
use crate::util::Debouncer;

/// Record fields changed by the session that the next save must carry
#[derive(Debug, Clone, Default, PartialEq)]
struct PendingMetadata {
    current_image: Option<String>,
    thumbnail: Option<String>,
    flags: Option<ImageFlags>,
}

impl PendingMetadata {
    fn is_empty(&self) -> bool {
        self.current_image.is_none() && self.thumbnail.is_none() && self.flags.is_none()
    }
}

/// Keeps the project record in step with the scene.
///
/// Scene changes arm a debounced autosave; [`PersistenceBridge::save`] writes
/// the snapshot plus any record metadata noted since the last save.
#[derive(Debug)]
pub struct PersistenceBridge {
    autosave: Debouncer,
    pending: PendingMetadata,
    /// Something changed since the last successful save
    dirty: bool,
    saves: u32,
}

impl PersistenceBridge {
    pub fn new(autosave_delay_ms: u64) -> Self {
        Self {
            autosave: Debouncer::new(autosave_delay_ms),
            pending: PendingMetadata::default(),
            dirty: false,
            saves: 0,
        }
    }

    /// A scene change happened; (re)start the autosave delay
    pub fn observe(&mut self, now_ms: u64) {
        self.dirty = true;
        self.autosave.restart(now_ms);
    }

    /// True once per settled burst of changes, when an autosave is due
    pub fn poll(&mut self, now_ms: u64) -> bool {
        self.autosave.poll(now_ms)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty || !self.pending.is_empty()
    }

    pub fn autosave_deadline(&self) -> Option<u64> {
        self.autosave.deadline()
    }

    /// Successful saves so far
    pub fn save_count(&self) -> u32 {
        self.saves
    }

    pub fn note_current_image(&mut self, url: impl Into<String>) {
        self.pending.current_image = Some(url.into());
    }

    pub fn note_thumbnail(&mut self, url: impl Into<String>) {
        self.pending.thumbnail = Some(url.into());
    }

    pub fn note_flags(&mut self, flags: ImageFlags) {
        self.pending.flags = Some(flags);
    }

    /// Write the scene to the project record.
    ///
    /// On success `document` is updated to match what was stored. On failure
    /// the noted metadata is kept for the next attempt; nothing is retried.
    pub async fn save(&mut self, projects: &dyn ProjectStore, user: &UserId, document: &mut Document, scene: &SceneStore) -> EditorResult<()> {
        let snapshot = scene.serialize()?;
        self.autosave.cancel();

        let pending = std::mem::take(&mut self.pending);
        let dimensions = (scene.width(), scene.height());
        let patch = ProjectPatch {
            scene_snapshot: snapshot.clone(),
            current_image: pending.current_image.clone(),
            thumbnail: pending.thumbnail.clone(),
            dimensions: (dimensions != (document.width, document.height)).then_some(dimensions),
            flags: pending.flags.clone(),
        };

        if let Err(e) = projects.save_project(user, &document.id, patch).await {
            log::error!("saving project {} failed: {}", document.id, e);
            self.pending = pending;
            return Err(e);
        }

        document.scene_snapshot = Some(snapshot);
        document.width = dimensions.0;
        document.height = dimensions.1;
        if let Some(url) = pending.current_image {
            document.current_image = Some(url);
        }
        if let Some(flags) = pending.flags {
            document.flags = flags;
        }
        self.dirty = false;
        self.saves += 1;
        log::info!("project {} saved", document.id);
        Ok(())
    }
}
