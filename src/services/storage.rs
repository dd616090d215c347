use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use super::identity::{UserId, UserProfile};
use crate::document::{Document, ImageFlags, ProjectId};
use crate::error::{EditorError, EditorResult};
use crate::scene::SceneSnapshot;

/// A stored project, as the project store keeps it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub owner: UserId,
    pub document: Document,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub updated_at: u64,
}

impl ProjectRecord {
    /// Ownership check shared by every store
    pub fn check_owner(&self, caller: &UserId) -> EditorResult<()> {
        if &self.owner == caller {
            Ok(())
        } else {
            Err(EditorError::Auth(format!("project {} belongs to another user", self.document.id)))
        }
    }

    pub fn apply(&mut self, patch: ProjectPatch, now: u64) {
        self.document.scene_snapshot = Some(patch.scene_snapshot);
        if let Some(url) = patch.current_image {
            self.document.current_image = Some(url);
        }
        if let Some(thumbnail) = patch.thumbnail {
            self.thumbnail = Some(thumbnail);
        }
        if let Some((width, height)) = patch.dimensions {
            self.document.width = width;
            self.document.height = height;
        }
        if let Some(flags) = patch.flags {
            self.document.flags = flags;
        }
        self.updated_at = now;
    }
}

/// Fields needed to create a project
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub original_image: String,
    pub thumbnail: Option<String>,
}

impl NewProject {
    pub(crate) fn into_record(self, id: ProjectId, owner: UserId, now: u64) -> ProjectRecord {
        ProjectRecord {
            owner,
            document: Document {
                id,
                title: self.title,
                width: self.width,
                height: self.height,
                original_image: Some(self.original_image.clone()),
                current_image: Some(self.original_image),
                scene_snapshot: None,
                flags: ImageFlags::default(),
            },
            thumbnail: self.thumbnail,
            updated_at: now,
        }
    }
}

/// What a save writes. The snapshot is always written; the rest only when set.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectPatch {
    pub scene_snapshot: SceneSnapshot,
    pub current_image: Option<String>,
    pub thumbnail: Option<String>,
    pub dimensions: Option<(u32, u32)>,
    pub flags: Option<ImageFlags>,
}

impl ProjectPatch {
    pub fn snapshot(scene_snapshot: SceneSnapshot) -> Self {
        Self {
            scene_snapshot,
            current_image: None,
            thumbnail: None,
            dimensions: None,
            flags: None,
        }
    }
}

pub trait ProjectStore {
    /// Fails with [`EditorError::QuotaExceeded`] when the owner's plan allows no more projects
    fn create_project<'a>(&'a self, owner: &'a UserProfile, project: NewProject) -> LocalBoxFuture<'a, EditorResult<ProjectId>>;

    fn load_project<'a>(&'a self, caller: &'a UserId, id: &'a ProjectId) -> LocalBoxFuture<'a, EditorResult<Document>>;

    fn save_project<'a>(&'a self, caller: &'a UserId, id: &'a ProjectId, patch: ProjectPatch) -> LocalBoxFuture<'a, EditorResult<()>>;
}

/// Project-count quota shared by every store
pub(crate) fn check_project_quota(owner: &UserProfile, owned: u32) -> EditorResult<()> {
    match owner.plan.project_limit() {
        Some(limit) if owned >= limit => Err(EditorError::QuotaExceeded(format!(
            "the {:?} plan allows {} projects",
            owner.plan, limit
        ))),
        _ => Ok(()),
    }
}
