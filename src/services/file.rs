//! Filesystem-backed collaborators for headless use.

use std::fs;
use std::path::{Path, PathBuf};

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use super::identity::{UserId, UserProfile};
use super::storage::{NewProject, ProjectPatch, ProjectRecord, ProjectStore, check_project_quota};
use super::ImageSource;
use crate::document::{Document, ProjectId};
use crate::error::{EditorError, EditorResult};
use crate::util::time::timestamp_ms;

/// One pretty-printed JSON file per project in a directory
#[derive(Debug, Clone)]
pub struct FileProjectStore {
    dir: PathBuf,
}

impl FileProjectStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, id: &ProjectId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    fn read(&self, id: &ProjectId) -> EditorResult<ProjectRecord> {
        let path = self.path(id);
        let json = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EditorError::NotFound(format!("project {}", id)),
            _ => EditorError::Io(e),
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write(&self, record: &ProjectRecord) -> EditorResult<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| EditorError::InvalidState(e.to_string()))?;
        fs::write(self.path(&record.document.id), json)?;
        Ok(())
    }

    fn records(&self) -> EditorResult<Vec<ProjectRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match fs::read_to_string(&path).map(|json| serde_json::from_str::<ProjectRecord>(&json)) {
                    Ok(Ok(record)) => records.push(record),
                    Ok(Err(e)) => log::warn!("skipping unreadable project file {}: {}", path.display(), e),
                    Err(e) => log::warn!("skipping {}: {}", path.display(), e),
                }
            }
        }
        Ok(records)
    }
}

impl ProjectStore for FileProjectStore {
    fn create_project<'a>(&'a self, owner: &'a UserProfile, project: NewProject) -> LocalBoxFuture<'a, EditorResult<ProjectId>> {
        async move {
            let owned = self.records()?.iter().filter(|r| r.owner == owner.id).count() as u32;
            check_project_quota(owner, owned)?;
            let id = ProjectId::new_random();
            self.write(&project.into_record(id.clone(), owner.id.clone(), timestamp_ms()))?;
            Ok(id)
        }
        .boxed_local()
    }

    fn load_project<'a>(&'a self, caller: &'a UserId, id: &'a ProjectId) -> LocalBoxFuture<'a, EditorResult<Document>> {
        async move {
            let record = self.read(id)?;
            record.check_owner(caller)?;
            Ok(record.document)
        }
        .boxed_local()
    }

    fn save_project<'a>(&'a self, caller: &'a UserId, id: &'a ProjectId, patch: ProjectPatch) -> LocalBoxFuture<'a, EditorResult<()>> {
        async move {
            let mut record = self.read(id)?;
            record.check_owner(caller)?;
            record.apply(patch, timestamp_ms());
            self.write(&record)
        }
        .boxed_local()
    }
}

/// Resolves image references as paths, relative ones against `root`
#[derive(Debug, Clone)]
pub struct FileImageSource {
    root: PathBuf,
}

impl FileImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ImageSource for FileImageSource {
    fn fetch<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, EditorResult<Vec<u8>>> {
        async move {
            let path = self.resolve(url);
            fs::read(&path).map_err(|e| EditorError::ExternalService(format!("failed to read {}: {}", path.display(), e)))
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneSnapshot;
    use crate::services::Plan;
    use futures::executor::block_on;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("canvas-studio-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn records_survive_a_new_store() {
        let dir = temp_dir();
        let owner = UserProfile {
            id: UserId("u1".to_owned()),
            name: "u1".to_owned(),
            plan: Plan::Free,
            projects_used: 0,
            exports_this_month: 0,
        };
        let id = block_on(FileProjectStore::new(&dir).create_project(
            &owner,
            NewProject {
                title: "Flyer".to_owned(),
                width: 640,
                height: 480,
                original_image: "a.png".to_owned(),
                thumbnail: None,
            },
        ))
        .unwrap();

        let store = FileProjectStore::new(&dir);
        block_on(store.save_project(&owner.id, &id, ProjectPatch::snapshot(SceneSnapshot::from_string("{}")))).unwrap();
        let doc = block_on(store.load_project(&owner.id, &id)).unwrap();
        assert_eq!(doc.title, "Flyer");
        assert_eq!(doc.scene_snapshot.unwrap().as_str(), "{}");

        let missing = ProjectId("nope".to_owned());
        assert!(matches!(block_on(store.load_project(&owner.id, &missing)), Err(EditorError::NotFound(_))));
        let _ = fs::remove_dir_all(dir);
    }
}
