//! In-memory collaborators. They back the test suite and offline sessions.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use parking_lot::Mutex;

use super::hosting::{AiEdit, ImageHost, UploadedImage, UrlTransforms};
use super::identity::{UserId, UserProfile};
use super::search::{ImageSearch, SearchResult};
use super::storage::{NewProject, ProjectPatch, ProjectRecord, ProjectStore, check_project_quota};
use super::ImageSource;
use crate::document::{Document, ProjectId};
use crate::error::{EditorError, EditorResult};
use crate::util::time::timestamp_ms;

#[derive(Debug, Default)]
struct StoreInner {
    records: HashMap<ProjectId, ProjectRecord>,
    saves: Vec<(ProjectId, ProjectPatch)>,
    offline: bool,
}

/// Project store kept in a shared map. Clones see the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryProjectStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: ProjectRecord) {
        self.inner
            .lock()
            .records
            .insert(record.document.id.clone(), record);
    }

    pub fn record(&self, id: &ProjectId) -> Option<ProjectRecord> {
        self.inner.lock().records.get(id).cloned()
    }

    /// Every successful save, oldest first
    pub fn saves(&self) -> Vec<(ProjectId, ProjectPatch)> {
        self.inner.lock().saves.clone()
    }

    pub fn save_count(&self) -> usize {
        self.inner.lock().saves.len()
    }

    /// While offline every call fails with [`EditorError::ExternalService`]
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    fn check_online(inner: &StoreInner) -> EditorResult<()> {
        if inner.offline {
            Err(EditorError::ExternalService("project store unreachable".to_owned()))
        } else {
            Ok(())
        }
    }
}

impl ProjectStore for MemoryProjectStore {
    fn create_project<'a>(&'a self, owner: &'a UserProfile, project: NewProject) -> LocalBoxFuture<'a, EditorResult<ProjectId>> {
        async move {
            let mut inner = self.inner.lock();
            Self::check_online(&inner)?;
            let owned = inner.records.values().filter(|r| r.owner == owner.id).count() as u32;
            check_project_quota(owner, owned)?;
            let id = ProjectId::new_random();
            let record = project.into_record(id.clone(), owner.id.clone(), timestamp_ms());
            inner.records.insert(id.clone(), record);
            log::info!("created project {}", id);
            Ok(id)
        }
        .boxed_local()
    }

    fn load_project<'a>(&'a self, caller: &'a UserId, id: &'a ProjectId) -> LocalBoxFuture<'a, EditorResult<Document>> {
        async move {
            let inner = self.inner.lock();
            Self::check_online(&inner)?;
            let record = inner
                .records
                .get(id)
                .ok_or_else(|| EditorError::NotFound(format!("project {}", id)))?;
            record.check_owner(caller)?;
            Ok(record.document.clone())
        }
        .boxed_local()
    }

    fn save_project<'a>(&'a self, caller: &'a UserId, id: &'a ProjectId, patch: ProjectPatch) -> LocalBoxFuture<'a, EditorResult<()>> {
        async move {
            let mut inner = self.inner.lock();
            Self::check_online(&inner)?;
            let record = inner
                .records
                .get_mut(id)
                .ok_or_else(|| EditorError::NotFound(format!("project {}", id)))?;
            record.check_owner(caller)?;
            record.apply(patch.clone(), timestamp_ms());
            inner.saves.push((id.clone(), patch));
            Ok(())
        }
        .boxed_local()
    }
}

/// Image bytes keyed by URL. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSource {
    images: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fetches: Arc<Mutex<Vec<String>>>,
}

impl MemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.images.lock().insert(url.into(), bytes);
    }

    pub fn remove(&self, url: &str) -> Option<Vec<u8>> {
        self.images.lock().remove(url)
    }

    /// URLs fetched so far, in order
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }
}

impl ImageSource for MemoryImageSource {
    fn fetch<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, EditorResult<Vec<u8>>> {
        async move {
            self.fetches.lock().push(url.to_owned());
            self.images
                .lock()
                .get(url)
                .cloned()
                .ok_or_else(|| EditorError::ExternalService(format!("failed to fetch {}", url)))
        }
        .boxed_local()
    }
}

/// Host that keeps uploads in a [`MemoryImageSource`] under the transform host's domain
#[derive(Debug, Clone)]
pub struct MemoryImageHost {
    transforms: UrlTransforms,
    source: MemoryImageSource,
    folder: String,
}

impl MemoryImageHost {
    pub fn new(source: MemoryImageSource) -> Self {
        Self {
            transforms: UrlTransforms::default(),
            source,
            folder: "canvas-studio".to_owned(),
        }
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!("https://{}/{}/{}", self.transforms.host(), self.folder, file_name)
    }
}

impl ImageHost for MemoryImageHost {
    fn upload_image<'a>(&'a self, bytes: Vec<u8>, file_name: &'a str) -> LocalBoxFuture<'a, EditorResult<UploadedImage>> {
        async move {
            let decoded = image::load_from_memory(&bytes)?;
            let url = self.url_for(file_name);
            let thumbnail_url = self.transforms.thumbnail(&url, 300, 300)?;
            self.source.insert(url.clone(), bytes);
            Ok(UploadedImage {
                thumbnail_url,
                url,
                width: decoded.width(),
                height: decoded.height(),
            })
        }
        .boxed_local()
    }

    fn background_removed_url(&self, source: &str) -> EditorResult<String> {
        self.transforms.background_removed(source)
    }

    fn extended_url(&self, source: &str, width: u32, height: u32) -> EditorResult<String> {
        self.transforms.extended(source, width, height)
    }

    fn edited_url(&self, source: &str, edit: &AiEdit) -> EditorResult<String> {
        self.transforms.edited(source, edit)
    }
}

/// Search over a fixed result list
#[derive(Debug, Clone, Default)]
pub struct MemoryImageSearch {
    results: Arc<Mutex<Vec<SearchResult>>>,
    downloads: Arc<Mutex<Vec<String>>>,
}

impl MemoryImageSearch {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results: Arc::new(Mutex::new(results)),
            downloads: Arc::default(),
        }
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().clone()
    }
}

impl ImageSearch for MemoryImageSearch {
    fn search<'a>(&'a self, query: &'a str) -> LocalBoxFuture<'a, EditorResult<Vec<SearchResult>>> {
        async move {
            let query = query.trim().to_lowercase();
            Ok(self
                .results
                .lock()
                .iter()
                .filter(|r| r.attribution.to_lowercase().contains(&query) || r.id.contains(&query))
                .cloned()
                .collect())
        }
        .boxed_local()
    }

    fn track_download(&self, result_id: &str) {
        self.downloads.lock().push(result_id.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneSnapshot;
    use crate::services::Plan;
    use futures::executor::block_on;

    fn user(id: &str, plan: Plan) -> UserProfile {
        UserProfile {
            id: UserId(id.to_owned()),
            name: id.to_owned(),
            plan,
            projects_used: 0,
            exports_this_month: 0,
        }
    }

    fn new_project() -> NewProject {
        NewProject {
            title: "Poster".to_owned(),
            width: 800,
            height: 600,
            original_image: "https://ik.imagekit.io/demo/a.png".to_owned(),
            thumbnail: None,
        }
    }

    #[test]
    fn free_plan_project_quota() {
        let store = MemoryProjectStore::new();
        let owner = user("u1", Plan::Free);
        for _ in 0..3 {
            block_on(store.create_project(&owner, new_project())).unwrap();
        }
        let err = block_on(store.create_project(&owner, new_project())).unwrap_err();
        assert!(err.is_upgrade_prompt());

        let pro = user("u2", Plan::Pro);
        for _ in 0..5 {
            block_on(store.create_project(&pro, new_project())).unwrap();
        }
    }

    #[test]
    fn other_users_are_denied() {
        let store = MemoryProjectStore::new();
        let owner = user("u1", Plan::Free);
        let id = block_on(store.create_project(&owner, new_project())).unwrap();
        let stranger = UserId("u2".to_owned());
        assert!(matches!(block_on(store.load_project(&stranger, &id)), Err(EditorError::Auth(_))));
        let patch = ProjectPatch::snapshot(SceneSnapshot::from_string("{}"));
        assert!(matches!(block_on(store.save_project(&stranger, &id, patch)), Err(EditorError::Auth(_))));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn save_applies_patch() {
        let store = MemoryProjectStore::new();
        let owner = user("u1", Plan::Free);
        let id = block_on(store.create_project(&owner, new_project())).unwrap();
        let mut patch = ProjectPatch::snapshot(SceneSnapshot::from_string("{}"));
        patch.dimensions = Some((1080, 1080));
        block_on(store.save_project(&owner.id, &id, patch)).unwrap();
        let doc = store.record(&id).unwrap().document;
        assert_eq!((doc.width, doc.height), (1080, 1080));
        assert_eq!(doc.scene_snapshot.unwrap().as_str(), "{}");
    }

    #[test]
    fn missing_images_fail_to_fetch() {
        let source = MemoryImageSource::new();
        source.insert("a", vec![1, 2, 3]);
        assert_eq!(block_on(source.fetch("a")).unwrap(), vec![1, 2, 3]);
        assert!(block_on(source.fetch("b")).is_err());
        assert_eq!(source.fetches(), vec!["a".to_owned(), "b".to_owned()]);
    }
}
