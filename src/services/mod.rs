//! Narrow interfaces to everything outside the editing core: identity and
//! plan, project storage, image hosting, image search, and image fetching.

pub mod file;
mod hosting;
mod identity;
pub mod memory;
mod search;
mod storage;

use std::rc::Rc;

use futures::future::LocalBoxFuture;

pub use hosting::{AiEdit, ImageHost, UploadedImage, UrlTransforms};
pub use identity::{Identity, LocalIdentity, Plan, UserId, UserProfile};
pub use search::{ImageSearch, SearchResult};
pub use storage::{NewProject, ProjectPatch, ProjectRecord, ProjectStore};

use crate::error::EditorResult;

/// Fetches the encoded bytes behind an image reference
pub trait ImageSource {
    fn fetch<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, EditorResult<Vec<u8>>>;
}

/// The collaborators a session talks to
#[derive(Clone)]
pub struct Services {
    pub identity: Rc<dyn Identity>,
    pub projects: Rc<dyn ProjectStore>,
    pub images: Rc<dyn ImageSource>,
    pub host: Rc<dyn ImageHost>,
    pub search: Rc<dyn ImageSearch>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
