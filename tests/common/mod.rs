#![allow(dead_code)]

use std::io::Cursor;
use std::rc::Rc;

use canvas_studio::event::{EditorEvent, EventLog};
use canvas_studio::services::memory::{MemoryImageHost, MemoryImageSearch, MemoryImageSource, MemoryProjectStore};
use canvas_studio::services::{LocalIdentity, Plan, SearchResult, Services, UserId, UserProfile};
use canvas_studio::util::ManualClock;
use canvas_studio::{EditorConfig, EditorContext, ProjectId};
use futures::executor::block_on;
use image::{ImageFormat, Rgba, RgbaImage};

/// Encode a solid-color PNG
pub fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

pub fn user(plan: Plan, exports_this_month: u32) -> UserProfile {
    UserProfile {
        id: UserId("user-1".to_owned()),
        name: "Test User".to_owned(),
        plan,
        projects_used: 0,
        exports_this_month,
    }
}

pub fn stock_photo(id: &str) -> SearchResult {
    SearchResult {
        id: id.to_owned(),
        preview_url: format!("https://images.example.com/{}-small.png", id),
        full_url: format!("https://images.example.com/{}.png", id),
        width: 300,
        height: 200,
        attribution: format!("Beach photo by {}", id),
    }
}

/// In-memory collaborators plus handles to inspect them
pub struct Harness {
    pub identity: LocalIdentity,
    pub projects: MemoryProjectStore,
    pub images: MemoryImageSource,
    pub host: MemoryImageHost,
    pub search: MemoryImageSearch,
    pub clock: ManualClock,
    pub services: Services,
}

impl Harness {
    pub fn new(plan: Plan) -> Self {
        Self::with_user(user(plan, 0))
    }

    pub fn with_user(profile: UserProfile) -> Self {
        let identity = LocalIdentity::signed_in(profile);
        let projects = MemoryProjectStore::new();
        let images = MemoryImageSource::new();
        let host = MemoryImageHost::new(images.clone());
        let search = MemoryImageSearch::new(vec![stock_photo("beach")]);
        images.insert(stock_photo("beach").full_url, png(300, 200, [0, 120, 255, 255]));
        let services = Services {
            identity: Rc::new(identity.clone()),
            projects: Rc::new(projects.clone()),
            images: Rc::new(images.clone()),
            host: Rc::new(host.clone()),
            search: Rc::new(search.clone()),
        };
        Self {
            identity,
            projects,
            images,
            host,
            search,
            clock: ManualClock::new(0),
            services,
        }
    }

    /// Upload a solid image and create a project sized to it
    pub fn create_project(&self, width: u32, height: u32) -> ProjectId {
        block_on(EditorContext::create_project(
            &self.services,
            "Poster",
            png(width, height, [200, 40, 40, 255]),
            "poster.png",
        ))
        .unwrap()
    }

    pub fn open(&self, id: &ProjectId) -> (EditorContext, EventLog) {
        let session = block_on(EditorContext::open(
            self.services.clone(),
            EditorConfig::default(),
            Rc::new(self.clock.clone()),
            id,
        ))
        .unwrap();
        let log = EventLog::new();
        session.subscribe(Box::new(log.clone()));
        (session, log)
    }

    /// Create and open an `width` x `height` project in one go
    pub fn session(&self, width: u32, height: u32) -> (EditorContext, EventLog, ProjectId) {
        let id = self.create_project(width, height);
        let (session, log) = self.open(&id);
        (session, log, id)
    }

    /// Advance the clock and let the session's timers fire
    pub fn advance(&self, session: &mut EditorContext, ms: u64) {
        self.clock.advance(ms);
        block_on(session.tick()).unwrap();
    }
}

pub fn notifications(log: &EventLog) -> Vec<String> {
    log.events()
        .into_iter()
        .filter_map(|e| match e {
            EditorEvent::Notification(n) => Some(n.message),
            _ => None,
        })
        .collect()
}
