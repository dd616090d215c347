#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod history;
pub mod id_generator;
pub mod renderer;
pub mod scene;
pub mod services;
pub mod state;
pub mod tools;
pub mod util;

pub use config::EditorConfig;
pub use document::{Document, ProjectId};
pub use element::{Element, ElementType};
pub use error::{EditorError, EditorResult};
pub use event::{EditorEvent, EventHandler};
pub use history::HistoryManager;
pub use renderer::{ExportPreset, RenderSurface};
pub use scene::{SceneSnapshot, SceneStore};
pub use state::EditorContext;
pub use tools::{Tool, ToolId};
