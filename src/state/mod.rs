pub mod context;
mod persistence;

pub use context::EditorContext;
pub use persistence::PersistenceBridge;
