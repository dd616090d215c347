mod snapshot;
mod store;
mod viewport;

pub use snapshot::{SNAPSHOT_VERSION, SceneSnapshot, SnapshotDocument};
pub use store::{Background, BackgroundImage, SceneStore};
pub use viewport::Viewport;
