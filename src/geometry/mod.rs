pub mod hit_testing;

pub use hit_testing::{Corner, HANDLE_RADIUS, corner_at, resize_from_corner};
