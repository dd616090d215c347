pub mod debounce;
pub mod time;

pub use debounce::Debouncer;
pub use time::{Clock, ManualClock, SystemClock};
