mod bus;
mod events;
mod handlers;

pub use bus::{EventBus, SubscriptionId};
pub use events::*;
pub use handlers::{EventLog, NotificationLogger};

pub trait EventHandler {
    fn handle_event(&mut self, event: &EditorEvent);
}
