use std::cell::RefCell;
use std::rc::Rc;

use crate::event::{EditorEvent, EventHandler, NoticeLevel};

/// Records every event it sees. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Rc<RefCell<Vec<EditorEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EditorEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn count(&self, predicate: impl Fn(&EditorEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| predicate(e)).count()
    }
}

impl EventHandler for EventLog {
    fn handle_event(&mut self, event: &EditorEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Forwards user notifications to the `log` facade
#[derive(Debug, Default)]
pub struct NotificationLogger;

impl EventHandler for NotificationLogger {
    fn handle_event(&mut self, event: &EditorEvent) {
        if let EditorEvent::Notification(notice) = event {
            match notice.level {
                NoticeLevel::Error => log::error!("{}", notice.message),
                NoticeLevel::Info | NoticeLevel::Success => log::info!("{}", notice.message),
            }
        }
    }
}
